//! Save/load tests for complete maps
//!
//! These tests verify that a saved map loads back with:
//! - every non-empty tile, its ground, items and flags
//! - container contents and variant attributes
//! - houses, towns and both kinds of spawns

use tempfile::TempDir;

use otmm_map_io::persistence::format::{attr, node};
use otmm_map_io::persistence::{
    load_map_file, probe_header, probe_map_file, save_map_file, NodeFileReader,
};
use otmm_map_io::world::TILE_FLAG_PROTECTION_ZONE;
use otmm_map_io::{
    Creature, CreatureDatabase, CreatureKind, Item, ItemClass, ItemKind, ItemRegistry, ItemType,
    LoadReport, Map, MapIoConfig, OtmmLoader, OtmmSaver, Position, SpawnArea, Town,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> ItemRegistry {
    let mut registry = ItemRegistry::new(3, 57);
    registry.register(ItemType::new(100, "grass").ground());
    registry.register(ItemType::new(101, "shallow water").ground().with_subtype());
    registry.register(ItemType::new(200, "stone"));
    registry.register(ItemType::new(1209, "door").with_class(ItemClass::Door));
    registry.register(ItemType::new(1387, "magic forcefield").with_class(ItemClass::Teleport));
    registry.register(ItemType::new(1987, "bag").with_class(ItemClass::Container));
    registry.register(ItemType::new(2148, "gold coin").with_subtype());
    registry.register(ItemType::new(2594, "depot").with_class(ItemClass::Depot));
    registry
}

fn sample_map(catalog: &ItemRegistry) -> Map {
    let mut map = Map::new(512, 512);
    map.description = "Rookgaard, saved for testing".to_string();

    let plain = map.get_or_create_tile(Position::new(10, 20, 7));
    plain.add_item(Item::plain(100), catalog);
    plain.add_item(Item::plain(200).with_action_id(5), catalog);

    let water = map.get_or_create_tile(Position::new(11, 20, 7));
    water.add_item(Item::plain(101).with_subtype(3), catalog);
    water.map_flags = TILE_FLAG_PROTECTION_ZONE;
    let mut bag = Item::new(1987, ItemClass::Container);
    if let Some(contents) = bag.contents_mut() {
        contents.push(Item::plain(2148).with_subtype(50));
        contents.push(Item::new(1987, ItemClass::Container).with_unique_id(1001));
    }
    water.add_item(bag, catalog);

    let doorway = map.get_or_create_tile(Position::new(12, 20, 7));
    doorway.add_item(Item::plain(100), catalog);
    let mut door = Item::new(1209, ItemClass::Door).with_text("It is locked.");
    door.kind = ItemKind::Door { door_id: 3 };
    doorway.add_item(door, catalog);

    let portal = map.get_or_create_tile(Position::new(13, 20, 7));
    portal.add_item(Item::plain(100).with_action_id(1000), catalog);
    let mut teleport = Item::new(1387, ItemClass::Teleport);
    teleport.kind = ItemKind::Teleport {
        destination: Position::new(300, 301, 6),
    };
    portal.add_item(teleport, catalog);

    let locker = map.get_or_create_tile(Position::new(14, 20, 7));
    let mut depot = Item::new(2594, ItemClass::Depot).with_description("Rookgaard depot");
    depot.kind = ItemKind::Depot { depot_id: 0xFE };
    locker.add_item(depot, catalog);

    for pos in [Position::new(30, 30, 7), Position::new(31, 30, 7)] {
        map.link_house_tile(5, pos);
        if let Some(tile) = map.get_tile_mut(pos) {
            tile.add_item(Item::plain(100), catalog);
        }
    }
    if let Some(house) = map.houses.get_mut(&5) {
        house.name = "Harbour Lane 1".to_string();
        house.town_id = 1;
        house.rent = 1000;
        house.beds = 2;
        house.exit = Position::new(30, 31, 7);
    }
    map.add_town(Town::new(1, "Rookgaard", Position::new(100, 100, 7)));

    map.add_spawn(CreatureKind::Monster, Position::new(50, 50, 7), SpawnArea::new(3));
    map.get_or_create_tile(Position::new(51, 50, 7))
        .set_creature(CreatureKind::Monster, Creature::new("Rat", 60));
    map.add_spawn(CreatureKind::Npc, Position::new(60, 60, 7), SpawnArea::new(1));
    map.get_or_create_tile(Position::new(60, 60, 7))
        .set_creature(CreatureKind::Npc, Creature::new("Cipfried", 0));
    map
}

fn load_bytes(catalog: &ItemRegistry, config: &MapIoConfig, data: &[u8]) -> (Map, LoadReport) {
    let mut monsters = CreatureDatabase::with_names(["Rat"]);
    let mut npcs = CreatureDatabase::with_names(["Cipfried"]);
    let mut map = Map::default();
    let report = OtmmLoader::new(catalog, &mut monsters, &mut npcs, config)
        .load(&mut map, data)
        .expect("saved map should load");
    (map, report)
}

#[test]
fn test_full_map_round_trip() {
    init_logging();
    let catalog = catalog();
    let config = MapIoConfig::default();
    let map = sample_map(&catalog);

    let mut data = Vec::new();
    let saved = OtmmSaver::new(&catalog, &config)
        .save(&map, &mut data)
        .expect("save");
    assert_eq!(saved.bytes_written, data.len() as u64);

    let (loaded, report) = load_bytes(&catalog, &config, &data);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    assert_eq!(report.tiles, saved.tiles_saved);
    assert_eq!(report.monsters, 1);
    assert_eq!(report.npcs, 1);
    assert_eq!(report.towns, 1);
    assert_eq!(report.houses, 1);

    assert_eq!(loaded.width, 512);
    assert_eq!(loaded.height, 512);
    assert_eq!(loaded.description, map.description);
    assert_eq!(loaded.tile_count(), map.tile_count());
    for tile in map.tiles() {
        assert_eq!(
            loaded.get_tile(tile.position()),
            Some(tile),
            "tile {} differs",
            tile.position()
        );
    }
    assert_eq!(loaded.towns, map.towns);
    assert_eq!(loaded.houses, map.houses);
    for kind in [CreatureKind::Monster, CreatureKind::Npc] {
        let expected: Vec<_> = map.spawns(kind).iter().collect();
        let actual: Vec<_> = loaded.spawns(kind).iter().collect();
        assert_eq!(actual, expected, "{} spawns differ", kind.label());
    }
}

#[test]
fn test_plain_tile_layout() {
    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut map = Map::new(256, 256);
    let tile = map.get_or_create_tile(Position::new(10, 20, 7));
    tile.add_item(Item::plain(100), &catalog);
    tile.add_item(Item::plain(200).with_action_id(5), &catalog);

    let mut data = Vec::new();
    OtmmSaver::new(&catalog, &config)
        .save(&map, &mut data)
        .expect("save");

    let reader = NodeFileReader::new(&data);
    let root = reader.root_node().expect("root");
    let map_data = root.first_child().expect("walk").expect("map data");
    let mut tile_data = map_data
        .children()
        .map(|section| section.expect("section"))
        .find(|section| section.tag() == Some(node::TILE_DATA))
        .expect("tile data section");
    assert_eq!(tile_data.get_u8().expect("tag"), node::TILE_DATA);

    let mut tile_node = tile_data.first_child().expect("walk").expect("tile");
    assert_eq!(tile_node.get_u8().expect("tag"), node::TILE);
    assert_eq!(
        tile_node.get_position().expect("position"),
        Position::new(10, 20, 7)
    );
    assert_eq!(tile_node.get_u16().expect("ground"), 100);
    assert_eq!(tile_node.remaining(), 0);

    let mut item = tile_node.first_child().expect("walk").expect("item");
    assert_eq!(item.get_u8().expect("tag"), node::ITEM);
    assert_eq!(item.get_u16().expect("id"), 200);
    assert_eq!(item.get_u8().expect("attribute"), attr::ACTION_ID);
    assert_eq!(item.get_u16().expect("action id"), 5);
    assert_eq!(item.remaining(), 0);
    assert!(item.next_sibling().expect("walk").is_none());

    let (loaded, _) = load_bytes(&catalog, &config, &data);
    let tile = loaded
        .get_tile(Position::new(10, 20, 7))
        .expect("tile should load");
    assert_eq!(tile.ground.as_ref().map(|g| g.id), Some(100));
    assert_eq!(tile.items, vec![Item::plain(200).with_action_id(5)]);
}

#[test]
fn test_spawn_radius_is_clamped_on_load() {
    let catalog = catalog();
    let config = MapIoConfig::default();
    let anchor = Position::new(100, 100, 7);
    let mut map = Map::new(256, 256);
    map.add_spawn(CreatureKind::Monster, anchor, SpawnArea::new(200));

    let mut data = Vec::new();
    OtmmSaver::new(&catalog, &config)
        .save(&map, &mut data)
        .expect("save");
    let (loaded, _) = load_bytes(&catalog, &config, &data);
    assert_eq!(
        loaded.spawns(CreatureKind::Monster).get(anchor),
        Some(&SpawnArea::new(config.max_spawn_monster_radius))
    );
}

#[test]
fn test_creature_under_overlapping_spawns_is_saved_once() {
    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut map = Map::new(256, 256);
    map.add_spawn(CreatureKind::Monster, Position::new(100, 100, 7), SpawnArea::new(2));
    map.add_spawn(CreatureKind::Monster, Position::new(101, 100, 7), SpawnArea::new(2));
    map.get_or_create_tile(Position::new(100, 101, 7))
        .set_creature(CreatureKind::Monster, Creature::new("Rat", 30));

    let mut data = Vec::new();
    let saved = OtmmSaver::new(&catalog, &config)
        .save(&map, &mut data)
        .expect("save");
    assert_eq!(saved.monsters, 1);

    let (loaded, report) = load_bytes(&catalog, &config, &data);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    assert_eq!(report.monsters, 1);
    assert_eq!(loaded.creature_count(CreatureKind::Monster), 1);
    assert_eq!(loaded.spawns(CreatureKind::Monster).len(), 2);
}

#[test]
fn test_save_and_probe_file() {
    init_logging();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("rook.otmm");
    let catalog = catalog();
    let config = MapIoConfig::default();
    let map = sample_map(&catalog);

    let mut saver = OtmmSaver::new(&catalog, &config).with_editor("test suite");
    let saved = save_map_file(&mut saver, &map, &path).expect("save");
    assert_eq!(probe_map_file(&path).expect("probe"), Some(57));

    let data = std::fs::read(&path).expect("read back");
    assert_eq!(data.len() as u64, saved.bytes_written);
    assert_eq!(probe_header(&data), Some(57));

    let mut monsters = CreatureDatabase::with_names(["Rat"]);
    let mut npcs = CreatureDatabase::with_names(["Cipfried"]);
    let mut loader = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config);
    let mut loaded = Map::default();
    let report = load_map_file(&mut loader, &mut loaded, &path).expect("load");
    assert_eq!(report.tiles, saved.tiles_saved);
    assert_eq!(loaded.houses, map.houses);
}

#[test]
fn test_resave_is_stable() {
    let catalog = catalog();
    let config = MapIoConfig::default();
    let map = sample_map(&catalog);

    let mut first = Vec::new();
    OtmmSaver::new(&catalog, &config)
        .save(&map, &mut first)
        .expect("first save");
    let (loaded, _) = load_bytes(&catalog, &config, &first);

    let mut second = Vec::new();
    OtmmSaver::new(&catalog, &config)
        .save(&loaded, &mut second)
        .expect("second save");
    assert_eq!(first, second);
}
