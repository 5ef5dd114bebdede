//! Loading damaged or unusual maps
//!
//! These tests verify that the loader:
//! - rejects files it cannot interpret at all
//! - skips damaged records and reports them as warnings
//! - repairs creatures that no spawn region covers
//! - stops when the progress sink asks it to

use otmm_map_io::persistence::format::node;
use otmm_map_io::persistence::{NodeFileWriter, OtmmHeader, ProgressSink};
use otmm_map_io::{
    CreatureDatabase, CreatureKind, Item, ItemClass, ItemRegistry, ItemType, Map, MapIoConfig,
    OtmmLoader, OtmmSaver, PersistenceError, PersistenceResult, Position, SpawnArea,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> ItemRegistry {
    let mut registry = ItemRegistry::new(3, 57);
    registry.register(ItemType::new(100, "grass").ground());
    registry.register(ItemType::new(200, "stone"));
    registry.register(ItemType::new(1987, "bag").with_class(ItemClass::Container));
    registry
}

fn header(version: u32) -> OtmmHeader {
    OtmmHeader {
        version,
        width: 256,
        height: 256,
        catalog_major: Some(3),
        catalog_minor: Some(57),
    }
}

/// A file whose map data node holds whatever `body` writes
fn document<F>(version: u32, body: F) -> Vec<u8>
where
    F: FnOnce(&mut NodeFileWriter<Vec<u8>>) -> PersistenceResult<()>,
{
    let mut w = NodeFileWriter::new(Vec::new()).expect("writer");
    header(version).write_root(&mut w).expect("root");
    w.add_node(node::MAP_DATA).expect("map data");
    body(&mut w).expect("body");
    w.end_node().expect("close map data");
    w.end_node().expect("close root");
    w.finish().expect("finish")
}

fn monster(w: &mut NodeFileWriter<Vec<u8>>, name: &str, pos: Position) -> PersistenceResult<()> {
    w.add_node(node::MONSTER)?;
    w.add_string(name)?;
    w.add_u32(60)?;
    w.add_position(pos)?;
    w.end_node()
}

#[test]
fn test_unsupported_version_is_fatal() {
    init_logging();
    let data = document(2, |_| Ok(()));
    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut monsters = CreatureDatabase::new();
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let result = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config).load(&mut map, &data);
    assert!(matches!(
        result,
        Err(PersistenceError::VersionMismatch {
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn test_uncovered_creature_gets_fallback_region() {
    init_logging();
    let anchor = Position::new(50, 50, 7);
    let stray = Position::new(70, 70, 7);
    let data = document(1, |w| {
        w.add_node(node::SPAWN_MONSTER_DATA)?;
        w.add_node(node::SPAWN_MONSTER_AREA)?;
        w.add_position(anchor)?;
        w.add_u32(1)?;
        monster(w, "Rat", Position::new(51, 50, 7))?;
        monster(w, "Dragon", stray)?;
        w.end_node()?;
        w.end_node()
    });

    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut monsters = CreatureDatabase::with_names(["Rat"]);
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let report = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
        .load(&mut map, &data)
        .expect("load");

    assert_eq!(report.monsters, 2);
    assert_eq!(report.warnings.len(), 1, "warnings: {:?}", report.warnings);
    assert_eq!(
        map.spawns(CreatureKind::Monster).get(stray),
        Some(&SpawnArea::new(CreatureKind::Monster.fallback_radius()))
    );
    assert_eq!(map.spawns(CreatureKind::Monster).covering_count(stray), 1);
    assert_eq!(
        map.get_tile(stray)
            .and_then(|tile| tile.creature(CreatureKind::Monster))
            .map(|creature| creature.name.as_str()),
        Some("Dragon")
    );
    assert_eq!(monsters.missing_names(), vec!["Dragon"]);
}

#[test]
fn test_duplicate_creature_is_discarded() {
    let pos = Position::new(51, 50, 7);
    let data = document(1, |w| {
        w.add_node(node::SPAWN_MONSTER_DATA)?;
        w.add_node(node::SPAWN_MONSTER_AREA)?;
        w.add_position(Position::new(50, 50, 7))?;
        w.add_u32(3)?;
        monster(w, "Rat", pos)?;
        monster(w, "Cave Rat", pos)?;
        monster(w, "Rat", Position::new(52, 50, 7))?;
        w.end_node()?;
        w.end_node()
    });

    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut monsters = CreatureDatabase::with_names(["Rat", "Cave Rat"]);
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let report = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
        .load(&mut map, &data)
        .expect("load");

    assert_eq!(report.monsters, 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        map.get_tile(pos)
            .and_then(|tile| tile.creature(CreatureKind::Monster))
            .map(|creature| creature.name.as_str()),
        Some("Rat")
    );
}

#[test]
fn test_bad_item_keeps_rest_of_tile() {
    let pos = Position::new(10, 20, 7);
    let data = document(1, |w| {
        w.add_node(node::TILE_DATA)?;
        w.add_node(node::TILE)?;
        w.add_position(pos)?;
        w.add_u16(100)?;
        w.add_node(node::ITEM)?;
        w.add_u16(9999)?;
        w.end_node()?;
        w.add_node(node::ITEM)?;
        w.add_u16(200)?;
        w.add_u8(0x30)?;
        w.end_node()?;
        w.add_node(node::ITEM)?;
        w.add_u16(200)?;
        w.end_node()?;
        w.end_node()?;
        w.end_node()
    });

    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut monsters = CreatureDatabase::new();
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let report = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
        .load(&mut map, &data)
        .expect("load");

    assert_eq!(report.warnings.len(), 2, "warnings: {:?}", report.warnings);
    let tile = map.get_tile(pos).expect("tile should survive");
    assert_eq!(tile.ground.as_ref().map(|g| g.id), Some(100));
    assert_eq!(tile.items, vec![Item::plain(200)]);
}

#[test]
fn test_deeply_nested_containers_drop_only_that_item() {
    init_logging();
    let pos = Position::new(10, 20, 7);
    let data = document(1, |w| {
        w.add_node(node::TILE_DATA)?;
        w.add_node(node::TILE)?;
        w.add_position(pos)?;
        w.add_u16(100)?;
        for _ in 0..8000 {
            w.add_node(node::ITEM)?;
            w.add_u16(1987)?;
        }
        for _ in 0..8000 {
            w.end_node()?;
        }
        w.add_node(node::ITEM)?;
        w.add_u16(200)?;
        w.end_node()?;
        w.end_node()?;
        w.end_node()
    });

    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut monsters = CreatureDatabase::new();
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let report = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
        .load(&mut map, &data)
        .expect("load");

    assert_eq!(report.warnings.len(), 1, "warnings: {:?}", report.warnings);
    let tile = map.get_tile(pos).expect("tile should survive");
    assert_eq!(tile.ground.as_ref().map(|g| g.id), Some(100));
    assert_eq!(tile.items, vec![Item::plain(200)]);
}

#[test]
fn test_truncated_files_never_panic() {
    init_logging();
    let catalog = catalog();
    let config = MapIoConfig::default();
    let mut map = Map::new(64, 64);
    for x in 0..16 {
        let tile = map.get_or_create_tile(Position::new(x, 3, 7));
        tile.add_item(Item::plain(100), &catalog);
        tile.add_item(Item::plain(200).with_action_id(0xFFFD), &catalog);
    }
    let mut data = Vec::new();
    OtmmSaver::new(&catalog, &config)
        .save(&map, &mut data)
        .expect("save");

    for cut in 0..data.len() {
        let mut monsters = CreatureDatabase::new();
        let mut npcs = CreatureDatabase::new();
        let mut loaded = Map::default();
        let result = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
            .load(&mut loaded, &data[..cut]);
        if cut < 2 {
            assert!(result.is_err(), "a {} byte file should not load", cut);
        }
        if let Ok(report) = result {
            assert!(loaded.tile_count() <= 16);
            assert_eq!(report.tiles, loaded.tile_count());
        }
    }
}

/// Cancels as soon as it is first consulted
#[derive(Default)]
struct CancelAtFirstReport {
    reports: usize,
}

impl ProgressSink for CancelAtFirstReport {
    fn begin(&mut self, _label: &str) {}

    fn report(&mut self, _percent: u8) {
        self.reports += 1;
    }

    fn end(&mut self) {}

    fn is_cancelled(&self) -> bool {
        self.reports > 0
    }
}

#[test]
fn test_cancelled_load() {
    let catalog = catalog();
    let config = MapIoConfig {
        load_progress_interval: 1,
        ..Default::default()
    };
    let data = document(1, |w| {
        w.add_node(node::TILE_DATA)?;
        for x in 0..4 {
            w.add_node(node::TILE)?;
            w.add_position(Position::new(x, 0, 7))?;
            w.add_u16(100)?;
            w.end_node()?;
        }
        w.end_node()
    });

    let mut sink = CancelAtFirstReport::default();
    let mut monsters = CreatureDatabase::new();
    let mut npcs = CreatureDatabase::new();
    let mut map = Map::default();
    let result = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config)
        .with_progress(&mut sink)
        .load(&mut map, &data);
    assert!(matches!(result, Err(PersistenceError::Cancelled)));
    assert_eq!(sink.reports, 1);
    assert!(map.tile_count() < 4);
}
