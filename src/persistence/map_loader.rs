//! OTMM decoder
//!
//! Only a bad header, a missing map data node, a declined catalog prompt and
//! cancellation abort a load. Every other problem is logged, added to the
//! [`LoadReport`] and skips the smallest record that contains it.

use crate::config::MapIoConfig;
use crate::creature::CreatureRegistry;
use crate::item::{Item, ItemCatalog};
use crate::persistence::format::{attr, node, spawn_tags, SpawnTags};
use crate::persistence::hooks::{percent, AlwaysDecline, NoProgress, ProgressSink, UserPrompt};
use crate::persistence::{
    corrupted_data, BinaryNode, NodeFileReader, OtmmHeader, PersistenceError,
    PersistenceErrorContext, PersistenceResult,
};
use crate::world::{Creature, CreatureKind, Map, SpawnArea, Tile, Town};

/// Outcome of a successful load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub header: Option<OtmmHeader>,
    pub warnings: Vec<String>,
    pub tiles: usize,
    pub items: usize,
    pub monsters: usize,
    pub npcs: usize,
    pub towns: usize,
    pub houses: usize,
}

impl LoadReport {
    pub fn creatures(&self, kind: CreatureKind) -> usize {
        match kind {
            CreatureKind::Monster => self.monsters,
            CreatureKind::Npc => self.npcs,
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    fn count_creature(&mut self, kind: CreatureKind) {
        match kind {
            CreatureKind::Monster => self.monsters += 1,
            CreatureKind::Npc => self.npcs += 1,
        }
    }
}

/// Decodes OTMM data into a [`Map`]
pub struct OtmmLoader<'a> {
    catalog: &'a dyn ItemCatalog,
    monsters: &'a mut dyn CreatureRegistry,
    npcs: &'a mut dyn CreatureRegistry,
    config: &'a MapIoConfig,
    progress: Box<dyn ProgressSink + 'a>,
    prompt: Box<dyn UserPrompt + 'a>,
    size: usize,
    tiles_seen: u32,
}

impl<'a> OtmmLoader<'a> {
    /// A loader that reports no progress and declines every prompt
    pub fn new(
        catalog: &'a dyn ItemCatalog,
        monsters: &'a mut dyn CreatureRegistry,
        npcs: &'a mut dyn CreatureRegistry,
        config: &'a MapIoConfig,
    ) -> Self {
        Self {
            catalog,
            monsters,
            npcs,
            config,
            progress: Box::new(NoProgress),
            prompt: Box::new(AlwaysDecline),
            size: 0,
            tiles_seen: 0,
        }
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn with_prompt(mut self, prompt: impl UserPrompt + 'a) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Decode `data` into `map`
    pub fn load(&mut self, map: &mut Map, data: &[u8]) -> PersistenceResult<LoadReport> {
        self.progress.begin("Loading OTMM map...");
        self.size = data.len();
        self.tiles_seen = 0;
        let result = self.load_document(map, data);
        self.progress.end();

        match &result {
            Ok(report) => log::info!(
                "Loaded map {}x{}: {} tiles, {} items, {} monsters, {} npcs, {} towns, {} houses, {} warnings",
                map.width,
                map.height,
                report.tiles,
                report.items,
                report.monsters,
                report.npcs,
                report.towns,
                report.houses,
                report.warnings.len()
            ),
            Err(e) => log::error!("Failed to load map: {}", e),
        }
        result
    }

    fn load_document(&mut self, map: &mut Map, data: &[u8]) -> PersistenceResult<LoadReport> {
        let reader = NodeFileReader::new(data);
        let mut root = reader.root_node()?;
        root.skip(1)
            .persistence_context("could not read root node")?;

        let header = OtmmHeader::read(&mut root)?;
        map.width = header.width;
        map.height = header.height;

        let mut report = LoadReport {
            header: Some(header),
            ..Default::default()
        };
        self.check_catalog(&header, &mut report)?;

        let mut map_data = match root.first_child()? {
            Some(child) => child,
            None => return Err(corrupted_data("missing map data node")),
        };
        if map_data.get_u8().ok() != Some(node::MAP_DATA) {
            return Err(corrupted_data("root child is not a map data node"));
        }

        for section in map_data.children() {
            let mut section = match section {
                Ok(section) => section,
                Err(e) => {
                    report.warn(format!("Malformed map data: {}", e));
                    break;
                }
            };
            self.read_section(map, &mut section, &mut report)?;
            self.report_progress(section.offset())?;
        }
        Ok(report)
    }

    fn check_catalog(
        &mut self,
        header: &OtmmHeader,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        if !header.major_supported(self.catalog) {
            let accepted = self.prompt.confirm(
                "Map error",
                "The loaded map appears to be saved with an item catalog that deviates from \
                 the one loaded. Do you still want to attempt to load the map?",
            );
            if !accepted {
                return Err(PersistenceError::Rejected(format!(
                    "map item catalog major version {:?} is not supported by local version {}",
                    header.catalog_major,
                    self.catalog.major_version()
                )));
            }
            report.warn(format!(
                "Unsupported or damaged item catalog version {:?}, loading anyway",
                header.catalog_major
            ));
        }
        if !header.minor_supported(self.catalog) {
            report.warn(format!(
                "The map needs a newer item catalog (minor version {:?}, local {})",
                header.catalog_minor,
                self.catalog.minor_version()
            ));
        }
        Ok(())
    }

    fn report_progress(&mut self, offset: usize) -> PersistenceResult<()> {
        self.progress.report(percent(offset, self.size));
        if self.progress.is_cancelled() {
            log::info!("Map load cancelled at offset {}", offset);
            return Err(PersistenceError::Cancelled);
        }
        Ok(())
    }

    fn read_section(
        &mut self,
        map: &mut Map,
        section: &mut BinaryNode<'_>,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        let tag = match section.get_u8() {
            Ok(tag) => tag,
            Err(_) => {
                report.warn("Invalid map node");
                return Ok(());
            }
        };

        match tag {
            node::EDITOR => {
                if let Ok(editor) = section.get_string() {
                    log::debug!("Map editor: {}", editor);
                }
            }
            node::DESCRIPTION => match section.get_string() {
                Ok(description) => map.description = description,
                Err(e) => report.warn(format!("Could not read map description: {}", e)),
            },
            node::TILE_DATA => self.read_tiles(map, section, report)?,
            node::SPAWN_MONSTER_DATA => {
                self.read_spawns(CreatureKind::Monster, map, section, report)
            }
            node::SPAWN_NPC_DATA => self.read_spawns(CreatureKind::Npc, map, section, report),
            node::TOWN_DATA => read_towns(map, section, report),
            node::HOUSE_DATA => read_houses(map, section, report),
            other => report.warn(format!("Unknown map node type {}, skipping", other)),
        }
        Ok(())
    }

    fn read_tiles(
        &mut self,
        map: &mut Map,
        section: &BinaryNode<'_>,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        for tile_node in section.children() {
            let mut tile_node = match tile_node {
                Ok(tile_node) => tile_node,
                Err(e) => {
                    report.warn(format!("Malformed tile data: {}", e));
                    break;
                }
            };

            self.tiles_seen += 1;
            if self.tiles_seen % self.config.load_progress_interval.max(1) == 0 {
                self.report_progress(tile_node.offset())?;
            }

            if let Err(e) = self.read_tile(map, &mut tile_node, report) {
                report.warn(format!("Skipping tile: {}", e));
            }
        }
        Ok(())
    }

    fn read_tile(
        &self,
        map: &mut Map,
        tile_node: &mut BinaryNode<'_>,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        let tag = tile_node
            .get_u8()
            .persistence_context("invalid tile type")?;
        if tag != node::TILE && tag != node::HOUSETILE {
            return Err(corrupted_data(format!("unknown type of tile node {}", tag)));
        }

        let pos = tile_node
            .get_position()
            .persistence_context("could not read position of tile")?;
        if map.get_tile(pos).is_some() {
            report.warn(format!("Duplicate tile at {}, discarding duplicate", pos));
            return Ok(());
        }

        let mut tile = Tile::new(pos);
        if tag == node::HOUSETILE {
            let house_id = tile_node
                .get_u32()
                .persistence_context(&format!("house tile {} without house data", pos))?;
            if house_id == 0 {
                report.warn(format!("Invalid house id from tile {}", pos));
            } else {
                tile.house_id = Some(house_id);
            }
        }

        match tile_node.get_u16() {
            Ok(0) => {}
            Ok(ground_id) => match self.catalog.create_item(ground_id) {
                Some(ground) => {
                    tile.add_item(ground, self.catalog);
                    report.items += 1;
                }
                None => report.warn(format!("Unknown ground id {} at {}", ground_id, pos)),
            },
            Err(_) => report.warn(format!("Could not read ground of tile {}", pos)),
        }

        while let Ok(attribute) = tile_node.get_u8() {
            match attribute {
                attr::TILE_FLAGS => match tile_node.get_u32() {
                    Ok(flags) => tile.map_flags = flags,
                    Err(_) => report.warn(format!("Invalid tile flags of tile on {}", pos)),
                },
                other => report.warn(format!("Unknown tile attribute {} at {}", other, pos)),
            }
        }

        for child in tile_node.children() {
            let mut child = match child {
                Ok(child) => child,
                Err(e) => {
                    report.warn(format!("Malformed items on tile {}: {}", pos, e));
                    break;
                }
            };
            if child.get_u8().ok() != Some(node::ITEM) {
                report.warn(format!("Unknown type of tile child node at {}", pos));
                continue;
            }
            match Item::read_node(self.catalog, &mut child) {
                Ok(item) => {
                    tile.add_item(item, self.catalog);
                    report.items += 1;
                }
                Err(e) => report.warn(format!("Couldn't unserialize item at {}: {}", pos, e)),
            }
        }

        let house_id = tile.house_id;
        map.set_tile(tile);
        if let Some(house_id) = house_id {
            map.link_house_tile(house_id, pos);
        }
        report.tiles += 1;
        Ok(())
    }

    fn read_spawns(
        &mut self,
        kind: CreatureKind,
        map: &mut Map,
        section: &BinaryNode<'_>,
        report: &mut LoadReport,
    ) {
        let tags = spawn_tags(kind);
        for area in section.children() {
            let mut area = match area {
                Ok(area) => area,
                Err(e) => {
                    report.warn(format!("Malformed {} spawn data: {}", kind.label(), e));
                    break;
                }
            };
            if let Err(e) = self.read_spawn_area(kind, tags, map, &mut area, report) {
                report.warn(format!("Skipping {} spawn: {}", kind.label(), e));
            }
        }
    }

    fn read_spawn_area(
        &mut self,
        kind: CreatureKind,
        tags: SpawnTags,
        map: &mut Map,
        area: &mut BinaryNode<'_>,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        let tag = area.get_u8().persistence_context("could not read spawn type")?;
        if tag != tags.area {
            return Err(corrupted_data(format!("invalid spawn type {}", tag)));
        }
        let anchor = area
            .get_position()
            .persistence_context("could not read spawn position")?;
        let radius = area
            .get_u32()
            .persistence_context("could not read spawn radius")?
            .min(self.config.max_radius(kind));

        if !map.add_spawn(kind, anchor, SpawnArea::new(radius)) {
            report.warn(format!("Duplicate {} spawn on position {}", kind.label(), anchor));
            return Ok(());
        }

        for actor in area.children() {
            let mut actor = match actor {
                Ok(actor) => actor,
                Err(e) => {
                    report.warn(format!("Malformed {} spawn at {}: {}", kind.label(), anchor, e));
                    break;
                }
            };
            if let Err(e) = self.read_actor(kind, tags, map, &mut actor, report) {
                report.warn(format!("Skipping {} in spawn {}: {}", kind.label(), anchor, e));
            }
        }
        Ok(())
    }

    fn read_actor(
        &mut self,
        kind: CreatureKind,
        tags: SpawnTags,
        map: &mut Map,
        actor: &mut BinaryNode<'_>,
        report: &mut LoadReport,
    ) -> PersistenceResult<()> {
        let tag = actor
            .get_u8()
            .persistence_context("could not read type of creature node")?;
        if tag != tags.actor {
            return Err(corrupted_data(format!("unknown creature node type 0x{:02x}", tag)));
        }

        let name = actor
            .get_string()
            .persistence_context("could not read creature name")?;
        let spawn_time = match kind {
            CreatureKind::Monster => actor
                .get_u32()
                .persistence_context("could not read spawn time")?,
            CreatureKind::Npc => 0,
        };
        let pos = actor
            .get_position()
            .persistence_context(&format!("could not read position of \"{}\"", name))?;

        if map.get_tile(pos).and_then(|tile| tile.creature(kind)).is_some() {
            report.warn(format!(
                "Duplicate {} \"{}\" at {}, discarding",
                kind.label(),
                name,
                pos
            ));
            return Ok(());
        }

        let registry = match kind {
            CreatureKind::Monster => &mut *self.monsters,
            CreatureKind::Npc => &mut *self.npcs,
        };
        if registry.lookup(&name).is_none() {
            registry.register_missing(&name);
            report.warn(format!("Unknown {} type \"{}\"", kind.label(), name));
        }

        map.get_or_create_tile(pos)
            .set_creature(kind, Creature::new(name, spawn_time));
        report.count_creature(kind);

        if map.spawns(kind).covering_count(pos) == 0 {
            let radius = kind.fallback_radius().min(self.config.max_radius(kind));
            log::debug!(
                "No {} spawn covers {}, adding one with radius {}",
                kind.label(),
                pos,
                radius
            );
            map.add_spawn(kind, pos, SpawnArea::new(radius));
        }
        Ok(())
    }
}

fn read_towns(map: &mut Map, section: &BinaryNode<'_>, report: &mut LoadReport) {
    for town_node in section.children() {
        let mut town_node = match town_node {
            Ok(town_node) => town_node,
            Err(e) => {
                report.warn(format!("Malformed town data: {}", e));
                break;
            }
        };
        if let Err(e) = read_town(map, &mut town_node, report) {
            report.warn(format!("Skipping town: {}", e));
        }
    }
}

fn read_town(
    map: &mut Map,
    town_node: &mut BinaryNode<'_>,
    report: &mut LoadReport,
) -> PersistenceResult<()> {
    let tag = town_node.get_u8().persistence_context("could not read town type")?;
    if tag != node::TOWN {
        return Err(corrupted_data(format!("unknown town type {}", tag)));
    }
    let id = town_node.get_u32().persistence_context("invalid town id")?;
    if map.towns.contains_key(&id) {
        report.warn(format!("Duplicate town id {}, discarding duplicate", id));
        return Ok(());
    }
    let name = town_node.get_string().persistence_context("invalid town name")?;
    let temple = town_node
        .get_position()
        .persistence_context("invalid town temple position")?;

    map.add_town(Town::new(id, name, temple));
    report.towns += 1;
    Ok(())
}

fn read_houses(map: &mut Map, section: &BinaryNode<'_>, report: &mut LoadReport) {
    for house_node in section.children() {
        let mut house_node = match house_node {
            Ok(house_node) => house_node,
            Err(e) => {
                report.warn(format!("Malformed house data: {}", e));
                break;
            }
        };
        if let Err(e) = read_house(map, &mut house_node, report) {
            report.warn(format!("Skipping house: {}", e));
        }
    }
}

fn read_house(
    map: &mut Map,
    house_node: &mut BinaryNode<'_>,
    report: &mut LoadReport,
) -> PersistenceResult<()> {
    let tag = house_node.get_u8().persistence_context("could not read house type")?;
    if tag != node::HOUSE {
        return Err(corrupted_data(format!("unknown house type {}", tag)));
    }
    let id = house_node.get_u32().persistence_context("could not read house id")?;
    let Some(house) = map.houses.get_mut(&id) else {
        log::debug!("Discarding house {} with no tiles", id);
        return Ok(());
    };

    let name = house_node.get_string().persistence_context("could not read house name")?;
    let town_id = house_node.get_u32().persistence_context("could not read house town id")?;
    let rent = house_node.get_u32().persistence_context("could not read house rent")?;
    let beds = house_node.get_u32().persistence_context("could not read house max beds")?;
    house.name = name;
    house.town_id = town_id;
    house.rent = rent;
    house.beds = beds;

    house.exit = house_node
        .get_position()
        .persistence_context(&format!("invalid exit position of house {}", id))?;
    report.houses += 1;
    Ok(())
}
