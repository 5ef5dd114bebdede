//! OTMM encoder

use std::io::Write;

use rustc_hash::FxHashSet;

use crate::config::{MapIoConfig, SPAWN_RADIUS_LIMIT};
use crate::item::{Item, ItemCatalog};
use crate::persistence::format::{attr, node, spawn_tags};
use crate::persistence::hooks::{percent, NoProgress, ProgressSink};
use crate::persistence::{NodeFileWriter, OtmmHeader, PersistenceError, PersistenceResult};
use crate::world::{CreatureKind, Map, Position, Tile};

/// Outcome of a successful save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub tiles_saved: usize,
    pub tiles_skipped: usize,
    pub items: usize,
    pub monsters: usize,
    pub npcs: usize,
    pub towns: usize,
    pub houses: usize,
    pub bytes_written: u64,
}

impl SaveReport {
    pub fn creatures(&self, kind: CreatureKind) -> usize {
        match kind {
            CreatureKind::Monster => self.monsters,
            CreatureKind::Npc => self.npcs,
        }
    }

    fn count_creature(&mut self, kind: CreatureKind) {
        match kind {
            CreatureKind::Monster => self.monsters += 1,
            CreatureKind::Npc => self.npcs += 1,
        }
    }
}

/// How a tile's ground is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundEncoding {
    /// Ground id 0, nothing else
    Omit,
    /// Ground id in the tile payload
    Plain,
    /// Ground id 0 and the ground as the first child item
    Nested,
}

/// Encodes a [`Map`] as OTMM
pub struct OtmmSaver<'a> {
    catalog: &'a dyn ItemCatalog,
    config: &'a MapIoConfig,
    progress: Box<dyn ProgressSink + 'a>,
    editor: String,
}

impl<'a> OtmmSaver<'a> {
    pub fn new(catalog: &'a dyn ItemCatalog, config: &'a MapIoConfig) -> Self {
        Self {
            catalog,
            config,
            progress: Box::new(NoProgress),
            editor: format!("Saved with otmm-map-io {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Provenance string stored in the editor node
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    pub fn save<W: Write>(&mut self, map: &Map, out: W) -> PersistenceResult<SaveReport> {
        self.progress.begin("Saving OTMM map...");
        let result = self.save_document(map, out);
        self.progress.end();

        match &result {
            Ok(report) => log::info!(
                "Saved map {}x{}: {} tiles ({} empty skipped), {} monsters, {} npcs, {} bytes",
                map.width,
                map.height,
                report.tiles_saved,
                report.tiles_skipped,
                report.monsters,
                report.npcs,
                report.bytes_written
            ),
            Err(e) => log::error!("Failed to save map: {}", e),
        }
        result
    }

    fn save_document<W: Write>(&mut self, map: &Map, out: W) -> PersistenceResult<SaveReport> {
        let mut report = SaveReport::default();
        let mut w = NodeFileWriter::new(out)?;

        OtmmHeader::for_map(map, self.catalog).write_root(&mut w)?;
        w.add_node(node::MAP_DATA)?;

        w.add_node(node::EDITOR)?;
        w.add_string(&self.editor)?;
        w.end_node()?;

        w.add_node(node::DESCRIPTION)?;
        w.add_string(&map.description)?;
        w.end_node()?;

        self.write_tiles(map, &mut w, &mut report)?;
        for kind in [CreatureKind::Monster, CreatureKind::Npc] {
            write_spawns(kind, map, &mut w, &mut report)?;
        }
        write_towns(map, &mut w, &mut report)?;
        write_houses(map, &mut w, &mut report)?;

        w.end_node()?; // map data
        w.end_node()?; // root
        report.bytes_written = w.bytes_written();
        w.finish()?;
        Ok(report)
    }

    fn write_tiles<W: Write>(
        &mut self,
        map: &Map,
        w: &mut NodeFileWriter<W>,
        report: &mut SaveReport,
    ) -> PersistenceResult<()> {
        let total = map.tile_count();
        let interval = self.config.save_progress_interval.max(1) as usize;

        w.add_node(node::TILE_DATA)?;
        for (visited, tile) in map.tiles().enumerate() {
            if (visited + 1) % interval == 0 {
                self.progress.report(percent(visited + 1, total));
                if self.progress.is_cancelled() {
                    log::info!("Map save cancelled after {} tiles", visited);
                    return Err(PersistenceError::Cancelled);
                }
            }

            if tile.is_empty() {
                report.tiles_skipped += 1;
                continue;
            }
            self.write_tile(tile, w, report)?;
            report.tiles_saved += 1;
        }
        w.end_node()
    }

    fn write_tile<W: Write>(
        &self,
        tile: &Tile,
        w: &mut NodeFileWriter<W>,
        report: &mut SaveReport,
    ) -> PersistenceResult<()> {
        w.add_node(if tile.is_house_tile() {
            node::HOUSETILE
        } else {
            node::TILE
        })?;
        w.add_position(tile.position())?;
        if let Some(house_id) = tile.house_id {
            w.add_u32(house_id)?;
        }

        let mut nested_ground = None;
        match &tile.ground {
            Some(ground) => match self.ground_encoding(ground, tile) {
                GroundEncoding::Omit => w.add_u16(0)?,
                GroundEncoding::Plain => w.add_u16(ground.id)?,
                GroundEncoding::Nested => {
                    w.add_u16(0)?;
                    nested_ground = Some(ground);
                }
            },
            None => w.add_u16(0)?,
        }

        if tile.map_flags != 0 {
            w.add_byte(attr::TILE_FLAGS)?;
            w.add_u32(tile.map_flags)?;
        }

        if let Some(ground) = nested_ground {
            ground.serialize_node(w)?;
        }
        for item in tile.items.iter().filter(|item| !self.catalog.is_meta(item.id)) {
            item.serialize_node(w)?;
            report.items += 1;
        }
        w.end_node()
    }

    /// Decide how a tile's ground is stored
    pub fn ground_encoding(&self, ground: &Item, tile: &Tile) -> GroundEncoding {
        if self.catalog.is_meta(ground.id) {
            return GroundEncoding::Omit;
        }
        if self.catalog.has_border_equivalent(ground.id) {
            // A border item standing for this ground implies it
            let implied = tile
                .items
                .iter()
                .any(|item| self.catalog.ground_equivalent(item.id) == Some(ground.id));
            return if implied {
                GroundEncoding::Omit
            } else {
                GroundEncoding::Plain
            };
        }
        if ground.is_complex() || self.catalog.has_subtype(ground.id) {
            return GroundEncoding::Nested;
        }
        GroundEncoding::Plain
    }
}

/// Write one spawn section, each creature once even under overlapping regions
fn write_spawns<W: Write>(
    kind: CreatureKind,
    map: &Map,
    w: &mut NodeFileWriter<W>,
    report: &mut SaveReport,
) -> PersistenceResult<()> {
    let tags = spawn_tags(kind);
    let mut emitted: FxHashSet<Position> = FxHashSet::default();

    w.add_node(tags.section)?;
    for (anchor, area) in map.spawns(kind).iter() {
        w.add_node(tags.area)?;
        w.add_position(anchor)?;
        w.add_u32(area.radius)?;

        // Scan no further than any load keeps
        let radius = area.radius.min(SPAWN_RADIUS_LIMIT) as i32;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let Some(pos) = anchor.offset(dx, dy) else {
                    continue;
                };
                let Some(creature) = map.get_tile(pos).and_then(|tile| tile.creature(kind)) else {
                    continue;
                };
                if !emitted.insert(pos) {
                    continue;
                }

                w.add_node(tags.actor)?;
                w.add_string(&creature.name)?;
                if kind == CreatureKind::Monster {
                    w.add_u32(creature.spawn_time)?;
                }
                w.add_position(pos)?;
                w.end_node()?;
                report.count_creature(kind);
            }
        }
        w.end_node()?;
    }
    w.end_node()?;

    let placed = map.creature_count(kind);
    if placed > emitted.len() {
        log::warn!(
            "{} {}(s) outside every spawn region were not saved",
            placed - emitted.len(),
            kind.label()
        );
    }
    Ok(())
}

fn write_towns<W: Write>(
    map: &Map,
    w: &mut NodeFileWriter<W>,
    report: &mut SaveReport,
) -> PersistenceResult<()> {
    w.add_node(node::TOWN_DATA)?;
    for town in map.towns.values() {
        w.add_node(node::TOWN)?;
        w.add_u32(town.id)?;
        w.add_string(&town.name)?;
        w.add_position(town.temple)?;
        w.end_node()?;
        report.towns += 1;
    }
    w.end_node()
}

fn write_houses<W: Write>(
    map: &Map,
    w: &mut NodeFileWriter<W>,
    report: &mut SaveReport,
) -> PersistenceResult<()> {
    w.add_node(node::HOUSE_DATA)?;
    for house in map.houses.values() {
        w.add_node(node::HOUSE)?;
        w.add_u32(house.id)?;
        w.add_string(&house.name)?;
        w.add_u32(house.town_id)?;
        w.add_u32(house.rent)?;
        w.add_u32(house.beds)?;
        w.add_position(house.exit)?;
        w.end_node()?;
        report.houses += 1;
    }
    w.end_node()
}
