use std::collections::BTreeMap;

use crate::world::{CreatureKind, House, Position, SpawnArea, SpawnIndex, Tile, Town};

/// An editable map: tiles keyed by position plus towns, houses and spawns
#[derive(Debug, Clone, Default)]
pub struct Map {
    pub width: u16,
    pub height: u16,
    pub description: String,
    pub towns: BTreeMap<u32, Town>,
    pub houses: BTreeMap<u32, House>,
    tiles: BTreeMap<Position, Tile>,
    spawn_monsters: SpawnIndex,
    spawn_npcs: SpawnIndex,
}

impl Map {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&pos)
    }

    /// Fetch the tile at `pos`, allocating an empty one if needed
    pub fn get_or_create_tile(&mut self, pos: Position) -> &mut Tile {
        self.tiles.entry(pos).or_insert_with(|| Tile::new(pos))
    }

    /// Insert a tile, returning the one previously at its position
    pub fn set_tile(&mut self, tile: Tile) -> Option<Tile> {
        self.tiles.insert(tile.position(), tile)
    }

    pub fn remove_tile(&mut self, pos: Position) -> Option<Tile> {
        self.tiles.remove(&pos)
    }

    /// Tiles in position order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn spawns(&self, kind: CreatureKind) -> &SpawnIndex {
        match kind {
            CreatureKind::Monster => &self.spawn_monsters,
            CreatureKind::Npc => &self.spawn_npcs,
        }
    }

    pub fn spawns_mut(&mut self, kind: CreatureKind) -> &mut SpawnIndex {
        match kind {
            CreatureKind::Monster => &mut self.spawn_monsters,
            CreatureKind::Npc => &mut self.spawn_npcs,
        }
    }

    /// Anchor a spawn region on a tile, allocating the tile if needed
    pub fn add_spawn(&mut self, kind: CreatureKind, anchor: Position, area: SpawnArea) -> bool {
        if !self.spawns_mut(kind).insert(anchor, area) {
            return false;
        }
        self.get_or_create_tile(anchor);
        true
    }

    pub fn creature_count(&self, kind: CreatureKind) -> usize {
        self.tiles
            .values()
            .filter(|tile| tile.creature(kind).is_some())
            .count()
    }

    /// Register a town, returns false if the id is taken
    pub fn add_town(&mut self, town: Town) -> bool {
        if self.towns.contains_key(&town.id) {
            return false;
        }
        self.towns.insert(town.id, town);
        true
    }

    /// Link a tile to a house, creating the house stub on first reference
    pub fn link_house_tile(&mut self, house_id: u32, pos: Position) {
        self.houses
            .entry(house_id)
            .or_insert_with(|| House::new(house_id))
            .add_tile(pos);
        self.get_or_create_tile(pos).house_id = Some(house_id);
    }
}
