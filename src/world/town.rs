use rustc_hash::FxHashSet;

use crate::world::Position;

/// A named town with the temple new players respawn at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Town {
    pub id: u32,
    pub name: String,
    pub temple: Position,
}

impl Town {
    pub fn new(id: u32, name: impl Into<String>, temple: Position) -> Self {
        Self {
            id,
            name: name.into(),
            temple,
        }
    }
}

/// A rentable house and the tiles it is made of
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct House {
    pub id: u32,
    pub name: String,
    pub town_id: u32,
    pub rent: u32,
    pub beds: u32,
    pub exit: Position,
    /// Tiles in the order they were linked
    tiles: Vec<Position>,
    tile_set: FxHashSet<Position>,
}

impl House {
    /// A house known only by id, as created from a house tile
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn add_tile(&mut self, pos: Position) {
        if self.tile_set.insert(pos) {
            self.tiles.push(pos);
        }
    }

    pub fn tiles(&self) -> &[Position] {
        &self.tiles
    }
}
