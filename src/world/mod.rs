//! In-memory map model: positions, tiles, spawns, towns and houses

pub mod map;
pub mod position;
pub mod spawn;
pub mod tile;
pub mod town;

pub use map::Map;
pub use position::{Position, MAX_FLOOR};
pub use spawn::{Creature, CreatureKind, SpawnArea, SpawnIndex};
pub use tile::{
    Tile, TILE_FLAG_NO_LOGOUT, TILE_FLAG_NO_PVP, TILE_FLAG_PROTECTION_ZONE, TILE_FLAG_PVP_ZONE,
};
pub use town::{House, Town};
