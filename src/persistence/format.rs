//! OTMM wire constants

use crate::world::CreatureKind;

/// Opens a node
pub const NODE_START: u8 = 0xFE;
/// Closes a node
pub const NODE_END: u8 = 0xFF;
/// Prefixes a payload byte that collides with a marker
pub const ESCAPE: u8 = 0xFD;

/// First byte of every file, ignored on read
pub const FILE_MARKER: u8 = 0x00;

/// Deepest container nesting read or written; a top-level item is depth 1
pub const MAX_CONTAINER_DEPTH: usize = 64;

/// Node tags
pub mod node {
    pub const ROOT: u8 = 0;
    pub const MAP_DATA: u8 = 1;
    pub const EDITOR: u8 = 2;
    pub const DESCRIPTION: u8 = 3;
    pub const TILE_DATA: u8 = 4;
    pub const TILE: u8 = 5;
    pub const HOUSETILE: u8 = 6;
    pub const ITEM: u8 = 7;
    pub const SPAWN_MONSTER_DATA: u8 = 8;
    pub const SPAWN_MONSTER_AREA: u8 = 9;
    pub const MONSTER: u8 = 10;
    pub const NPC: u8 = 11;
    pub const TOWN_DATA: u8 = 12;
    pub const TOWN: u8 = 13;
    pub const HOUSE_DATA: u8 = 14;
    pub const HOUSE: u8 = 15;
    pub const SPAWN_NPC_DATA: u8 = 16;
    pub const SPAWN_NPC_AREA: u8 = 17;
}

/// Attribute tags inside tile and item payloads
pub mod attr {
    pub const TILE_FLAGS: u8 = 1;
    pub const SUBTYPE: u8 = 2;
    pub const ACTION_ID: u8 = 3;
    pub const UNIQUE_ID: u8 = 4;
    pub const TEXT: u8 = 5;
    pub const DESC: u8 = 6;
    pub const TELE_DEST: u8 = 7;
    pub const DEPOT_ID: u8 = 8;
    pub const DOOR_ID: u8 = 9;
}

/// Section, region and actor tags for one creature kind
#[derive(Debug, Clone, Copy)]
pub struct SpawnTags {
    pub section: u8,
    pub area: u8,
    pub actor: u8,
}

pub fn spawn_tags(kind: CreatureKind) -> SpawnTags {
    match kind {
        CreatureKind::Monster => SpawnTags {
            section: node::SPAWN_MONSTER_DATA,
            area: node::SPAWN_MONSTER_AREA,
            actor: node::MONSTER,
        },
        CreatureKind::Npc => SpawnTags {
            section: node::SPAWN_NPC_DATA,
            area: node::SPAWN_NPC_AREA,
            actor: node::NPC,
        },
    }
}
