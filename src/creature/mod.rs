//! Monster and NPC type registries consulted while loading spawn data

pub mod creature_registry;

pub use creature_registry::{CreatureDatabase, CreatureRegistry, CreatureType};
