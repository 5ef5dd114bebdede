//! Reader and writer for OTMM binary map files
//!
//! An OTMM file is a tree of escaped binary nodes holding a map's tiles,
//! items, spawn regions, towns and houses. [`OtmmLoader`] decodes it into a
//! [`Map`], tolerating damaged records, and [`OtmmSaver`] encodes a [`Map`]
//! back.

pub mod config;
pub mod creature;
pub mod item;
pub mod persistence;
pub mod world;

pub use config::MapIoConfig;
pub use creature::{CreatureDatabase, CreatureRegistry, CreatureType};
pub use item::{Item, ItemCatalog, ItemClass, ItemKind, ItemRegistry, ItemType};
pub use persistence::{
    LoadReport, OtmmLoader, OtmmSaver, PersistenceError, PersistenceResult, SaveReport,
};
pub use world::{Creature, CreatureKind, House, Map, Position, SpawnArea, Tile, Town};
