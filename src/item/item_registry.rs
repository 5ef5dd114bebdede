use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::item::{Item, ItemClass, ItemType};
use crate::persistence::{PersistenceError, PersistenceResult};

/// Read-only view of the item type database the map codec consults
pub trait ItemCatalog {
    fn major_version(&self) -> u32;
    fn minor_version(&self) -> u32;

    /// Variant for an id, `None` if the id is not in the catalog
    fn item_class(&self, id: u16) -> Option<ItemClass>;
    fn is_ground(&self, id: u16) -> bool;
    fn is_meta(&self, id: u16) -> bool;
    fn has_subtype(&self, id: u16) -> bool;

    /// Ground id a border item stands for
    fn ground_equivalent(&self, id: u16) -> Option<u16>;

    /// Check if some border item names this ground as its equivalent
    fn has_border_equivalent(&self, id: u16) -> bool;

    /// Instantiate the right variant for an id
    fn create_item(&self, id: u16) -> Option<Item> {
        self.item_class(id).map(|class| Item::new(id, class))
    }
}

/// In-memory item catalog
#[derive(Debug, Default)]
pub struct ItemRegistry {
    major_version: u32,
    minor_version: u32,
    items: FxHashMap<u16, ItemType>,
    bordered_grounds: FxHashSet<u16>,
}

#[derive(Deserialize)]
struct ItemRegistryFile {
    major_version: u32,
    minor_version: u32,
    #[serde(default)]
    items: Vec<ItemType>,
}

impl ItemRegistry {
    pub fn new(major_version: u32, minor_version: u32) -> Self {
        Self {
            major_version,
            minor_version,
            items: FxHashMap::default(),
            bordered_grounds: FxHashSet::default(),
        }
    }

    /// Register an item type, replacing any previous entry for its id
    pub fn register(&mut self, item: ItemType) {
        if let Some(ground_id) = item.ground_equivalent {
            self.bordered_grounds.insert(ground_id);
        }
        self.items.insert(item.id, item);
    }

    pub fn get(&self, id: u16) -> Option<&ItemType> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parse a catalog from TOML
    ///
    /// ```toml
    /// major_version = 3
    /// minor_version = 57
    ///
    /// [[items]]
    /// id = 100
    /// name = "grass"
    /// ground = true
    /// ```
    pub fn from_toml_str(raw: &str) -> PersistenceResult<Self> {
        let file: ItemRegistryFile =
            toml::from_str(raw).map_err(|e| PersistenceError::Config(e.to_string()))?;

        let mut registry = Self::new(file.major_version, file.minor_version);
        for item in file.items {
            registry.register(item);
        }
        log::debug!(
            "Item catalog {}.{} with {} types",
            registry.major_version,
            registry.minor_version,
            registry.len()
        );
        Ok(registry)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

impl ItemCatalog for ItemRegistry {
    fn major_version(&self) -> u32 {
        self.major_version
    }

    fn minor_version(&self) -> u32 {
        self.minor_version
    }

    fn item_class(&self, id: u16) -> Option<ItemClass> {
        self.items.get(&id).map(|item| item.class)
    }

    fn is_ground(&self, id: u16) -> bool {
        self.items.get(&id).is_some_and(|item| item.ground)
    }

    fn is_meta(&self, id: u16) -> bool {
        self.items.get(&id).is_some_and(|item| item.meta)
    }

    fn has_subtype(&self, id: u16) -> bool {
        self.items.get(&id).is_some_and(|item| item.has_subtype)
    }

    fn ground_equivalent(&self, id: u16) -> Option<u16> {
        self.items.get(&id).and_then(|item| item.ground_equivalent)
    }

    fn has_border_equivalent(&self, id: u16) -> bool {
        self.bordered_grounds.contains(&id)
    }
}
