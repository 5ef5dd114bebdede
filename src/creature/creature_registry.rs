use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::persistence::{PersistenceError, PersistenceResult};

/// A named monster or NPC type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureType {
    pub name: String,
    /// Registered as a placeholder because a map referenced an unknown name
    pub missing: bool,
}

/// Lookup table of creature types by name
pub trait CreatureRegistry {
    fn lookup(&self, name: &str) -> Option<&CreatureType>;

    /// Register a placeholder for a name the registry does not know
    fn register_missing(&mut self, name: &str) -> &CreatureType;
}

/// Case-insensitive in-memory creature registry
#[derive(Debug, Default)]
pub struct CreatureDatabase {
    types: FxHashMap<String, CreatureType>,
}

#[derive(Deserialize)]
struct CreatureDatabaseFile {
    #[serde(default)]
    names: Vec<String>,
}

impl CreatureDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut database = Self::new();
        for name in names {
            database.register(name);
        }
        database
    }

    pub fn register(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.types.insert(
            name.to_lowercase(),
            CreatureType { name, missing: false },
        );
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names registered as placeholders, sorted
    pub fn missing_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .types
            .values()
            .filter(|t| t.missing)
            .map(|t| t.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Parse `names = ["Rat", "Cave Rat"]`
    pub fn from_toml_str(raw: &str) -> PersistenceResult<Self> {
        let file: CreatureDatabaseFile =
            toml::from_str(raw).map_err(|e| PersistenceError::Config(e.to_string()))?;
        Ok(Self::with_names(file.names))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

impl CreatureRegistry for CreatureDatabase {
    fn lookup(&self, name: &str) -> Option<&CreatureType> {
        self.types.get(&name.to_lowercase())
    }

    fn register_missing(&mut self, name: &str) -> &CreatureType {
        self.types
            .entry(name.to_lowercase())
            .or_insert_with(|| CreatureType {
                name: name.to_string(),
                missing: true,
            })
    }
}
