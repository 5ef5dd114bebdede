//! Tunables for map loading and saving

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, PersistenceResult};
use crate::world::CreatureKind;

/// Largest spawn radius a file may declare
pub const SPAWN_RADIUS_LIMIT: u32 = 255;

/// Configuration for the map codec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapIoConfig {
    /// Monster spawn radii above this are clamped on load
    pub max_spawn_monster_radius: u32,
    /// NPC spawn radii above this are clamped on load
    pub max_spawn_npc_radius: u32,
    /// Tile records between progress reports while loading
    pub load_progress_interval: u32,
    /// Tiles between progress reports while saving
    pub save_progress_interval: u32,
}

impl Default for MapIoConfig {
    fn default() -> Self {
        Self {
            max_spawn_monster_radius: 30,
            max_spawn_npc_radius: 30,
            load_progress_interval: 4096,
            save_progress_interval: 8192,
        }
    }
}

impl MapIoConfig {
    pub fn from_toml_str(raw: &str) -> PersistenceResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| PersistenceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> PersistenceResult<()> {
        for (name, radius) in [
            ("max_spawn_monster_radius", self.max_spawn_monster_radius),
            ("max_spawn_npc_radius", self.max_spawn_npc_radius),
        ] {
            if !(1..=SPAWN_RADIUS_LIMIT).contains(&radius) {
                return Err(PersistenceError::Config(format!(
                    "{} must be within 1..={}, got {}",
                    name, SPAWN_RADIUS_LIMIT, radius
                )));
            }
        }
        if self.load_progress_interval == 0 || self.save_progress_interval == 0 {
            return Err(PersistenceError::Config(
                "progress intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn max_radius(&self, kind: CreatureKind) -> u32 {
        match kind {
            CreatureKind::Monster => self.max_spawn_monster_radius,
            CreatureKind::Npc => self.max_spawn_npc_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MapIoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_radius(CreatureKind::Monster), 30);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MapIoConfig::from_toml_str("max_spawn_npc_radius = 4")
            .expect("partial config should parse");
        assert_eq!(config.max_radius(CreatureKind::Npc), 4);
        assert_eq!(config.load_progress_interval, 4096);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(matches!(
            MapIoConfig::from_toml_str("max_spawn_monster_radius = 0"),
            Err(PersistenceError::Config(_))
        ));
        assert!(matches!(
            MapIoConfig::from_toml_str("max_spawn_npc_radius = 300"),
            Err(PersistenceError::Config(_))
        ));
        assert!(matches!(
            MapIoConfig::from_toml_str("save_progress_interval = 0"),
            Err(PersistenceError::Config(_))
        ));
    }
}
