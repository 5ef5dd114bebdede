use std::collections::BTreeMap;

use crate::world::Position;

/// The two kinds of spawned creatures a map tracks separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatureKind {
    Monster,
    Npc,
}

impl CreatureKind {
    pub fn label(&self) -> &'static str {
        match self {
            CreatureKind::Monster => "monster",
            CreatureKind::Npc => "npc",
        }
    }

    /// Radius of the region created for a creature no region covers
    pub fn fallback_radius(&self) -> u32 {
        match self {
            CreatureKind::Monster => 5,
            CreatureKind::Npc => 1,
        }
    }
}

/// A monster or NPC standing on a tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    pub name: String,
    /// Respawn delay in seconds, monsters only
    pub spawn_time: u32,
}

impl Creature {
    pub fn new(name: impl Into<String>, spawn_time: u32) -> Self {
        Self {
            name: name.into(),
            spawn_time,
        }
    }
}

/// Square spawn region around an anchor tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnArea {
    pub radius: u32,
}

impl SpawnArea {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    pub fn covers(&self, anchor: Position, pos: Position) -> bool {
        anchor
            .square_distance_to(pos)
            .is_some_and(|distance| distance <= self.radius)
    }
}

/// Spawn regions of one creature kind keyed by anchor
#[derive(Debug, Clone, Default)]
pub struct SpawnIndex {
    regions: BTreeMap<Position, SpawnArea>,
    /// Largest radius ever inserted, bounds coverage queries
    reach: u32,
}

impl SpawnIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region, returns false if the anchor already holds one
    pub fn insert(&mut self, anchor: Position, area: SpawnArea) -> bool {
        if self.regions.contains_key(&anchor) {
            return false;
        }
        self.reach = self.reach.max(area.radius);
        self.regions.insert(anchor, area);
        true
    }

    pub fn remove(&mut self, anchor: Position) -> Option<SpawnArea> {
        self.regions.remove(&anchor)
    }

    pub fn get(&self, anchor: Position) -> Option<&SpawnArea> {
        self.regions.get(&anchor)
    }

    pub fn contains(&self, anchor: Position) -> bool {
        self.regions.contains_key(&anchor)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in anchor order
    pub fn iter(&self) -> impl Iterator<Item = (Position, &SpawnArea)> + '_ {
        self.regions.iter().map(|(pos, area)| (*pos, area))
    }

    /// Regions whose square contains `pos`
    pub fn covering(&self, pos: Position) -> impl Iterator<Item = (Position, &SpawnArea)> + '_ {
        let reach = u16::try_from(self.reach).unwrap_or(u16::MAX);
        let low = Position::new(pos.x.saturating_sub(reach), 0, 0);
        let high = Position::new(pos.x.saturating_add(reach), u16::MAX, u8::MAX);
        self.regions
            .range(low..=high)
            .filter(move |(anchor, area)| area.covers(**anchor, pos))
            .map(|(anchor, area)| (*anchor, area))
    }

    pub fn covering_count(&self, pos: Position) -> usize {
        self.covering(pos).count()
    }
}
