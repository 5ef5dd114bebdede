use crate::item::{Item, ItemCatalog};
use crate::world::{Creature, CreatureKind, Position};

pub const TILE_FLAG_PROTECTION_ZONE: u32 = 0x0001;
pub const TILE_FLAG_NO_PVP: u32 = 0x0004;
pub const TILE_FLAG_NO_LOGOUT: u32 = 0x0008;
pub const TILE_FLAG_PVP_ZONE: u32 = 0x0010;

/// One cell of the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    position: Position,
    pub ground: Option<Item>,
    pub items: Vec<Item>,
    pub house_id: Option<u32>,
    pub map_flags: u32,
    pub monster: Option<Creature>,
    pub npc: Option<Creature>,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ground: None,
            items: Vec::new(),
            house_id: None,
            map_flags: 0,
            monster: None,
            npc: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Place an item, ground types replace the ground slot
    pub fn add_item(&mut self, item: Item, catalog: &dyn ItemCatalog) {
        if catalog.is_ground(item.id) {
            self.ground = Some(item);
        } else {
            self.items.push(item);
        }
    }

    pub fn is_house_tile(&self) -> bool {
        self.house_id.is_some()
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.map_flags & flag != 0
    }

    pub fn creature(&self, kind: CreatureKind) -> Option<&Creature> {
        match kind {
            CreatureKind::Monster => self.monster.as_ref(),
            CreatureKind::Npc => self.npc.as_ref(),
        }
    }

    /// Put a creature on the tile, returning the one it replaced
    pub fn set_creature(&mut self, kind: CreatureKind, creature: Creature) -> Option<Creature> {
        let slot = match kind {
            CreatureKind::Monster => &mut self.monster,
            CreatureKind::Npc => &mut self.npc,
        };
        slot.replace(creature)
    }

    /// Number of things standing on the tile
    pub fn size(&self) -> usize {
        usize::from(self.ground.is_some())
            + self.items.len()
            + usize::from(self.monster.is_some())
            + usize::from(self.npc.is_some())
    }

    /// A tile with nothing worth writing
    pub fn is_empty(&self) -> bool {
        self.size() == 0 && self.house_id.is_none() && self.map_flags == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemRegistry, ItemType};

    fn catalog() -> ItemRegistry {
        let mut registry = ItemRegistry::new(3, 57);
        registry.register(ItemType::new(100, "grass").ground());
        registry.register(ItemType::new(101, "dirt").ground());
        registry.register(ItemType::new(200, "stone"));
        registry
    }

    #[test]
    fn test_add_item_routes_ground() {
        let catalog = catalog();
        let mut tile = Tile::new(Position::new(10, 20, 7));
        tile.add_item(Item::plain(100), &catalog);
        tile.add_item(Item::plain(200), &catalog);
        tile.add_item(Item::plain(101), &catalog);

        assert_eq!(tile.ground.as_ref().map(|g| g.id), Some(101));
        assert_eq!(tile.items.len(), 1);
        assert_eq!(tile.size(), 2);
    }

    #[test]
    fn test_empty_tile() {
        let mut tile = Tile::new(Position::new(1, 1, 7));
        assert!(tile.is_empty());
        tile.map_flags = TILE_FLAG_PROTECTION_ZONE;
        assert!(!tile.is_empty());
        assert!(tile.has_flag(TILE_FLAG_PROTECTION_ZONE));
        assert!(!tile.has_flag(TILE_FLAG_NO_LOGOUT));
    }

    #[test]
    fn test_creature_slots_are_independent() {
        let mut tile = Tile::new(Position::new(1, 1, 7));
        assert!(tile.set_creature(CreatureKind::Monster, Creature::new("Rat", 60)).is_none());
        assert!(tile.set_creature(CreatureKind::Npc, Creature::new("Sam", 0)).is_none());
        assert_eq!(tile.creature(CreatureKind::Monster).map(|c| c.name.as_str()), Some("Rat"));
        assert_eq!(tile.creature(CreatureKind::Npc).map(|c| c.name.as_str()), Some("Sam"));
        assert_eq!(tile.size(), 2);
    }
}
