use serde::{Deserialize, Serialize};

/// Highest floor index that survives a save (floors are stored in 4 bits)
pub const MAX_FLOOR: u8 = 0x0f;

/// Position of a tile on the map (map coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl Position {
    pub const fn new(x: u16, y: u16, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Create a position offset on the same floor, `None` if it leaves the map range
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        let x = u16::try_from(i32::from(self.x) + dx).ok()?;
        let y = u16::try_from(i32::from(self.y) + dy).ok()?;
        Some(Self::new(x, y, self.z))
    }

    /// Floor index as it is written to disk
    pub fn stored_floor(&self) -> u8 {
        self.z & MAX_FLOOR
    }

    /// Chebyshev distance on the same floor, `None` across floors
    pub fn square_distance_to(&self, other: Position) -> Option<u32> {
        if self.z != other.z {
            return None;
        }
        let dx = u32::from(self.x.abs_diff(other.x));
        let dy = u32::from(self.y.abs_diff(other.y));
        Some(dx.max(dy))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}
