pub mod item_registry;
pub mod item_type;
pub mod map_item;

pub use item_registry::{ItemCatalog, ItemRegistry};
pub use item_type::{ItemClass, ItemType};
pub use map_item::{Item, ItemKind};
