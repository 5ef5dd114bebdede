use serde::{Deserialize, Serialize};

/// Runtime variant an item id is instantiated as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    #[default]
    Plain,
    Container,
    Teleport,
    Door,
    Depot,
}

/// Catalog entry describing one item id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class: ItemClass,
    /// Fills the ground slot of a tile
    #[serde(default)]
    pub ground: bool,
    /// Editor-only marker, never persisted
    #[serde(default)]
    pub meta: bool,
    /// Stackable or fluid; the subtype carries meaning
    #[serde(default)]
    pub has_subtype: bool,
    /// For border items: the ground id this item stands for
    #[serde(default)]
    pub ground_equivalent: Option<u16>,
}

impl ItemType {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class: ItemClass::Plain,
            ground: false,
            meta: false,
            has_subtype: false,
            ground_equivalent: None,
        }
    }

    pub fn with_class(mut self, class: ItemClass) -> Self {
        self.class = class;
        self
    }

    pub fn ground(mut self) -> Self {
        self.ground = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_subtype(mut self) -> Self {
        self.has_subtype = true;
        self
    }

    pub fn border_of(mut self, ground_id: u16) -> Self {
        self.ground_equivalent = Some(ground_id);
        self
    }
}
