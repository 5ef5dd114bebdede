use crate::item::ItemClass;
use crate::world::Position;

/// Variant-specific item state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Plain,
    Container { contents: Vec<Item> },
    Teleport { destination: Position },
    Door { door_id: u8 },
    Depot { depot_id: u16 },
}

impl ItemKind {
    pub fn for_class(class: ItemClass) -> Self {
        match class {
            ItemClass::Plain => ItemKind::Plain,
            ItemClass::Container => ItemKind::Container { contents: Vec::new() },
            ItemClass::Teleport => ItemKind::Teleport { destination: Position::default() },
            ItemClass::Door => ItemKind::Door { door_id: 0 },
            ItemClass::Depot => ItemKind::Depot { depot_id: 0 },
        }
    }

    pub fn class(&self) -> ItemClass {
        match self {
            ItemKind::Plain => ItemClass::Plain,
            ItemKind::Container { .. } => ItemClass::Container,
            ItemKind::Teleport { .. } => ItemClass::Teleport,
            ItemKind::Door { .. } => ItemClass::Door,
            ItemKind::Depot { .. } => ItemClass::Depot,
        }
    }
}

/// An item placed on the map or inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: u16,
    pub subtype: u16,
    pub action_id: u16,
    pub unique_id: u16,
    pub text: String,
    pub description: String,
    pub kind: ItemKind,
}

impl Item {
    /// Create an item with default attributes
    pub fn new(id: u16, class: ItemClass) -> Self {
        Self {
            id,
            subtype: 0,
            action_id: 0,
            unique_id: 0,
            text: String::new(),
            description: String::new(),
            kind: ItemKind::for_class(class),
        }
    }

    pub fn plain(id: u16) -> Self {
        Self::new(id, ItemClass::Plain)
    }

    pub fn with_subtype(mut self, subtype: u16) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn with_action_id(mut self, action_id: u16) -> Self {
        self.action_id = action_id;
        self
    }

    pub fn with_unique_id(mut self, unique_id: u16) -> Self {
        self.unique_id = unique_id;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn class(&self) -> ItemClass {
        self.kind.class()
    }

    /// Items held by a container, empty for every other variant
    pub fn contents(&self) -> &[Item] {
        match &self.kind {
            ItemKind::Container { contents } => contents,
            _ => &[],
        }
    }

    pub fn contents_mut(&mut self) -> Option<&mut Vec<Item>> {
        match &mut self.kind {
            ItemKind::Container { contents } => Some(contents),
            _ => None,
        }
    }

    /// Check whether any attribute differs from its default
    pub fn has_attributes(&self) -> bool {
        let variant = match &self.kind {
            ItemKind::Plain | ItemKind::Container { .. } => false,
            ItemKind::Teleport { destination } => *destination != Position::default(),
            ItemKind::Door { door_id } => *door_id != 0,
            ItemKind::Depot { depot_id } => *depot_id != 0,
        };
        variant
            || self.subtype > 0
            || self.action_id != 0
            || self.unique_id != 0
            || !self.text.is_empty()
            || !self.description.is_empty()
    }

    /// Items that cannot be reduced to a bare id
    pub fn is_complex(&self) -> bool {
        self.has_attributes() || !self.contents().is_empty()
    }
}
