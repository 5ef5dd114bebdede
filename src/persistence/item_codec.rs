//! Item records
//!
//! An `ITEM` node's payload is the item id followed by tagged attributes.
//! Each variant reads the tags it owns and hands the rest to the base
//! handler. Container contents follow as nested `ITEM` nodes.

use std::io::Write;

use crate::item::{Item, ItemCatalog, ItemKind};
use crate::persistence::format::node::ITEM;
use crate::persistence::format::{attr, MAX_CONTAINER_DEPTH};
use crate::persistence::{
    corrupted_data, BinaryNode, NodeFileWriter, PersistenceError, PersistenceResult,
};
use crate::world::Position;

impl Item {
    /// Decode an item whose node tag has already been consumed
    ///
    /// Containers nested deeper than [`MAX_CONTAINER_DEPTH`] fail the item.
    pub fn read_node(
        catalog: &dyn ItemCatalog,
        node: &mut BinaryNode<'_>,
    ) -> PersistenceResult<Item> {
        Self::read_node_at(catalog, node, 1)
    }

    fn read_node_at(
        catalog: &dyn ItemCatalog,
        node: &mut BinaryNode<'_>,
        depth: usize,
    ) -> PersistenceResult<Item> {
        if depth > MAX_CONTAINER_DEPTH {
            return Err(corrupted_data(format!(
                "containers nested deeper than {} at offset {}",
                MAX_CONTAINER_DEPTH,
                node.offset()
            )));
        }
        let id = node.get_u16()?;
        let mut item = catalog
            .create_item(id)
            .ok_or(PersistenceError::UnknownItem(id))?;
        item.read_attributes(node)?;

        if let Some(contents) = item.contents_mut() {
            for child in node.children() {
                let mut child = child?;
                if child.get_u8()? != ITEM {
                    return Err(corrupted_data(format!(
                        "container {} holds a non-item node at offset {}",
                        id,
                        child.offset()
                    )));
                }
                contents.push(Item::read_node_at(catalog, &mut child, depth + 1)?);
            }
        }
        Ok(item)
    }

    /// Read attribute tags until the payload is exhausted
    pub fn read_attributes(&mut self, node: &mut BinaryNode<'_>) -> PersistenceResult<()> {
        while node.remaining() > 0 {
            let tag = node.get_u8()?;
            self.read_attribute(tag, node)?;
        }
        Ok(())
    }

    fn read_attribute(&mut self, tag: u8, node: &mut BinaryNode<'_>) -> PersistenceResult<()> {
        let handled = match (&mut self.kind, tag) {
            (ItemKind::Teleport { destination }, attr::TELE_DEST) => {
                *destination = node.get_position()?;
                true
            }
            (ItemKind::Door { door_id }, attr::DOOR_ID) => {
                *door_id = node.get_u8()?;
                true
            }
            (ItemKind::Depot { depot_id }, attr::DEPOT_ID) => {
                *depot_id = node.get_u16()?;
                true
            }
            _ => false,
        };
        if handled {
            Ok(())
        } else {
            self.read_base_attribute(tag, node)
        }
    }

    fn read_base_attribute(
        &mut self,
        tag: u8,
        node: &mut BinaryNode<'_>,
    ) -> PersistenceResult<()> {
        match tag {
            attr::SUBTYPE => self.subtype = node.get_u16()?,
            attr::ACTION_ID => self.action_id = node.get_u16()?,
            attr::UNIQUE_ID => self.unique_id = node.get_u16()?,
            attr::TEXT => self.text = node.get_string()?,
            attr::DESC => self.description = node.get_string()?,
            // Variant attributes on an item that is no longer that variant
            attr::DEPOT_ID => node.skip(2)?,
            attr::DOOR_ID => node.skip(1)?,
            attr::TELE_DEST => node.skip(5)?,
            other => return Err(PersistenceError::UnknownAttribute(other)),
        }
        Ok(())
    }

    /// Write an `ITEM` node with every non-default attribute
    pub fn serialize_node<W: Write>(
        &self,
        writer: &mut NodeFileWriter<W>,
    ) -> PersistenceResult<()> {
        self.serialize_node_at(writer, 1)
    }

    fn serialize_node_at<W: Write>(
        &self,
        writer: &mut NodeFileWriter<W>,
        depth: usize,
    ) -> PersistenceResult<()> {
        if depth > MAX_CONTAINER_DEPTH {
            return Err(corrupted_data(format!(
                "item {} is nested deeper than {} containers",
                self.id, MAX_CONTAINER_DEPTH
            )));
        }
        writer.add_node(ITEM)?;
        writer.add_u16(self.id)?;
        self.serialize_attributes(writer)?;
        for child in self.contents() {
            child.serialize_node_at(writer, depth + 1)?;
        }
        writer.end_node()
    }

    fn serialize_attributes<W: Write>(
        &self,
        writer: &mut NodeFileWriter<W>,
    ) -> PersistenceResult<()> {
        if self.subtype > 0 {
            writer.add_byte(attr::SUBTYPE)?;
            writer.add_u16(self.subtype)?;
        }
        if self.action_id != 0 {
            writer.add_byte(attr::ACTION_ID)?;
            writer.add_u16(self.action_id)?;
        }
        if self.unique_id != 0 {
            writer.add_byte(attr::UNIQUE_ID)?;
            writer.add_u16(self.unique_id)?;
        }
        if !self.text.is_empty() {
            writer.add_byte(attr::TEXT)?;
            writer.add_string(&self.text)?;
        }
        if !self.description.is_empty() {
            writer.add_byte(attr::DESC)?;
            writer.add_string(&self.description)?;
        }

        match &self.kind {
            ItemKind::Teleport { destination } if *destination != Position::default() => {
                writer.add_byte(attr::TELE_DEST)?;
                writer.add_u16(destination.x)?;
                writer.add_u16(destination.y)?;
                writer.add_u8(destination.z)?;
            }
            ItemKind::Door { door_id } if *door_id != 0 => {
                writer.add_byte(attr::DOOR_ID)?;
                writer.add_u8(*door_id)?;
            }
            ItemKind::Depot { depot_id } if *depot_id != 0 => {
                writer.add_byte(attr::DEPOT_ID)?;
                writer.add_u16(*depot_id)?;
            }
            _ => {}
        }
        Ok(())
    }
}
