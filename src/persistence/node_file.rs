//! Escaped binary node tree
//!
//! A file is one marker byte followed by a root node. Every node is
//! `NODE_START payload children* NODE_END`, where reserved payload bytes are
//! prefixed with `ESCAPE`. The first payload byte is the node tag.
//!
//! Reading is lazy: a [`BinaryNode`] is addressed by the offset of its start
//! marker in the raw buffer, and only its own payload is unescaped. Children
//! and siblings are found by scanning forward.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::persistence::format::{FILE_MARKER, NODE_END, NODE_START};
use crate::persistence::stream::{scan_payload, skip_subtree, unescape, ByteCursor, EscapeWriter};
use crate::persistence::{corrupted_data, PersistenceError, PersistenceResult};
use crate::world::Position;

/// Read side over a whole file held in memory
#[derive(Debug, Clone, Copy)]
pub struct NodeFileReader<'a> {
    data: &'a [u8],
}

impl<'a> NodeFileReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total size in bytes, for progress reporting
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Parse the node that follows the file marker byte
    pub fn root_node(&self) -> PersistenceResult<BinaryNode<'a>> {
        if self.data.len() < 2 {
            return Err(PersistenceError::MalformedNode {
                offset: 0,
                reason: "file too short",
            });
        }
        BinaryNode::parse(self.data, 1)
    }
}

/// One node of the tree, readable as a cursor over its payload
#[derive(Debug, Clone)]
pub struct BinaryNode<'a> {
    data: &'a [u8],
    offset: usize,
    payload_end: usize,
    cursor: ByteCursor,
}

impl<'a> BinaryNode<'a> {
    fn parse(data: &'a [u8], offset: usize) -> PersistenceResult<Self> {
        if data.get(offset) != Some(&NODE_START) {
            return Err(PersistenceError::MalformedNode {
                offset,
                reason: "expected node start",
            });
        }
        let payload_end = scan_payload(data, offset + 1)?;
        let payload = unescape(&data[offset + 1..payload_end]).map_err(|e| match e {
            PersistenceError::MalformedNode { offset: rel, reason } => {
                PersistenceError::MalformedNode {
                    offset: offset + 1 + rel,
                    reason,
                }
            }
            other => other,
        })?;
        Ok(Self {
            data,
            offset,
            payload_end,
            cursor: ByteCursor::new(payload),
        })
    }

    /// Offset of this node's start marker in the file
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Tag byte, without moving the cursor
    pub fn tag(&self) -> Option<u8> {
        self.cursor.as_slice().first().copied()
    }

    pub fn first_child(&self) -> PersistenceResult<Option<BinaryNode<'a>>> {
        match self.data.get(self.payload_end) {
            Some(&NODE_START) => BinaryNode::parse(self.data, self.payload_end).map(Some),
            _ => Ok(None),
        }
    }

    pub fn next_sibling(&self) -> PersistenceResult<Option<BinaryNode<'a>>> {
        let end = skip_subtree(self.data, self.offset)?;
        match self.data.get(end) {
            None | Some(&NODE_END) => Ok(None),
            Some(&NODE_START) => BinaryNode::parse(self.data, end).map(Some),
            Some(_) => Err(PersistenceError::MalformedNode {
                offset: end,
                reason: "stray bytes between nodes",
            }),
        }
    }

    /// Move to the next sibling, returns false when there is none
    pub fn advance(&mut self) -> PersistenceResult<bool> {
        match self.next_sibling()? {
            Some(next) => {
                *self = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Iterate the children, stopping after the first structural error
    pub fn children(&self) -> Children<'a> {
        Children {
            next: self.first_child().transpose(),
        }
    }

    pub fn get_u8(&mut self) -> PersistenceResult<u8> {
        self.cursor.get_u8()
    }

    pub fn get_u16(&mut self) -> PersistenceResult<u16> {
        self.cursor.get_u16()
    }

    pub fn get_u32(&mut self) -> PersistenceResult<u32> {
        self.cursor.get_u32()
    }

    pub fn get_string(&mut self) -> PersistenceResult<String> {
        self.cursor.get_string()
    }

    /// `u16` x, `u16` y, `u8` floor
    pub fn get_position(&mut self) -> PersistenceResult<Position> {
        let x = self.get_u16()?;
        let y = self.get_u16()?;
        let z = self.get_u8()?;
        Ok(Position::new(x, y, z))
    }

    pub fn skip(&mut self, n: usize) -> PersistenceResult<()> {
        self.cursor.skip(n)
    }

    /// Unread payload bytes
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }
}

pub struct Children<'a> {
    next: Option<PersistenceResult<BinaryNode<'a>>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = PersistenceResult<BinaryNode<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if let Ok(node) = &current {
            self.next = node.next_sibling().transpose();
        }
        Some(current)
    }
}

/// Largest string a `u16` length prefix can describe
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Depth-first node writer
pub struct NodeFileWriter<W: Write> {
    out: EscapeWriter<W>,
    open: Vec<u8>,
}

impl<W: Write> NodeFileWriter<W> {
    /// Start a file, writing the marker byte
    pub fn new(inner: W) -> PersistenceResult<Self> {
        let mut out = EscapeWriter::new(inner);
        out.write_raw(&[FILE_MARKER])?;
        Ok(Self {
            out,
            open: Vec::new(),
        })
    }

    pub fn add_node(&mut self, tag: u8) -> PersistenceResult<()> {
        self.out.write_raw(&[NODE_START])?;
        self.out.write_u8(tag)?;
        self.open.push(tag);
        Ok(())
    }

    pub fn end_node(&mut self) -> PersistenceResult<()> {
        if self.open.pop().is_none() {
            return Err(corrupted_data("end_node called with no open node"));
        }
        self.out.write_raw(&[NODE_END])?;
        Ok(())
    }

    pub fn add_u8(&mut self, value: u8) -> PersistenceResult<()> {
        self.out.write_u8(value)?;
        Ok(())
    }

    /// Same as [`add_u8`](Self::add_u8), reads better for attribute tags
    pub fn add_byte(&mut self, value: u8) -> PersistenceResult<()> {
        self.add_u8(value)
    }

    pub fn add_u16(&mut self, value: u16) -> PersistenceResult<()> {
        self.out.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn add_u32(&mut self, value: u32) -> PersistenceResult<()> {
        self.out.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Position with the floor masked to its stored width
    pub fn add_position(&mut self, pos: Position) -> PersistenceResult<()> {
        self.add_u16(pos.x)?;
        self.add_u16(pos.y)?;
        self.add_u8(pos.stored_floor())
    }

    /// `u16` length followed by the bytes, truncated on a char boundary
    pub fn add_string(&mut self, value: &str) -> PersistenceResult<()> {
        let mut end = value.len();
        if end > MAX_STRING_LEN {
            end = MAX_STRING_LEN;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            log::warn!(
                "Truncating {} byte string to {} bytes",
                value.len(),
                end
            );
        }
        let bytes = &value.as_bytes()[..end];
        self.add_u16(bytes.len() as u16)?;
        self.out.write_all(bytes)?;
        Ok(())
    }

    /// Nodes currently open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn bytes_written(&self) -> u64 {
        self.out.bytes_written()
    }

    /// Flush and return the inner writer; every node must be closed
    pub fn finish(mut self) -> PersistenceResult<W> {
        if !self.open.is_empty() {
            return Err(corrupted_data(format!(
                "{} node(s) left open",
                self.open.len()
            )));
        }
        self.out.flush()?;
        Ok(self.out.into_inner())
    }
}
