use std::io::Write;

use crate::item::ItemCatalog;
use crate::persistence::format::node;
use crate::persistence::{
    corrupted_data, version_mismatch, BinaryNode, NodeFileReader, NodeFileWriter,
    PersistenceResult,
};
use crate::world::Map;

/// Current OTMM format version
pub const OTMM_VERSION: u32 = 1;

/// Payload of the root node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtmmHeader {
    pub version: u32,
    pub width: u16,
    pub height: u16,
    /// Item catalog version the map was saved against, if the file says
    pub catalog_major: Option<u32>,
    pub catalog_minor: Option<u32>,
}

impl OtmmHeader {
    /// Header describing `map` saved against `catalog`
    pub fn for_map(map: &Map, catalog: &dyn ItemCatalog) -> Self {
        Self {
            version: OTMM_VERSION,
            width: map.width,
            height: map.height,
            catalog_major: Some(catalog.major_version()),
            catalog_minor: Some(catalog.minor_version()),
        }
    }

    /// Read the root payload, the tag byte already consumed
    ///
    /// A wrong version or missing dimensions are errors. Missing catalog
    /// versions are not; the caller decides what to do about them.
    pub fn read(root: &mut BinaryNode<'_>) -> PersistenceResult<Self> {
        let version = root
            .get_u32()
            .map_err(|_| corrupted_data("could not read map version"))?;
        if version != OTMM_VERSION {
            return Err(version_mismatch(OTMM_VERSION, version));
        }

        let (width, height) = match (root.get_u16(), root.get_u16()) {
            (Ok(width), Ok(height)) => (width, height),
            _ => return Err(corrupted_data("could not read root header")),
        };
        let catalog_major = root.get_u32().ok();
        let catalog_minor = catalog_major.and_then(|_| root.get_u32().ok());

        Ok(Self {
            version,
            width,
            height,
            catalog_major,
            catalog_minor,
        })
    }

    /// Open the root node and write the header payload
    pub fn write_root<W: Write>(&self, writer: &mut NodeFileWriter<W>) -> PersistenceResult<()> {
        writer.add_node(node::ROOT)?;
        writer.add_u32(self.version)?;
        writer.add_u16(self.width)?;
        writer.add_u16(self.height)?;
        writer.add_u32(self.catalog_major.unwrap_or_default())?;
        writer.add_u32(self.catalog_minor.unwrap_or_default())?;
        Ok(())
    }

    /// Major catalog version present and not newer than the local catalog
    pub fn major_supported(&self, catalog: &dyn ItemCatalog) -> bool {
        self.catalog_major
            .is_some_and(|major| major <= catalog.major_version())
    }

    /// Minor catalog version present and not newer than the local catalog
    pub fn minor_supported(&self, catalog: &dyn ItemCatalog) -> bool {
        self.catalog_minor
            .is_some_and(|minor| minor <= catalog.minor_version())
    }
}

/// Catalog minor version a v1 file was saved against, without loading it
pub fn probe_header(data: &[u8]) -> Option<u32> {
    let mut root = NodeFileReader::new(data).root_node().ok()?;
    root.skip(1).ok()?;
    let header = OtmmHeader::read(&mut root).ok()?;
    header.catalog_minor
}
