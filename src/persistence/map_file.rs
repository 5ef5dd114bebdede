//! Path-based front-ends for the OTMM codec

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::persistence::{
    atomic_write, probe_header, LoadReport, OtmmLoader, OtmmSaver, PersistenceErrorContext,
    PersistenceResult, SaveReport,
};
use crate::world::Map;

/// Map a file read-only; empty files are returned as `None`
fn map_file(path: &Path) -> PersistenceResult<Option<Mmap>> {
    let file = File::open(path).persistence_context(&format!("could not open {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // SAFETY: The mapping is read-only and lives only for the duration of
    // one decode. The file is not modified through this process while it is
    // mapped.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

/// Load a map file through a memory map
pub fn load_map_file<P: AsRef<Path>>(
    loader: &mut OtmmLoader<'_>,
    map: &mut Map,
    path: P,
) -> PersistenceResult<LoadReport> {
    let path = path.as_ref();
    log::info!("Loading map from {}", path.display());
    match map_file(path)? {
        Some(mmap) => loader.load(map, &mmap),
        None => loader.load(map, &[]),
    }
}

/// Save a map file through a temporary file and rename
///
/// On any error the destination is left as it was.
pub fn save_map_file<P: AsRef<Path>>(
    saver: &mut OtmmSaver<'_>,
    map: &Map,
    path: P,
) -> PersistenceResult<SaveReport> {
    let path = path.as_ref();
    log::info!("Saving map to {}", path.display());
    atomic_write(path, |writer| saver.save(map, writer))
}

/// Catalog minor version stored in a map file's header
pub fn probe_map_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Option<u32>> {
    Ok(map_file(path.as_ref())?.and_then(|mmap| probe_header(&mmap)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapIoConfig;
    use crate::creature::CreatureDatabase;
    use crate::item::{Item, ItemRegistry, ItemType};
    use crate::persistence::PersistenceError;
    use crate::world::Position;
    use tempfile::TempDir;

    fn catalog() -> ItemRegistry {
        let mut registry = ItemRegistry::new(3, 57);
        registry.register(ItemType::new(100, "grass").ground());
        registry
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("maps").join("island.otmm");
        let catalog = catalog();
        let config = MapIoConfig::default();

        let mut map = Map::new(128, 128);
        map.description = "Island".to_string();
        map.get_or_create_tile(Position::new(3, 4, 7))
            .add_item(Item::plain(100), &catalog);

        let mut saver = OtmmSaver::new(&catalog, &config);
        save_map_file(&mut saver, &map, &path).expect("save");
        assert_eq!(probe_map_file(&path).expect("probe"), Some(57));

        let mut monsters = CreatureDatabase::new();
        let mut npcs = CreatureDatabase::new();
        let mut loader = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config);
        let mut loaded = Map::default();
        let report = load_map_file(&mut loader, &mut loaded, &path).expect("load");
        assert_eq!(report.tiles, 1);
        assert_eq!(loaded.description, "Island");
        assert_eq!(loaded.width, 128);
    }

    #[test]
    fn test_empty_and_missing_files() {
        let dir = TempDir::new().expect("temp dir");
        let empty = dir.path().join("empty.otmm");
        std::fs::write(&empty, b"").expect("create empty file");
        assert_eq!(probe_map_file(&empty).expect("probe"), None);

        let catalog = catalog();
        let config = MapIoConfig::default();
        let mut monsters = CreatureDatabase::new();
        let mut npcs = CreatureDatabase::new();
        let mut loader = OtmmLoader::new(&catalog, &mut monsters, &mut npcs, &config);
        let mut map = Map::default();
        assert!(matches!(
            load_map_file(&mut loader, &mut map, &empty),
            Err(PersistenceError::MalformedNode { .. })
        ));
        assert!(matches!(
            load_map_file(&mut loader, &mut map, dir.path().join("missing.otmm")),
            Err(PersistenceError::IoError(_))
        ));
    }
}
