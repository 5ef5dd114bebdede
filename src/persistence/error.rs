//! Persistence-specific error handling
//!
//! Helper constructors, a context extension for decode errors, and the
//! temp-file-and-rename writer used for saves.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::persistence::{PersistenceError, PersistenceResult};

/// Helper trait for persistence-specific error contexts
pub trait PersistenceErrorContext<T> {
    fn persistence_context(self, context: &str) -> PersistenceResult<T>;
}

impl<T> PersistenceErrorContext<T> for PersistenceResult<T> {
    fn persistence_context(self, context: &str) -> PersistenceResult<T> {
        self.map_err(|e| match e {
            PersistenceError::IoError(io) => PersistenceError::IoError(std::io::Error::new(
                io.kind(),
                format!("{}: {}", context, io),
            )),
            PersistenceError::CorruptedData(reason) => {
                PersistenceError::CorruptedData(format!("{}: {}", context, reason))
            }
            PersistenceError::Cancelled | PersistenceError::VersionMismatch { .. } => e,
            other => PersistenceError::CorruptedData(format!("{}: {}", context, other)),
        })
    }
}

impl<T> PersistenceErrorContext<T> for std::io::Result<T> {
    fn persistence_context(self, context: &str) -> PersistenceResult<T> {
        self.map_err(PersistenceError::from).persistence_context(context)
    }
}

/// Create a corrupted data error
pub fn corrupted_data(reason: impl Into<String>) -> PersistenceError {
    PersistenceError::CorruptedData(reason.into())
}

/// Create a version mismatch error
pub fn version_mismatch(expected: u32, found: u32) -> PersistenceError {
    PersistenceError::VersionMismatch { expected, found }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_temp<F, T>(temp_path: &Path, write: F) -> PersistenceResult<T>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> PersistenceResult<T>,
{
    let mut writer = BufWriter::new(fs::File::create(temp_path)?);
    let value = write(&mut writer)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| PersistenceError::IoError(e.into_error()))?
        .sync_all()?;
    Ok(value)
}

/// Write a file through a temporary sibling and rename it into place
///
/// The closure receives a buffered writer. If it fails, the temporary file is
/// removed and the destination is left untouched.
pub fn atomic_write<P, F, T>(path: P, write: F) -> PersistenceResult<T>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<fs::File>) -> PersistenceResult<T>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let result = write_temp(&temp_path, write);

    match result {
        Ok(value) => {
            fs::rename(&temp_path, path)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                log::debug!("Could not remove {}: {}", temp_path.display(), cleanup);
            }
            Err(e)
        }
    }
}
