//! Persistence system for loading and saving OTMM map files

pub mod error;
pub mod format;
pub mod hooks;
pub mod item_codec;
pub mod map_file;
pub mod map_loader;
pub mod map_saver;
pub mod metadata;
pub mod node_file;
pub mod stream;

pub use error::{atomic_write, corrupted_data, version_mismatch, PersistenceErrorContext};
pub use hooks::{AlwaysAccept, AlwaysDecline, LogProgress, NoProgress, ProgressSink, UserPrompt};
pub use map_file::{load_map_file, probe_map_file, save_map_file};
pub use map_loader::{LoadReport, OtmmLoader};
pub use map_saver::{OtmmSaver, SaveReport};
pub use metadata::{probe_header, OtmmHeader, OTMM_VERSION};
pub use node_file::{BinaryNode, NodeFileReader, NodeFileWriter};
pub use stream::ByteCursor;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur while reading or writing a map
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    #[error("Unexpected end of node payload")]
    UnexpectedEof,

    #[error("Malformed node at offset {offset}: {reason}")]
    MalformedNode { offset: usize, reason: &'static str },

    #[error("Unknown item attribute {0}")]
    UnknownAttribute(u8),

    #[error("Unknown item id {0}")]
    UnknownItem(u16),

    #[error("Load rejected: {0}")]
    Rejected(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}
