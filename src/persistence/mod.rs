//! Chunk persistence.
//!
//! The world hands chunks to a [`ChunkStore`] when they are evicted and asks
//! it for saved data before generating a chunk. Failures never stop the
//! world; they are logged and treated as "no saved data".

pub mod chunk_store;

pub use chunk_store::{ChunkStore, FileChunkStore, NoopChunkStore, SavedChunk, CHUNK_FORMAT_VERSION};

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur during persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

impl From<bincode::Error> for PersistenceError {
    fn from(err: bincode::Error) -> Self {
        PersistenceError::SerializationError(err.to_string())
    }
}
