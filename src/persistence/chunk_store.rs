use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::core::BLOCKS_PER_CHUNK;
use crate::persistence::{PersistenceError, PersistenceResult};
use crate::world::{Chunk, Location, Material};

/// Version of the chunk format
pub const CHUNK_FORMAT_VERSION: u32 = 1;

/// Magic bytes to identify chunk files
const CHUNK_MAGIC: [u8; 4] = *b"FLCK";

/// Snapshot of a chunk's blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedChunk {
    magic: [u8; 4],
    version: u32,
    pub location: Location,
    /// Indexed by `y * CHUNK_SIZE + x`
    pub materials: Vec<Material>,
}

impl SavedChunk {
    pub fn new(location: Location, materials: Vec<Material>) -> Self {
        Self {
            magic: CHUNK_MAGIC,
            version: CHUNK_FORMAT_VERSION,
            location,
            materials,
        }
    }

    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self::new(chunk.location(), chunk.materials())
    }

    pub fn to_bytes(&self) -> PersistenceResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> PersistenceResult<Self> {
        let saved: SavedChunk = bincode::deserialize(data)?;
        saved.validate()?;
        Ok(saved)
    }

    fn validate(&self) -> PersistenceResult<()> {
        if self.magic != CHUNK_MAGIC {
            return Err(PersistenceError::CorruptedData("Invalid chunk magic".to_string()));
        }
        if self.version != CHUNK_FORMAT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: CHUNK_FORMAT_VERSION,
                found: self.version,
            });
        }
        if self.materials.len() != BLOCKS_PER_CHUNK {
            return Err(PersistenceError::CorruptedData(format!(
                "Chunk {} has {} blocks, expected {}",
                self.location,
                self.materials.len(),
                BLOCKS_PER_CHUNK
            )));
        }
        Ok(())
    }
}

/// Loader/saver capability used by the world
pub trait ChunkStore: Send + Sync {
    /// Saved data for a chunk, `None` if it was never saved
    fn load(&self, location: Location) -> PersistenceResult<Option<SavedChunk>>;

    fn save(&self, chunk: &SavedChunk) -> PersistenceResult<()>;
}

/// Keeps saved chunks in memory for the lifetime of the store
#[derive(Debug, Default)]
pub struct NoopChunkStore {
    saved: Mutex<HashMap<Location, SavedChunk>>,
}

impl NoopChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().len()
    }
}

impl ChunkStore for NoopChunkStore {
    fn load(&self, location: Location) -> PersistenceResult<Option<SavedChunk>> {
        Ok(self.saved.lock().get(&location).cloned())
    }

    fn save(&self, chunk: &SavedChunk) -> PersistenceResult<()> {
        self.saved.lock().insert(chunk.location, chunk.clone());
        Ok(())
    }
}

/// One bincode file per chunk in a directory
#[derive(Debug)]
pub struct FileChunkStore {
    directory: PathBuf,
}

impl FileChunkStore {
    pub fn new(directory: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        log::info!("[FileChunkStore::new] Saving chunks to {}", directory.display());
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn chunk_path(&self, location: Location) -> PathBuf {
        self.directory
            .join(format!("chunk_{}_{}.bin", location.x, location.y))
    }
}

impl ChunkStore for FileChunkStore {
    fn load(&self, location: Location) -> PersistenceResult<Option<SavedChunk>> {
        let path = self.chunk_path(location);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;
        let saved = SavedChunk::from_bytes(&data)?;
        if saved.location != location {
            return Err(PersistenceError::CorruptedData(format!(
                "{} holds chunk {}, expected {}",
                path.display(),
                saved.location,
                location
            )));
        }
        Ok(Some(saved))
    }

    fn save(&self, chunk: &SavedChunk) -> PersistenceResult<()> {
        let path = self.chunk_path(chunk.location);
        let temp_path = path.with_extension("tmp");
        let data = chunk.to_bytes()?;
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SavedChunk {
        let chunk = Chunk::new(Location::new(-2, 5));
        chunk.set_block(1, 2, Material::Stone, false);
        chunk.set_block(31, 0, Material::Tnt, false);
        SavedChunk::from_chunk(&chunk)
    }

    #[test]
    fn test_file_store_saves_and_loads() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileChunkStore::new(temp_dir.path().join("chunks")).expect("store created");

        assert!(store.load(Location::new(-2, 5)).expect("load works").is_none());
        let saved = sample();
        store.save(&saved).expect("save works");
        let loaded = store
            .load(Location::new(-2, 5))
            .expect("load works")
            .expect("chunk was saved");
        assert_eq!(loaded, saved);
        assert!(!temp_dir.path().join("chunks").join("chunk_-2_5.tmp").exists());
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileChunkStore::new(temp_dir.path()).expect("store created");
        fs::write(temp_dir.path().join("chunk_0_0.bin"), [1u8, 2, 3]).expect("write works");
        assert!(store.load(Location::ORIGIN).is_err());
    }

    #[test]
    fn test_wrong_block_count_is_corrupted() {
        let mut saved = sample();
        saved.materials.truncate(10);
        let bytes = saved.to_bytes().expect("serializes");
        assert!(matches!(
            SavedChunk::from_bytes(&bytes),
            Err(PersistenceError::CorruptedData(_))
        ));
    }

    #[test]
    fn test_noop_store_keeps_latest_save() {
        let store = NoopChunkStore::new();
        let mut saved = sample();
        store.save(&saved).expect("save works");
        saved.materials[0] = Material::Brick;
        store.save(&saved).expect("save works");
        assert_eq!(store.saved_count(), 1);
        let loaded = store.load(saved.location).expect("load works").expect("saved");
        assert_eq!(loaded.materials[0], Material::Brick);
    }
}
