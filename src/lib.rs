//! Runtime core of a chunked 2D block world.
//!
//! The [`World`] keeps a concurrent registry of 32x32 [`Chunk`]s that are
//! generated on first request, ticked at a fixed rate and evicted when nobody
//! asks for them. Each chunk derives a minimal set of collision edges for the
//! [`physics`] space, rebuilt in the background whenever its blocks or its
//! neighbors change.

pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod persistence;
pub mod physics;
pub mod thread_pool;
pub mod time;
pub mod world;

pub use config::WorldConfig;
pub use entity::{Entity, EntityId, EntityKind, EntityState};
pub use error::{EngineError, EngineResult};
pub use persistence::{ChunkStore, FileChunkStore, NoopChunkStore, PersistenceError, SavedChunk};
pub use time::Ticker;
pub use world::{
    Block, Chunk, ChunkGenerator, Direction, EmptyGenerator, FlatGenerator, Location, Material, World, WorldId,
};
