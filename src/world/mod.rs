//! The block grid.
//!
//! - **position**: `Location`, `Direction` and chunk/world coordinate math
//! - **material** / **block**: cell values and the tick capability
//! - **blocks**: behaviors for TNT, sand and torches
//! - **chunk**: fixed size squares of blocks with their collision mesh
//! - **generation**: pluggable chunk generators
//! - **world**: the concurrent chunk registry driving everything

pub mod block;
pub mod blocks;
pub mod chunk;
pub mod explosion;
pub mod generation;
pub mod material;
pub mod position;
mod world;

pub use block::{Block, TickAction, TickContext, TickingBlock};
pub use blocks::{LightSource, SandBlock, TntBlock};
pub use chunk::Chunk;
pub use generation::{ChunkGenerator, EmptyGenerator, FlatGenerator};
pub use material::Material;
pub use position::{Direction, Location};
pub use world::{World, WorldId};
