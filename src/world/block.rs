use std::fmt;

use crate::constants::core::CHUNK_SIZE;
use crate::world::position::{chunk_to_world, is_inside_chunk, Location};
use crate::world::Material;

/// A single cell of the world grid.
///
/// Blocks are plain values. Changing a cell's material replaces the block in
/// its chunk, so a reader always observes either the old or the new block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    material: Material,
    chunk: Location,
    local_x: i32,
    local_y: i32,
}

impl Block {
    pub fn new(material: Material, chunk: Location, local_x: i32, local_y: i32) -> Self {
        assert!(
            is_inside_chunk(local_x, local_y),
            "Local block coordinate ({}, {}) is outside of chunk bounds [0, {})",
            local_x,
            local_y,
            CHUNK_SIZE
        );
        Self {
            material,
            chunk,
            local_x,
            local_y,
        }
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Location of the owning chunk
    pub fn chunk(&self) -> Location {
        self.chunk
    }

    pub fn local_x(&self) -> i32 {
        self.local_x
    }

    pub fn local_y(&self) -> i32 {
        self.local_y
    }

    pub fn world_x(&self) -> i32 {
        chunk_to_world(self.chunk.x, self.local_x)
    }

    pub fn world_y(&self) -> i32 {
        chunk_to_world(self.chunk.y, self.local_y)
    }

    pub fn location(&self) -> Location {
        Location::new(self.world_x(), self.world_y())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} block at {}", self.material, self.location())
    }
}

/// What a ticking block sees while it is being ticked
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub tick: u64,
    pub ticks_per_second: u32,
    /// World location of the block being ticked
    pub location: Location,
}

/// Work a ticking block asks the world to perform once the chunk is released
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickAction {
    /// Run an explosion search centered on the block
    Explode { origin: Location },
    /// Check whether the block should start falling
    Fall { origin: Location },
    /// The block's appearance changed
    Redraw,
}

/// Tick capability attached to a block.
///
/// Ticks run while the owning chunk is locked, so implementations must not
/// reach back into the world. Anything that touches other cells goes through
/// a [`TickAction`].
pub trait TickingBlock: Send + Sync + fmt::Debug {
    /// Whether this block wants to be ticked at all right now
    fn should_tick(&self) -> bool {
        true
    }

    fn tick(&mut self, ctx: &TickContext, actions: &mut Vec<TickAction>);

    /// A neighboring cell changed
    fn request_update(&mut self) {}

    fn is_glowing(&self) -> bool {
        false
    }
}
