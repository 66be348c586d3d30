//! Dynamic objects living on top of the block grid.
//!
//! An entity is validated against the terrain and other entities before it
//! gets a physics body. Falling blocks are entities that turn back into a
//! block on their first ground contact.

mod entity;
mod falling_block;

pub use entity::Entity;

use std::fmt;

use crate::world::Material;

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Generic,
    /// A block dropped out of the grid, placed back when it lands
    FallingBlock { material: Material },
}

/// Lifecycle of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Created, spawn position not yet checked
    Unvalidated,
    Grounded,
    Airborne,
    Disposed,
}
