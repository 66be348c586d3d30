pub mod aabb;
pub mod chunk_body;
pub mod filter;
pub mod space;

pub use aabb::Aabb;
pub use chunk_body::{ChunkBody, Edge, EdgeMesh};
pub use filter::Filter;
pub use space::{Body, BodyHandle, BodyKind, BodyOwner, ContactEvent, ContactKind, Fixture, PhysicsSpace, Shape};

pub const TERMINAL_VELOCITY: f32 = -50.0;
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
