//! Collision edges for chunks.
//!
//! A chunk's solid cells are turned into unit edge segments along every
//! solid/non-solid border. Computing the edges only needs the chunk and its
//! cardinal neighbors; swapping the old body for the new one happens under the
//! world's physics lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point2;
use parking_lot::Mutex;

use super::filter;
use super::space::{BodyHandle, BodyKind, BodyOwner, PhysicsSpace, Shape};
use crate::constants::core::CHUNK_SIZE;
use crate::world::position::{chunk_offset, is_inside_chunk, Direction};
use crate::world::{Chunk, World};

/// A unit edge in chunk-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point2<f32>,
    pub end: Point2<f32>,
    /// Emitted by a block light passes through
    pub transparent: bool,
}

impl Edge {
    /// Edge on the `direction` side of the cell at `(local_x, local_y)`
    pub fn for_side(local_x: i32, local_y: i32, direction: Direction, transparent: bool) -> Self {
        let (sx, sy, ex, ey) = match direction {
            Direction::North => (0, 1, 1, 1),
            Direction::East => (1, 0, 1, 1),
            Direction::South => (0, 0, 1, 0),
            Direction::West => (0, 0, 0, 1),
            _ => unreachable!("edges only exist on cardinal sides"),
        };
        Self {
            start: Point2::new((local_x + sx) as f32, (local_y + sy) as f32),
            end: Point2::new((local_x + ex) as f32, (local_y + ey) as f32),
            transparent,
        }
    }
}

/// Result of an edge computation, not yet committed to the physics space
#[derive(Debug, Default)]
pub struct EdgeMesh {
    pub edges: Vec<Edge>,
    pub solid_cells: usize,
    /// Some edge was skipped because the neighboring chunk is not resident
    pub potentially_dirty: bool,
}

/// Compute the boundary edges of `chunk`.
///
/// `neighbor` resolves the resident, loaded chunk in a cardinal direction.
/// Rim overrides: the top row always gets north edges and the outer columns
/// always get their outward edges, so the world never has gaps at a seam.
pub fn compute_edges<F>(chunk: &Chunk, neighbor: F) -> EdgeMesh
where
    F: Fn(Direction) -> Option<Arc<Chunk>>,
{
    let materials = chunk.materials();
    let mut neighbors: [Option<Option<Arc<Chunk>>>; 4] = Default::default();
    let mut mesh = EdgeMesh::default();

    for local_y in 0..CHUNK_SIZE {
        for local_x in 0..CHUNK_SIZE {
            let material = materials[(local_y * CHUNK_SIZE + local_x) as usize];
            if !material.is_solid() {
                continue;
            }
            mesh.solid_cells += 1;

            for (side, direction) in Direction::CARDINAL.iter().enumerate() {
                let (dx, dy) = direction.offset();
                let (nx, ny) = (local_x + dx, local_y + dy);
                let related = if is_inside_chunk(nx, ny) {
                    materials[(ny * CHUNK_SIZE + nx) as usize]
                } else {
                    let resolved = neighbors[side].get_or_insert_with(|| neighbor(*direction));
                    match resolved {
                        Some(other) => other.material(chunk_offset(nx), chunk_offset(ny)),
                        None => {
                            mesh.potentially_dirty = true;
                            continue;
                        }
                    }
                };

                let on_rim = match direction {
                    Direction::North => local_y == CHUNK_SIZE - 1,
                    Direction::East => local_x == CHUNK_SIZE - 1,
                    Direction::West => local_x == 0,
                    _ => false,
                };
                if !related.is_solid() || on_rim {
                    mesh.edges
                        .push(Edge::for_side(local_x, local_y, *direction, !material.blocks_light()));
                }
            }
        }
    }
    mesh
}

#[derive(Debug, Default)]
struct BodyState {
    handle: Option<BodyHandle>,
    edges: Vec<Edge>,
    committed_version: Option<u64>,
}

/// The collision mesh a chunk owns
#[derive(Debug, Default)]
pub struct ChunkBody {
    state: Mutex<BodyState>,
    /// Held from edge computation through commit. Taken before the physics lock.
    rebuilding: Mutex<()>,
    retry_pending: AtomicBool,
}

impl ChunkBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.state.lock().handle
    }

    pub fn has_body(&self) -> bool {
        self.handle().is_some()
    }

    /// Edges of the last committed mesh
    pub fn edges(&self) -> Vec<Edge> {
        self.state.lock().edges.clone()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().edges.len()
    }

    /// Whether a deferred reload is waiting for missing neighbors
    pub fn has_pending_retry(&self) -> bool {
        self.retry_pending.load(Ordering::Acquire)
    }

    /// Destroy the body. Requires the physics lock, hence the space argument.
    pub(crate) fn dispose(&self, physics: &mut PhysicsSpace) -> bool {
        let mut state = self.state.lock();
        state.edges.clear();
        match state.handle.take() {
            Some(handle) => physics.destroy_body(handle),
            None => false,
        }
    }
}

/// Rebuild a chunk's collision mesh.
///
/// `lights_only` just refreshes the chunk's static lights. With
/// `recalculate_neighbors` every resident neighbor gets an asynchronous
/// refresh afterwards: cardinal neighbors rebuild their edges, diagonal ones
/// only their lights.
pub fn rebuild(world: &World, chunk: &Arc<Chunk>, recalculate_neighbors: bool, lights_only: bool) {
    if !chunk.is_loaded() {
        log::trace!("[chunk_body::rebuild] Skipping unloaded chunk {}", chunk.location());
        return;
    }
    if lights_only {
        let _physics = world.physics().lock();
        chunk.update_lights();
        return;
    }

    // Rebuilds of one chunk run one at a time, so a mesh computed against
    // older neighbor cells can never commit over a newer one
    let _rebuilding = chunk.body().rebuilding.lock();
    let location = chunk.location();
    let version = chunk.version();
    let mesh = compute_edges(chunk, |direction| world.resident_chunk(location.relative(direction)));

    {
        let mut physics = world.physics().lock();
        if !chunk.is_loaded() {
            return;
        }
        let mut state = chunk.body().state.lock();
        if matches!(state.committed_version, Some(committed) if committed > version) {
            log::trace!("[chunk_body::rebuild] Dropping stale mesh for chunk {}", location);
            return;
        }

        if let Some(handle) = state.handle.take() {
            physics.destroy_body(handle);
        }
        if mesh.solid_cells > 0 {
            let origin = location.chunk_origin();
            let handle = physics.create_body(
                BodyKind::Static,
                BodyOwner::Chunk(location),
                Point2::new(origin.x as f32, origin.y as f32),
            );
            for edge in &mesh.edges {
                let fixture_filter = if edge.transparent {
                    filter::SOLID_TRANSPARENT
                } else {
                    filter::SOLID_OPAQUE
                };
                physics.add_fixture(
                    handle,
                    Shape::Edge {
                        start: edge.start,
                        end: edge.end,
                    },
                    fixture_filter,
                );
            }
            state.handle = Some(handle);
        }
        log::trace!(
            "[chunk_body::rebuild] Chunk {} committed {} edges",
            location,
            mesh.edges.len()
        );
        state.edges = mesh.edges;
        state.committed_version = Some(version);
        drop(state);

        chunk.mark_texture_dirty();
        if recalculate_neighbors {
            for direction in Direction::ALL {
                if let Some(neighbor) = world.resident_chunk(location.relative(direction)) {
                    let lights_only = !direction.is_cardinal();
                    world.execute_async(move |world| rebuild(world, &neighbor, false, lights_only));
                }
            }
        }
        chunk.update_lights();
    }

    if mesh.potentially_dirty {
        schedule_fixture_reload(world, chunk, true);
    }
}

/// Retry a rebuild once the chunk's cardinal neighbors are resident.
///
/// At most one reload per chunk is outstanding at a time.
fn schedule_fixture_reload(world: &World, chunk: &Arc<Chunk>, initial: bool) {
    if chunk.body().retry_pending.swap(true, Ordering::AcqRel) {
        return;
    }
    let delay = if initial {
        world.config().initial_reload_delay_ms
    } else {
        world.config().reload_delay_ms
    };
    let chunk = Arc::clone(chunk);
    world.schedule_async(Duration::from_millis(delay), move |world| {
        chunk.body().retry_pending.store(false, Ordering::Release);
        if !chunk.is_loaded() {
            log::trace!(
                "[chunk_body::schedule_fixture_reload] Chunk {} unloaded, dropping reload",
                chunk.location()
            );
            return;
        }
        if world.are_cardinal_neighbors_resident(chunk.location()) {
            rebuild(world, &chunk, false, false);
        } else {
            schedule_fixture_reload(world, &chunk, false);
        }
    });
}
