use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cgmath::{Point2, Vector2, Zero};
use parking_lot::Mutex;

use super::{falling_block, EntityId, EntityKind, EntityState};
use crate::constants::physics::GROUND_EPSILON;
use crate::physics::aabb::{aabb_from_center_half_extents, aabb_intersects, aabb_overlapping_cells, Aabb};
use crate::physics::{filter, BodyHandle, BodyKind, BodyOwner, ContactEvent, ContactKind, Shape};
use crate::world::{Block, World};

/// A subgrid positioned object with a dynamic physics body.
///
/// The body handle and cached position are only touched with the world's
/// physics lock held first.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    width: f32,
    height: f32,
    body: Mutex<Option<BodyHandle>>,
    /// Center of the bounding box as of the last sync with the body
    position: Mutex<Point2<f32>>,
    on_ground: AtomicBool,
    flying: AtomicBool,
    crashed: AtomicBool,
    disposed: AtomicBool,
}

impl Entity {
    /// `(x, y)` is the lower left corner of the bounding box
    pub(crate) fn new(id: EntityId, kind: EntityKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            kind,
            width,
            height,
            body: Mutex::new(None),
            position: Mutex::new(Point2::new(x + width / 2.0, y + height / 2.0)),
            on_ground: AtomicBool::new(false),
            flying: AtomicBool::new(false),
            crashed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Cached center position
    pub fn position(&self) -> Point2<f32> {
        *self.position.lock()
    }

    pub fn bounds(&self) -> Aabb {
        aabb_from_center_half_extents(self.position(), self.half_extents())
    }

    fn half_extents(&self) -> Vector2<f32> {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn body(&self) -> Option<BodyHandle> {
        *self.body.lock()
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground.load(Ordering::Acquire)
    }

    pub fn is_flying(&self) -> bool {
        self.flying.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> EntityState {
        if self.is_disposed() {
            EntityState::Disposed
        } else if self.body().is_none() {
            EntityState::Unvalidated
        } else if self.is_on_ground() {
            EntityState::Grounded
        } else {
            EntityState::Airborne
        }
    }

    /// Create the dynamic body at the cached position
    pub(crate) fn attach_body(&self, world: &World) {
        let mut physics = world.physics().lock();
        let mut body = self.body.lock();
        if body.is_some() || self.is_disposed() {
            return;
        }
        let handle = physics.create_body(BodyKind::Dynamic, BodyOwner::Entity(self.id), self.position());
        let fixture_filter = match self.kind {
            EntityKind::FallingBlock { .. } => filter::FALLING_BLOCK,
            EntityKind::Generic => filter::ENTITY,
        };
        let half = self.half_extents();
        physics.add_fixture(
            handle,
            Shape::Box {
                half_width: half.x,
                half_height: half.y,
            },
            fixture_filter,
        );
        *body = Some(handle);
    }

    /// Solid blocks overlapping the bounding box
    pub fn touching_blocks(&self, world: &World) -> Vec<Block> {
        aabb_overlapping_cells(&self.bounds())
            .map(|(x, y)| world.get_block(x, y))
            .filter(|block| block.material().is_solid())
            .collect()
    }

    /// Other live entities whose bounding boxes overlap this one
    pub fn touching_entities(&self, world: &World) -> Vec<Arc<Entity>> {
        let bounds = self.bounds();
        world
            .entities()
            .into_iter()
            .filter(|other| other.id != self.id && !other.is_disposed())
            .filter(|other| aabb_intersects(&bounds, &other.bounds()))
            .collect()
    }

    /// Switch gravity off (flying) or back on
    pub fn set_flying(&self, world: &World, flying: bool) {
        let mut physics = world.physics().lock();
        self.flying.store(flying, Ordering::Release);
        let Some(handle) = *self.body.lock() else {
            return;
        };
        if let Some(body) = physics.body_mut(handle) {
            body.set_gravity_scale(if flying { 0.0 } else { 1.0 });
            if flying {
                body.set_linear_velocity(Vector2::zero());
            }
        }
    }

    pub fn set_velocity(&self, world: &World, velocity: Vector2<f32>) {
        let mut physics = world.physics().lock();
        if let Some(handle) = *self.body.lock() {
            if let Some(body) = physics.body_mut(handle) {
                body.set_linear_velocity(velocity);
            }
        }
    }

    /// Pull the position from the physics body
    fn sync_position(&self, world: &World) {
        let physics = world.physics().lock();
        if let Some(handle) = *self.body.lock() {
            if let Some(body) = physics.body(handle) {
                *self.position.lock() = body.position();
            }
        }
    }

    /// Per tick update
    pub fn update(&self, world: &World) {
        if self.is_disposed() {
            return;
        }
        self.sync_position(world);
        if let EntityKind::FallingBlock { .. } = self.kind {
            falling_block::check_chunk_loaded(self, world);
        }
    }

    pub fn on_contact(&self, world: &World, event: &ContactEvent) {
        if self.is_disposed() || !event.other_filter.is_ground() {
            return;
        }
        match event.kind {
            ContactKind::Begin => {
                self.sync_position(world);
                let bounds = self.bounds();
                let below_x = self.position().x.floor() as i32;
                let below_y = (bounds.min.y - GROUND_EPSILON).floor() as i32;
                let grounded = !world.is_air(below_x, below_y);
                self.on_ground.store(grounded, Ordering::Release);

                if let EntityKind::FallingBlock { material } = self.kind {
                    falling_block::land(self, world, material);
                }
            }
            ContactKind::End => {
                self.on_ground.store(false, Ordering::Release);
            }
        }
    }

    /// Mark a falling block as crashed. True only for the first caller.
    pub(crate) fn crash(&self) -> bool {
        !self.crashed.swap(true, Ordering::AcqRel)
    }

    /// Destroy the body. Returns false if the entity was already disposed.
    pub fn dispose(&self, world: &World) -> bool {
        let mut physics = world.physics().lock();
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(handle) = self.body.lock().take() {
            physics.destroy_body(handle);
        }
        self.on_ground.store(false, Ordering::Release);
        true
    }
}
