use std::collections::{BTreeMap, HashMap};

use cgmath::{EuclideanSpace, Point2, Vector2, Zero};

use super::aabb::{aabb_expanded, aabb_from_center_half_extents, aabb_intersects, aabb_union, create_aabb, Aabb};
use super::filter::Filter;
use super::{FIXED_TIMESTEP, TERMINAL_VELOCITY};
use crate::constants::physics::{CONTACT_EPSILON, MAX_STEP_DISTANCE};
use crate::entity::EntityId;
use crate::world::Location;

/// Overlap below this is treated as touching, not penetrating
const OVERLAP_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves; terrain
    Static,
    /// Integrated every step and collided against static edges
    Dynamic,
}

/// Who a body belongs to, used to route contact events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyOwner {
    Chunk(Location),
    Entity(EntityId),
}

/// Fixture geometry in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Edge { start: Point2<f32>, end: Point2<f32> },
    Box { half_width: f32, half_height: f32 },
}

impl Shape {
    fn local_bounds(&self) -> Aabb {
        match *self {
            Shape::Edge { start, end } => create_aabb(
                Point2::new(start.x.min(end.x), start.y.min(end.y)),
                Point2::new(start.x.max(end.x), start.y.max(end.y)),
            ),
            Shape::Box {
                half_width,
                half_height,
            } => aabb_from_center_half_extents(Point2::new(0.0, 0.0), Vector2::new(half_width, half_height)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub shape: Shape,
    pub filter: Filter,
}

#[derive(Debug, Clone)]
pub struct Body {
    kind: BodyKind,
    owner: BodyOwner,
    position: Point2<f32>,
    linear_velocity: Vector2<f32>,
    gravity_scale: f32,
    fixtures: Vec<Fixture>,
    local_bounds: Option<Aabb>,
}

impl Body {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn owner(&self) -> BodyOwner {
        self.owner
    }

    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Point2<f32>) {
        self.position = position;
    }

    pub fn linear_velocity(&self) -> Vector2<f32> {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector2<f32>) {
        self.linear_velocity = velocity;
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// World-space bounds of all fixtures
    pub fn bounds(&self) -> Option<Aabb> {
        self.local_bounds.map(|local| Aabb {
            min: local.min + self.position.to_vec(),
            max: local.max + self.position.to_vec(),
        })
    }

    fn collision_box(&self) -> Option<(Vector2<f32>, Filter)> {
        self.fixtures.iter().find_map(|fixture| match fixture.shape {
            Shape::Box {
                half_width,
                half_height,
            } => Some((Vector2::new(half_width, half_height), fixture.filter)),
            Shape::Edge { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Begin,
    End,
}

/// A dynamic body started or stopped touching a static fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub body: BodyHandle,
    pub owner: BodyOwner,
    pub other: BodyHandle,
    pub other_filter: Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContactKey {
    body: BodyHandle,
    other: BodyHandle,
    fixture: usize,
}

#[derive(Debug, Clone, Copy)]
struct ContactInfo {
    owner: BodyOwner,
    other_filter: Filter,
}

/// World-space edge gathered for one step
#[derive(Debug, Clone, Copy)]
struct WorldEdge {
    key_other: BodyHandle,
    fixture: usize,
    start: Point2<f32>,
    end: Point2<f32>,
    filter: Filter,
}

impl WorldEdge {
    fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    fn span(&self) -> (f32, f32) {
        if self.is_horizontal() {
            (self.start.x.min(self.end.x), self.start.x.max(self.end.x))
        } else {
            (self.start.y.min(self.end.y), self.start.y.max(self.end.y))
        }
    }
}

/// Rigid body simulation for chunk terrain and entities.
///
/// Not thread safe on its own. The world keeps it behind a single lock and
/// every structural change (creating or destroying bodies or fixtures) must
/// hold that lock.
pub struct PhysicsSpace {
    gravity: Vector2<f32>,
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
    contacts: HashMap<ContactKey, ContactInfo>,
    pending_events: Vec<ContactEvent>,
    accumulator: f32,
}

impl PhysicsSpace {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity: Vector2::new(0.0, gravity),
            bodies: BTreeMap::new(),
            next_handle: 1,
            contacts: HashMap::new(),
            pending_events: Vec::new(),
            accumulator: 0.0,
        }
    }

    pub fn create_body(&mut self, kind: BodyKind, owner: BodyOwner, position: Point2<f32>) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                kind,
                owner,
                position,
                linear_velocity: Vector2::zero(),
                gravity_scale: 1.0,
                fixtures: Vec::new(),
                local_bounds: None,
            },
        );
        handle
    }

    /// Destroy a body and end every contact it took part in.
    ///
    /// The resulting end events are reported by the next step.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        let ended: Vec<ContactKey> = self
            .contacts
            .keys()
            .filter(|key| key.body == handle || key.other == handle)
            .copied()
            .collect();
        for key in ended {
            if let Some(info) = self.contacts.remove(&key) {
                if key.body != handle {
                    self.pending_events.push(ContactEvent {
                        kind: ContactKind::End,
                        body: key.body,
                        owner: info.owner,
                        other: key.other,
                        other_filter: info.other_filter,
                    });
                }
            }
        }
        true
    }

    pub fn add_fixture(&mut self, handle: BodyHandle, shape: Shape, filter: Filter) -> bool {
        let Some(body) = self.bodies.get_mut(&handle) else {
            return false;
        };
        let bounds = shape.local_bounds();
        body.local_bounds = Some(match body.local_bounds {
            Some(existing) => aabb_union(&existing, &bounds),
            None => bounds,
        });
        body.fixtures.push(Fixture { shape, filter });
        true
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(&handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn fixture_count(&self) -> usize {
        self.bodies.values().map(|body| body.fixtures.len()).sum()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Advance by `delta_time` using fixed steps, returning contact changes
    pub fn update(&mut self, delta_time: f32) -> Vec<ContactEvent> {
        self.accumulator += delta_time;
        let mut events = Vec::new();
        while self.accumulator >= FIXED_TIMESTEP {
            events.extend(self.step(FIXED_TIMESTEP));
            self.accumulator -= FIXED_TIMESTEP;
        }
        events.append(&mut self.pending_events);
        events
    }

    /// Run exactly one simulation step
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        let dynamic: Vec<BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.kind == BodyKind::Dynamic)
            .map(|(handle, _)| *handle)
            .collect();

        let mut touching: HashMap<ContactKey, ContactInfo> = HashMap::new();
        for handle in dynamic {
            self.integrate(handle, dt, &mut touching);
        }

        for (key, info) in &touching {
            if !self.contacts.contains_key(key) {
                events.push(ContactEvent {
                    kind: ContactKind::Begin,
                    body: key.body,
                    owner: info.owner,
                    other: key.other,
                    other_filter: info.other_filter,
                });
            }
        }
        for (key, info) in &self.contacts {
            if !touching.contains_key(key) {
                events.push(ContactEvent {
                    kind: ContactKind::End,
                    body: key.body,
                    owner: info.owner,
                    other: key.other,
                    other_filter: info.other_filter,
                });
            }
        }
        self.contacts = touching;
        events
    }

    fn integrate(&mut self, handle: BodyHandle, dt: f32, touching: &mut HashMap<ContactKey, ContactInfo>) {
        let Some(body) = self.bodies.get(&handle) else {
            return;
        };
        let Some((half, filter)) = body.collision_box() else {
            return;
        };
        let owner = body.owner;
        let mut position = body.position;
        let mut velocity = body.linear_velocity + self.gravity * body.gravity_scale * dt;
        velocity.y = velocity.y.max(TERMINAL_VELOCITY);

        let delta = velocity * dt;
        let start_box = aabb_from_center_half_extents(position, half);
        let swept = aabb_expanded(
            &aabb_union(&start_box, &aabb_from_center_half_extents(position + delta, half)),
            CONTACT_EPSILON * 2.0,
        );
        let edges = self.edges_near(&swept, &filter);

        let sub_steps = (delta.x.abs().max(delta.y.abs()) / MAX_STEP_DISTANCE).ceil().max(1.0) as u32;
        let step = delta / sub_steps as f32;
        for _ in 0..sub_steps {
            if step.x != 0.0 {
                let (x, hit) = move_axis(position.x, position.y, half.x, half.y, step.x, &edges, false);
                position.x = x;
                if hit {
                    velocity.x = 0.0;
                }
            }
            if step.y != 0.0 {
                let (y, hit) = move_axis(position.y, position.x, half.y, half.x, step.y, &edges, true);
                position.y = y;
                if hit {
                    velocity.y = 0.0;
                }
            }
        }

        let resting = aabb_from_center_half_extents(position, half);
        for edge in &edges {
            if is_touching(&resting, edge) {
                touching.insert(
                    ContactKey {
                        body: handle,
                        other: edge.key_other,
                        fixture: edge.fixture,
                    },
                    ContactInfo {
                        owner,
                        other_filter: edge.filter,
                    },
                );
            }
        }

        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
            body.linear_velocity = velocity;
        }
    }

    fn edges_near(&self, area: &Aabb, filter: &Filter) -> Vec<WorldEdge> {
        let mut edges = Vec::new();
        for (handle, body) in &self.bodies {
            if body.kind != BodyKind::Static {
                continue;
            }
            match body.bounds() {
                Some(bounds) if aabb_intersects(&aabb_expanded(&bounds, CONTACT_EPSILON), area) => {}
                _ => continue,
            }
            for (index, fixture) in body.fixtures.iter().enumerate() {
                if let Shape::Edge { start, end } = fixture.shape {
                    if !filter.collides_with(&fixture.filter) {
                        continue;
                    }
                    edges.push(WorldEdge {
                        key_other: *handle,
                        fixture: index,
                        start: start + body.position.to_vec(),
                        end: end + body.position.to_vec(),
                        filter: fixture.filter,
                    });
                }
            }
        }
        edges
    }
}

/// Move a box along one axis, stopping at the first edge perpendicular to it.
///
/// `along` is the box center on the moving axis and `across` the center on the
/// other axis. Returns the new center and whether an edge stopped the motion.
fn move_axis(
    along: f32,
    across: f32,
    half_along: f32,
    half_across: f32,
    delta: f32,
    edges: &[WorldEdge],
    vertical: bool,
) -> (f32, bool) {
    let mut target = along + delta;
    let mut hit = false;
    let across_min = across - half_across;
    let across_max = across + half_across;

    for edge in edges {
        // Only edges perpendicular to the motion can block it
        if edge.is_horizontal() != vertical {
            continue;
        }
        let (span_min, span_max) = edge.span();
        if span_max - across_min <= OVERLAP_EPSILON || across_max - span_min <= OVERLAP_EPSILON {
            continue;
        }
        let line = if vertical { edge.start.y } else { edge.start.x };
        if delta > 0.0 {
            let front = along + half_along;
            if front <= line + OVERLAP_EPSILON && target + half_along > line {
                target = line - half_along;
                hit = true;
            }
        } else {
            let front = along - half_along;
            if front >= line - OVERLAP_EPSILON && target - half_along < line {
                target = line + half_along;
                hit = true;
            }
        }
    }
    (target, hit)
}

fn is_touching(aabb: &Aabb, edge: &WorldEdge) -> bool {
    let (span_min, span_max) = edge.span();
    if edge.is_horizontal() {
        let overlap = aabb.max.x.min(span_max) - aabb.min.x.max(span_min);
        let y = edge.start.y;
        overlap > OVERLAP_EPSILON
            && ((aabb.min.y - y).abs() <= CONTACT_EPSILON || (aabb.max.y - y).abs() <= CONTACT_EPSILON)
    } else {
        let overlap = aabb.max.y.min(span_max) - aabb.min.y.max(span_min);
        let x = edge.start.x;
        overlap > OVERLAP_EPSILON
            && ((aabb.min.x - x).abs() <= CONTACT_EPSILON || (aabb.max.x - x).abs() <= CONTACT_EPSILON)
    }
}
