use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::config::WorldConfig;
use crate::constants::explosion::EXPLOSION_STRENGTH;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{EngineError, EngineResult};
use crate::persistence::{ChunkStore, FileChunkStore, NoopChunkStore, SavedChunk};
use crate::physics::{chunk_body, BodyOwner, PhysicsSpace};
use crate::thread_pool::{MainThreadQueue, Scheduler, SchedulerStats};
use crate::time::Ticker;
use crate::world::block::TickAction;
use crate::world::explosion;
use crate::world::generation::ChunkGenerator;
use crate::world::position::{chunk_offset, Direction};
use crate::world::{Block, Chunk, Location, Material};

/// Size of a falling block, a bit under one cell so it fits its own cell
const FALLING_BLOCK_SIZE: f32 = 0.9;

/// Random identity of a world instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(pub u128);

impl WorldId {
    pub fn random() -> Self {
        WorldId(rand::random())
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// The chunk registry and everything that runs on top of it.
///
/// A world is always handled through an `Arc`. The tick thread, worker tasks
/// and the main thread all share it; background work holds only a weak
/// reference and stops once the world is gone or disposed.
///
/// Lock order: the physics lock comes first, any chunk or entity lock second.
pub struct World {
    id: WorldId,
    config: WorldConfig,
    chunks: DashMap<Location, Arc<Chunk>>,
    generator: Arc<dyn ChunkGenerator>,
    store: Arc<dyn ChunkStore>,
    ticker: Ticker,
    entities: DashMap<EntityId, Arc<Entity>>,
    next_entity_id: AtomicU32,
    physics: Mutex<PhysicsSpace>,
    scheduler: Scheduler,
    main_queue: MainThreadQueue<World>,
    self_ref: Weak<World>,
    disposed: AtomicBool,
}

impl World {
    pub fn new(
        config: WorldConfig,
        generator: Arc<dyn ChunkGenerator>,
        store: Arc<dyn ChunkStore>,
    ) -> EngineResult<Arc<World>> {
        config.validate()?;
        let scheduler = Scheduler::new(config.worker_threads)?;
        let world = Arc::new_cyclic(|self_ref| World {
            id: WorldId::random(),
            ticker: Ticker::new(config.ticks_per_second),
            physics: Mutex::new(PhysicsSpace::new(config.gravity)),
            config,
            chunks: DashMap::new(),
            generator,
            store,
            entities: DashMap::new(),
            next_entity_id: AtomicU32::new(0),
            scheduler,
            main_queue: MainThreadQueue::new(),
            self_ref: self_ref.clone(),
            disposed: AtomicBool::new(false),
        });
        log::info!(
            "[World::new] Created world {} with seed {} ({} workers)",
            world.id,
            world.seed(),
            world.scheduler.worker_count()
        );
        Ok(world)
    }

    /// World persisted to `config.save_dir`, or kept in memory without one
    pub fn from_config(config: WorldConfig, generator: Arc<dyn ChunkGenerator>) -> EngineResult<Arc<World>> {
        let store: Arc<dyn ChunkStore> = match &config.save_dir {
            Some(dir) => Arc::new(FileChunkStore::new(dir)?),
            None => Arc::new(NoopChunkStore::new()),
        };
        Self::new(config, generator, store)
    }

    /// Default configuration, nothing written to disk
    pub fn headless(generator: Arc<dyn ChunkGenerator>) -> EngineResult<Arc<World>> {
        Self::new(WorldConfig::default(), generator, Arc::new(NoopChunkStore::new()))
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn tick(&self) -> u64 {
        self.ticker.tick_id()
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    // Lifecycle

    /// Start the tick thread, which calls [`World::update`] once per tick
    pub fn start(&self) -> EngineResult<()> {
        if self.is_disposed() {
            return Err(EngineError::Disposed { what: "World" });
        }
        let world = self.self_ref.clone();
        self.ticker.start(move |_tick| match world.upgrade() {
            Some(world) => {
                world.update();
                !world.is_disposed()
            }
            None => false,
        })
    }

    pub fn stop(&self) {
        self.ticker.stop();
    }

    /// One tick of world simulation.
    ///
    /// Drops chunks already marked unloaded, evicts chunks nobody requested
    /// for longer than the unload window and ticks the rest. Entities update
    /// afterwards.
    pub fn update(&self) {
        if self.is_disposed() {
            return;
        }
        let tick = self.tick();
        let unload_ticks = self.config.unload_ticks();
        let tps = self.ticker.tps();

        let chunks: Vec<Arc<Chunk>> = self.chunks.iter().map(|entry| Arc::clone(entry.value())).collect();
        for chunk in chunks {
            if !chunk.is_loaded() {
                self.evict(&chunk);
                continue;
            }
            if tick.saturating_sub(chunk.last_viewed_tick()) > unload_ticks {
                self.unload(&chunk);
                continue;
            }
            for action in chunk.update(tick, tps) {
                self.apply_tick_action(action);
            }
        }

        for entity in self.entities() {
            entity.update(self);
        }
    }

    /// Unload and persist a resident chunk.
    ///
    /// Returns false when the chunk was already unloaded or has been replaced
    /// in the registry.
    pub fn unload(&self, chunk: &Arc<Chunk>) -> bool {
        let location = chunk.location();
        let mut physics = self.physics.lock();
        // The registry slot stays locked until the save lands, so a
        // concurrent get_chunk cannot read the store ahead of it
        let entry = match self.chunks.entry(location) {
            Entry::Occupied(entry) if Arc::ptr_eq(entry.get(), chunk) => entry,
            _ => return false,
        };
        if !chunk.unload() {
            return false;
        }
        chunk.body().dispose(&mut physics);
        drop(physics);

        self.save_chunk(chunk);
        entry.remove();
        log::debug!("[World::unload] Unloaded chunk {}", location);
        true
    }

    /// Remove this exact chunk instance from the registry
    fn evict(&self, chunk: &Arc<Chunk>) {
        self.chunks
            .remove_if(&chunk.location(), |_, resident| Arc::ptr_eq(resident, chunk));
    }

    fn save_chunk(&self, chunk: &Chunk) -> bool {
        match self.store.save(&SavedChunk::from_chunk(chunk)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[World::save_chunk] Failed to save chunk {}: {}", chunk.location(), e);
                false
            }
        }
    }

    /// Persist every loaded chunk, returning how many were saved
    pub fn save_all(&self) -> usize {
        let saved = self
            .chunks()
            .iter()
            .filter(|chunk| self.save_chunk(chunk))
            .count();
        log::info!("[World::save_all] Saved {} chunks", saved);
        saved
    }

    /// Stop ticking, then dispose every entity and chunk body. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ticker.stop();

        let entities: Vec<Arc<Entity>> = self.entities.iter().map(|entry| Arc::clone(entry.value())).collect();
        self.entities.clear();
        for entity in entities {
            entity.dispose(self);
        }

        {
            let mut physics = self.physics.lock();
            for entry in self.chunks.iter() {
                entry.value().unload();
                entry.value().body().dispose(&mut physics);
            }
        }
        self.chunks.clear();
        log::info!("[World::dispose] Disposed world {}", self.id);
    }

    // Chunks

    /// The resident chunk at `location`, materialized if needed.
    ///
    /// Concurrent callers for a missing chunk block on the same registry slot,
    /// so the chunk is generated once and everyone receives the same `Arc`.
    /// A slot still holding an unloaded chunk is replaced by a fresh one.
    ///
    /// Panics once the world is disposed. Worker tasks use `try_get_chunk`.
    pub fn get_chunk(&self, location: Location) -> Arc<Chunk> {
        match self.try_get_chunk(location) {
            Some(chunk) => chunk,
            None => panic!("World {} has been disposed", self.id),
        }
    }

    /// Like `get_chunk`, but `None` once the world is disposed
    pub fn try_get_chunk(&self, location: Location) -> Option<Arc<Chunk>> {
        if self.is_disposed() {
            return None;
        }
        let tick = self.tick();
        if let Some(chunk) = self.resident_chunk(location) {
            chunk.view(tick);
            return Some(chunk);
        }

        let (chunk, fresh) = match self.chunks.entry(location) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_loaded() {
                    (Arc::clone(entry.get()), false)
                } else {
                    let chunk = self.materialize(location);
                    entry.insert(Arc::clone(&chunk));
                    (chunk, true)
                }
            }
            Entry::Vacant(entry) => {
                let chunk = self.materialize(location);
                entry.insert(Arc::clone(&chunk));
                (chunk, true)
            }
        };
        chunk.view(tick);
        if fresh {
            log::debug!("[World::get_chunk] Materialized chunk {}", location);
            self.schedule_rebuild(&chunk, true);
        }
        Some(chunk)
    }

    /// Build a chunk from saved data or the generator. Never touches the registry.
    fn materialize(&self, location: Location) -> Arc<Chunk> {
        let chunk = Chunk::with_world(self.self_ref.clone(), location);
        match self.store.load(location) {
            Ok(Some(saved)) => chunk.restore(&saved.materials),
            Ok(None) => self.generator.populate(&chunk, self.seed()),
            Err(e) => {
                log::warn!(
                    "[World::materialize] Failed to load chunk {}, generating instead: {}",
                    location,
                    e
                );
                self.generator.populate(&chunk, self.seed());
            }
        }
        Arc::new(chunk)
    }

    /// Loaded chunk at `location` without materializing or marking it viewed
    pub fn resident_chunk(&self, location: Location) -> Option<Arc<Chunk>> {
        self.chunks
            .get(&location)
            .filter(|entry| entry.value().is_loaded())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_chunk_loaded(&self, location: Location) -> bool {
        self.resident_chunk(location).is_some()
    }

    pub fn are_cardinal_neighbors_resident(&self, location: Location) -> bool {
        Direction::CARDINAL
            .iter()
            .all(|direction| self.is_chunk_loaded(location.relative(*direction)))
    }

    /// Entries in the registry, including unloaded ones awaiting removal
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Every loaded chunk
    pub fn chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks
            .iter()
            .filter(|entry| entry.value().is_loaded())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Chunks covering the block rectangle `min..=max`, materialized and
    /// marked as viewed
    pub fn chunks_in_view(&self, min: Location, max: Location) -> Vec<Arc<Chunk>> {
        let (low, high) = (min.to_chunk(), max.to_chunk());
        let mut chunks = Vec::new();
        for y in low.y..=high.y {
            for x in low.x..=high.x {
                chunks.push(self.get_chunk(Location::new(x, y)));
            }
        }
        chunks
    }

    // Blocks

    pub fn get_block(&self, world_x: i32, world_y: i32) -> Block {
        let chunk = self.get_chunk(Location::new(world_x, world_y).to_chunk());
        chunk.get_block(chunk_offset(world_x), chunk_offset(world_y))
    }

    /// Like `get_block`, but `None` once the world is disposed
    pub fn try_get_block(&self, world_x: i32, world_y: i32) -> Option<Block> {
        let chunk = self.try_get_chunk(Location::new(world_x, world_y).to_chunk())?;
        Some(chunk.get_block(chunk_offset(world_x), chunk_offset(world_y)))
    }

    /// Whether a cell is air. Materializes the owning chunk.
    pub fn is_air(&self, world_x: i32, world_y: i32) -> bool {
        let chunk = self.get_chunk(Location::new(world_x, world_y).to_chunk());
        chunk
            .raw_block(chunk_offset(world_x), chunk_offset(world_y))
            .map_or(true, |block| block.material().is_air())
    }

    pub fn set_block(&self, world_x: i32, world_y: i32, material: Material, update: bool) -> Arc<Chunk> {
        let chunk = self.get_chunk(Location::new(world_x, world_y).to_chunk());
        chunk.set_block(chunk_offset(world_x), chunk_offset(world_y), material, update);
        chunk
    }

    /// Wake the tick behaviors of the 8 cells around a block
    pub fn update_around(&self, world_x: i32, world_y: i32) {
        let center = Location::new(world_x, world_y);
        for direction in Direction::ALL {
            let location = center.relative(direction);
            if let Some(chunk) = self.resident_chunk(location.to_chunk()) {
                let (local_x, local_y) = location.to_local();
                chunk.mark_for_update(local_x, local_y);
            }
        }
    }

    /// Whether any solid cell lies in `floor(x)..=floor(x + width)` by
    /// `floor(y)..=floor(y + height)`
    pub fn will_collide(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let (min_x, max_x) = (x.floor() as i32, (x + width).floor() as i32);
        let (min_y, max_y) = (y.floor() as i32, (y + height).floor() as i32);
        for block_x in min_x..=max_x {
            for block_y in min_y..=max_y {
                if self.get_block(block_x, block_y).material().is_solid() {
                    return true;
                }
            }
        }
        false
    }

    /// Called by a chunk after a block changed with `update` set
    pub(crate) fn on_block_changed(&self, chunk: Location, local_x: i32, local_y: i32) {
        if self.is_disposed() {
            return;
        }
        if let Some(chunk) = self.resident_chunk(chunk) {
            self.schedule_rebuild(&chunk, true);
        }
        let origin = chunk.chunk_origin();
        self.update_around(origin.x + local_x, origin.y + local_y);
    }

    fn apply_tick_action(&self, action: TickAction) {
        match action {
            TickAction::Explode { origin } => {
                self.execute_async(move |world| {
                    let destroyed = explosion::search(world, origin, EXPLOSION_STRENGTH);
                    world.post_main(move |world| explosion::apply(world, &destroyed));
                });
            }
            TickAction::Fall { origin } => {
                self.post_main(move |world| world.drop_block(origin));
            }
            TickAction::Redraw => {}
        }
    }

    /// Turn the block at `origin` into a falling block if nothing is under it
    fn drop_block(&self, origin: Location) {
        let material = self.get_block(origin.x, origin.y).material();
        if !material.has_gravity() || !self.is_air(origin.x, origin.y - 1) {
            return;
        }
        self.set_block(origin.x, origin.y, Material::Air, true);
        let inset = (1.0 - FALLING_BLOCK_SIZE) / 2.0;
        self.spawn_entity(
            EntityKind::FallingBlock { material },
            origin.x as f32 + inset,
            origin.y as f32 + inset,
            FALLING_BLOCK_SIZE,
            FALLING_BLOCK_SIZE,
        );
    }

    // Entities

    /// Create an entity with its lower left corner at `(x, y)`.
    ///
    /// Returns `None` when the box overlaps a solid block or another entity;
    /// such an entity never gets a body and is not kept.
    pub fn spawn_entity(&self, kind: EntityKind, x: f32, y: f32, width: f32, height: f32) -> Option<Arc<Entity>> {
        if self.is_disposed() {
            return None;
        }
        let id = EntityId(self.next_entity_id.fetch_add(1, Ordering::Relaxed));
        let entity = Arc::new(Entity::new(id, kind, x, y, width, height));
        self.entities.insert(id, Arc::clone(&entity));

        if self.will_collide(x, y, width, height) {
            log::debug!(
                "[World::spawn_entity] Entity {} at ({}, {}) overlaps solid blocks, aborting",
                id,
                x,
                y
            );
            self.remove_entity(id);
            return None;
        }
        if !entity.touching_entities(self).is_empty() {
            log::debug!(
                "[World::spawn_entity] Entity {} at ({}, {}) overlaps another entity, aborting",
                id,
                x,
                y
            );
            self.remove_entity(id);
            return None;
        }

        entity.attach_body(self);
        Some(entity)
    }

    /// Remove and dispose an entity. Returns false if it was not present.
    pub fn remove_entity(&self, id: EntityId) -> bool {
        match self.entities.remove(&id) {
            Some((_, entity)) => {
                entity.dispose(self);
                true
            }
            None => false,
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<Arc<Entity>> {
        self.entities.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn entities(&self) -> Vec<Arc<Entity>> {
        self.entities.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // Physics

    pub fn physics(&self) -> &Mutex<PhysicsSpace> {
        &self.physics
    }

    /// Advance the physics simulation and hand contact changes to entities.
    ///
    /// Events are dispatched after the physics lock is released.
    pub fn step_physics(&self, delta_time: f32) {
        if self.is_disposed() {
            return;
        }
        let events = self.physics.lock().update(delta_time);
        for event in events {
            if let BodyOwner::Entity(id) = event.owner {
                if let Some(entity) = self.entity(id) {
                    entity.on_contact(self, &event);
                }
            }
        }
    }

    /// Rebuild a chunk's collision mesh on a worker
    pub fn schedule_rebuild(&self, chunk: &Arc<Chunk>, recalculate_neighbors: bool) {
        let chunk = Arc::clone(chunk);
        self.execute_async(move |world| chunk_body::rebuild(world, &chunk, recalculate_neighbors, false));
    }

    /// Rebuild a chunk's collision mesh on the calling thread
    pub fn rebuild_chunk_now(&self, chunk: &Arc<Chunk>, recalculate_neighbors: bool) {
        chunk_body::rebuild(self, chunk, recalculate_neighbors, false);
    }

    // Tasks

    /// Run `task` on a worker thread while the world is alive
    pub fn execute_async<F>(&self, task: F)
    where
        F: FnOnce(&World) + Send + 'static,
    {
        let world = self.self_ref.clone();
        self.scheduler.execute(move || {
            if let Some(world) = world.upgrade() {
                if !world.is_disposed() {
                    task(&world);
                }
            }
        });
    }

    /// Run `task` on a worker thread after `delay`
    pub fn schedule_async<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce(&World) + Send + 'static,
    {
        let world = self.self_ref.clone();
        self.scheduler.schedule(delay, move || {
            if let Some(world) = world.upgrade() {
                if !world.is_disposed() {
                    task(&world);
                }
            }
        });
    }

    /// Queue `task` for the next [`World::drain_main_queue`]
    pub fn post_main<F>(&self, task: F)
    where
        F: FnOnce(&World) + Send + 'static,
    {
        self.main_queue.post(task);
    }

    /// Run the queued main-thread tasks. Call once per frame from the main thread.
    pub fn drain_main_queue(&self) -> usize {
        if self.is_disposed() {
            return 0;
        }
        self.main_queue.drain(self)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("seed", &self.seed())
            .field("chunks", &self.chunks.len())
            .field("entities", &self.entities.len())
            .field("tick", &self.tick())
            .finish()
    }
}
