use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Weak;

use parking_lot::{Mutex, RwLock};

use crate::constants::core::{BLOCKS_PER_CHUNK, CHUNK_SIZE};
use crate::physics::ChunkBody;
use crate::world::block::{TickAction, TickContext, TickingBlock};
use crate::world::blocks::{create_behavior, LightSource};
use crate::world::position::{chunk_to_world, is_inside_chunk};
use crate::world::{Block, Location, Material, World};

/// Index of a local coordinate into the cell array. Panics when out of range.
fn cell_index(local_x: i32, local_y: i32) -> usize {
    assert!(
        is_inside_chunk(local_x, local_y),
        "Local block coordinate ({}, {}) is outside of chunk bounds [0, {})",
        local_x,
        local_y,
        CHUNK_SIZE
    );
    (local_y * CHUNK_SIZE + local_x) as usize
}

fn index_to_local(index: usize) -> (i32, i32) {
    let index = index as i32;
    (index % CHUNK_SIZE, index / CHUNK_SIZE)
}

/// Block storage guarded by the chunk's cell lock
struct ChunkCells {
    /// `None` is air that was never materialized
    blocks: Vec<Option<Block>>,
    all_air: bool,
    tickers: BTreeMap<usize, Box<dyn TickingBlock>>,
    lights: BTreeSet<usize>,
}

impl ChunkCells {
    fn new() -> Self {
        Self {
            blocks: vec![None; BLOCKS_PER_CHUNK],
            all_air: true,
            tickers: BTreeMap::new(),
            lights: BTreeSet::new(),
        }
    }

    fn material(&self, index: usize) -> Material {
        self.blocks[index].map_or(Material::Air, |block| block.material())
    }
}

/// A CHUNK_SIZE x CHUNK_SIZE square of the world.
///
/// Chunks are shared between the tick thread, worker tasks and the main
/// thread, so all state sits behind interior locks or atomics.
pub struct Chunk {
    location: Location,
    world: Weak<World>,
    cells: RwLock<ChunkCells>,
    body: ChunkBody,
    /// Light sources rebuilt by the lighting pass. Also serves as the chunk's
    /// light lock; take it only after the physics lock.
    light_sources: Mutex<Vec<LightSource>>,
    last_viewed_tick: AtomicU64,
    loaded: AtomicBool,
    texture_dirty: AtomicBool,
    version: AtomicU64,
}

impl Chunk {
    /// A detached chunk that does not notify any world on change
    pub fn new(location: Location) -> Self {
        Self::with_world(Weak::new(), location)
    }

    pub(crate) fn with_world(world: Weak<World>, location: Location) -> Self {
        Self {
            location,
            world,
            cells: RwLock::new(ChunkCells::new()),
            body: ChunkBody::new(),
            light_sources: Mutex::new(Vec::new()),
            last_viewed_tick: AtomicU64::new(0),
            loaded: AtomicBool::new(true),
            texture_dirty: AtomicBool::new(true),
            version: AtomicU64::new(0),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Block at a local coordinate. Cells never written read as air.
    pub fn get_block(&self, local_x: i32, local_y: i32) -> Block {
        let index = cell_index(local_x, local_y);
        self.cells.read().blocks[index]
            .unwrap_or_else(|| Block::new(Material::Air, self.location, local_x, local_y))
    }

    /// Stored block, `None` if the cell was never materialized
    pub fn raw_block(&self, local_x: i32, local_y: i32) -> Option<Block> {
        let index = cell_index(local_x, local_y);
        self.cells.read().blocks[index]
    }

    pub fn material(&self, local_x: i32, local_y: i32) -> Material {
        let index = cell_index(local_x, local_y);
        self.cells.read().material(index)
    }

    /// Replace the block at a local coordinate.
    ///
    /// With `update` the owning world rebuilds this chunk's collision mesh and
    /// notifies the cells around the block.
    pub fn set_block(&self, local_x: i32, local_y: i32, material: Material, update: bool) {
        let index = cell_index(local_x, local_y);
        {
            let mut cells = self.cells.write();
            let previous = cells.material(index);
            cells.blocks[index] = if material.is_air() {
                None
            } else {
                Some(Block::new(material, self.location, local_x, local_y))
            };

            cells.tickers.remove(&index);
            if let Some(behavior) = create_behavior(material) {
                cells.tickers.insert(index, behavior);
            }
            if material.emits_light() {
                cells.lights.insert(index);
            } else {
                cells.lights.remove(&index);
            }

            if !material.is_air() {
                cells.all_air = false;
            } else if !previous.is_air() {
                cells.all_air = cells.blocks.iter().all(Option::is_none);
            }
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        self.texture_dirty.store(true, Ordering::Release);

        if update {
            if let Some(world) = self.world.upgrade() {
                world.on_block_changed(self.location, local_x, local_y);
            }
        }
    }

    pub fn is_all_air(&self) -> bool {
        self.cells.read().all_air
    }

    /// Every cell of the chunk, column-major
    pub fn blocks(&self) -> Vec<Block> {
        let cells = self.cells.read();
        let mut blocks = Vec::with_capacity(BLOCKS_PER_CHUNK);
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                blocks.push(
                    cells.blocks[cell_index(x, y)]
                        .unwrap_or_else(|| Block::new(Material::Air, self.location, x, y)),
                );
            }
        }
        blocks
    }

    /// Materials of all cells, indexed by `y * CHUNK_SIZE + x`
    pub fn materials(&self) -> Vec<Material> {
        let cells = self.cells.read();
        (0..BLOCKS_PER_CHUNK).map(|index| cells.material(index)).collect()
    }

    /// Overwrite the chunk with stored materials without notifying the world
    pub fn restore(&self, materials: &[Material]) {
        for (index, material) in materials.iter().enumerate().take(BLOCKS_PER_CHUNK) {
            if material.is_air() {
                continue;
            }
            let (x, y) = index_to_local(index);
            self.set_block(x, y, *material, false);
        }
    }

    /// Tick every block that carries a tick behavior.
    ///
    /// Returns the actions the world must carry out once this chunk is no
    /// longer locked.
    pub fn update(&self, tick: u64, ticks_per_second: u32) -> Vec<TickAction> {
        if self.cells.read().tickers.is_empty() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        {
            let mut cells = self.cells.write();
            for (index, behavior) in cells.tickers.iter_mut() {
                if !behavior.should_tick() {
                    continue;
                }
                let (x, y) = index_to_local(*index);
                let ctx = TickContext {
                    tick,
                    ticks_per_second,
                    location: Location::new(
                        chunk_to_world(self.location.x, x),
                        chunk_to_world(self.location.y, y),
                    ),
                };
                behavior.tick(&ctx, &mut actions);
            }
        }

        if actions.iter().any(|action| *action == TickAction::Redraw) {
            self.mark_texture_dirty();
        }
        actions.retain(|action| *action != TickAction::Redraw);
        actions
    }

    pub fn has_tickers(&self) -> bool {
        !self.cells.read().tickers.is_empty()
    }

    /// Tell the tick behavior at a local coordinate that its surroundings changed
    pub fn mark_for_update(&self, local_x: i32, local_y: i32) {
        let index = cell_index(local_x, local_y);
        if let Some(behavior) = self.cells.write().tickers.get_mut(&index) {
            behavior.request_update();
        }
    }

    pub fn is_glowing(&self, local_x: i32, local_y: i32) -> bool {
        let index = cell_index(local_x, local_y);
        self.cells
            .read()
            .tickers
            .get(&index)
            .map_or(false, |behavior| behavior.is_glowing())
    }

    /// Rebuild the static light list from the light-emitting cells
    pub fn update_lights(&self) {
        let mut sources = self.light_sources.lock();
        let cells = self.cells.read();
        sources.clear();
        for index in &cells.lights {
            let (x, y) = index_to_local(*index);
            sources.push(LightSource::torch(Location::new(
                chunk_to_world(self.location.x, x),
                chunk_to_world(self.location.y, y),
            )));
        }
    }

    pub fn light_sources(&self) -> Vec<LightSource> {
        self.light_sources.lock().clone()
    }

    pub fn body(&self) -> &ChunkBody {
        &self.body
    }

    /// Incremented on every block change
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn last_viewed_tick(&self) -> u64 {
        self.last_viewed_tick.load(Ordering::Acquire)
    }

    /// Record that the chunk was requested at `tick`
    pub fn view(&self, tick: u64) {
        self.last_viewed_tick.fetch_max(tick, Ordering::AcqRel);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Mark the chunk unloaded. Returns false if it already was.
    pub fn unload(&self) -> bool {
        self.loaded.swap(false, Ordering::AcqRel)
    }

    pub fn mark_texture_dirty(&self) {
        self.texture_dirty.store(true, Ordering::Release);
    }

    /// Read and clear the renderer's dirty flag
    pub fn take_texture_dirty(&self) -> bool {
        self.texture_dirty.swap(false, Ordering::AcqRel)
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("location", &self.location)
            .field("loaded", &self.is_loaded())
            .field("all_air", &self.is_all_air())
            .field("last_viewed_tick", &self.last_viewed_tick())
            .finish()
    }
}
