// Flatland Engine constants
//
// Shared numeric constants grouped by subsystem. Tunables that a world may
// override at runtime live in `WorldConfig`; the values here are its defaults.

/// Core grid constants
pub mod core {
    /// Width and height of a chunk in blocks
    pub const CHUNK_SIZE: i32 = 32;
    pub const BLOCKS_PER_CHUNK: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;
}

/// Tick timing
pub mod time {
    pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;

    /// Seconds a chunk may stay unrequested before it is unloaded
    pub const CHUNK_UNLOAD_SECONDS: f32 = 5.0;

    /// Ticks behind schedule before the ticker stops trying to catch up
    pub const MAX_TICK_LAG: u32 = 10;
}

/// Physics and collision mesh constants
pub mod physics {
    pub const DEFAULT_GRAVITY: f32 = -20.0;

    /// Delay before the first reload of a chunk whose neighbors were missing
    pub const INITIAL_UNSURE_FIXTURE_RELOAD_DELAY_MS: u64 = 10;
    /// Delay between subsequent reload attempts
    pub const UNSURE_FIXTURE_RELOAD_DELAY_MS: u64 = 100;

    /// Distance at which a box is considered touching an edge
    pub const CONTACT_EPSILON: f32 = 0.01;
    /// How far below an entity to look when deciding whether it stands on ground
    pub const GROUND_EPSILON: f32 = 0.05;

    /// Largest distance a body may travel in one sub-step, in blocks
    pub const MAX_STEP_DISTANCE: f32 = 0.25;
}

/// Explosion tuning
pub mod explosion {
    pub const EXPLOSION_STRENGTH: i32 = 40;
    pub const RESISTANCE: f64 = 8.0;
    pub const FUSE_SECONDS: u64 = 3;
}

/// Light sources
pub mod light {
    pub const TORCH_LIGHT_RADIUS: f32 = 12.0;
}
