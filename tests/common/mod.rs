#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use flatland_engine::{ChunkGenerator, NoopChunkStore, World, WorldConfig};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config() -> WorldConfig {
    WorldConfig {
        worker_threads: 2,
        ..WorldConfig::default()
    }
}

pub fn test_world(generator: Arc<dyn ChunkGenerator>) -> Arc<World> {
    init_logging();
    World::new(test_config(), generator, Arc::new(NoopChunkStore::new())).expect("Failed to create test world")
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
