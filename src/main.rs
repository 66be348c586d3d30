//! Headless world runner.
//!
//! Usage: `flatland [config.toml]`. Builds a flat world, lets it tick for a
//! few seconds with a TNT block and a sand pillar in view, then saves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flatland_engine::{FlatGenerator, Location, Material, World, WorldConfig};

const RUN_SECONDS: u64 = 6;
const FRAME: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(&path).with_context(|| format!("Failed to load config from {}", path))?,
        None => WorldConfig::default(),
    };

    let world = World::from_config(config, Arc::new(FlatGenerator::default())).context("Failed to create world")?;
    let view_min = Location::new(-48, -48);
    let view_max = Location::new(48, 48);
    world.chunks_in_view(view_min, view_max);

    world.set_block(0, 0, Material::Tnt, true);
    for y in 6..10 {
        world.set_block(-8, y, Material::Sand, true);
    }
    world.set_block(8, 0, Material::Torch, true);

    world.start().context("Failed to start ticker")?;
    log::info!("[main] Running world {} for {} seconds", world.id(), RUN_SECONDS);

    let started = Instant::now();
    let mut last_frame = Instant::now();
    while started.elapsed() < Duration::from_secs(RUN_SECONDS) {
        let now = Instant::now();
        world.drain_main_queue();
        world.step_physics((now - last_frame).as_secs_f32());
        last_frame = now;

        let dirty = world
            .chunks_in_view(view_min, view_max)
            .iter()
            .filter(|chunk| chunk.take_texture_dirty())
            .count();
        if dirty > 0 {
            log::debug!("[main] {} chunks need redrawing", dirty);
        }
        std::thread::sleep(FRAME);
    }

    world.stop();
    world.drain_main_queue();
    log::info!(
        "[main] Stopped at tick {} with {} chunks and {} entities",
        world.tick(),
        world.chunks().len(),
        world.entity_count()
    );
    world.save_all();
    world.dispose();
    Ok(())
}
