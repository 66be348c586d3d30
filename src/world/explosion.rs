//! Explosion search and application.
//!
//! The search reads many cells and runs on a worker thread. Its result is
//! applied on the main thread.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::sync::Arc;

use rand::Rng;

use crate::constants::explosion::RESISTANCE;
use crate::world::{Chunk, Location, Material, World};

/// Standard normal sample (Box-Muller)
fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Whether a block of `hardness` at `distance_squared` from the blast breaks
pub fn is_destroyed(distance_squared: i64, hardness: f32, noise: f64, strength: i32) -> bool {
    if hardness < 0.0 {
        return false;
    }
    let resisted = distance_squared as f64 * hardness as f64 * (noise + RESISTANCE).abs();
    resisted < (strength as f64) * (strength as f64)
}

/// Cells an explosion of `strength` centered on `origin` destroys.
///
/// Scans the square `[origin - strength, origin + strength)` on both axes.
/// Air and indestructible cells are never included. Stops early with what it
/// has found so far if the world is disposed mid-search.
pub fn search(world: &World, origin: Location, strength: i32) -> Vec<Location> {
    let mut rng = rand::thread_rng();
    let mut destroyed = Vec::new();
    for x in (origin.x - strength)..(origin.x + strength) {
        for y in (origin.y - strength)..(origin.y + strength) {
            let Some(block) = world.try_get_block(x, y) else {
                log::debug!("[explosion::search] World disposed, abandoning explosion at {}", origin);
                return destroyed;
            };
            let material = block.material();
            if material.is_air() || material.hardness() < 0.0 {
                continue;
            }
            let location = Location::new(x, y);
            if is_destroyed(
                origin.distance_squared_to(location),
                material.hardness(),
                gaussian(&mut rng),
                strength,
            ) {
                destroyed.push(location);
            }
        }
    }
    log::debug!(
        "[explosion::search] Explosion at {} destroys {} blocks",
        origin,
        destroyed.len()
    );
    destroyed
}

/// Remove the destroyed cells, then rebuild each affected chunk once
pub fn apply(world: &World, destroyed: &[Location]) {
    let mut chunks: BTreeMap<Location, Arc<Chunk>> = BTreeMap::new();
    for location in destroyed {
        let chunk = world.set_block(location.x, location.y, Material::Air, false);
        chunks.entry(chunk.location()).or_insert(chunk);
        world.update_around(location.x, location.y);
    }
    for chunk in chunks.values() {
        world.schedule_rebuild(chunk, true);
    }
}
