//! Falling block behavior

use super::Entity;
use crate::world::{Location, Material, World};

/// Remove the falling block once the chunk it is in stops being loaded
pub(super) fn check_chunk_loaded(entity: &Entity, world: &World) {
    let position = entity.position();
    let chunk = Location::new(position.x.floor() as i32, position.y.floor() as i32).to_chunk();
    if world.is_chunk_loaded(chunk) {
        return;
    }
    log::debug!(
        "[falling_block::check_chunk_loaded] Chunk {} is gone, removing falling block {}",
        chunk,
        entity.id()
    );
    let id = entity.id();
    world.post_main(move |world| {
        world.remove_entity(id);
    });
}

/// First ground contact: put the block back into the grid on the main thread
pub(super) fn land(entity: &Entity, world: &World, material: Material) {
    if !entity.crash() {
        return;
    }
    let id = entity.id();
    let position = entity.position();
    let (x, y) = (position.x.floor() as i32, position.y.floor() as i32);
    world.post_main(move |world| {
        if world.is_air(x, y) {
            world.set_block(x, y, material, true);
        } else {
            log::debug!(
                "[falling_block::land] Cell ({}, {}) is occupied, dropping {}",
                x,
                y,
                material
            );
        }
        world.remove_entity(id);
    });
}
