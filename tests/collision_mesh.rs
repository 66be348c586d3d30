mod common;

use std::sync::Arc;
use std::time::Duration;

use flatland_engine::{Direction, EmptyGenerator, FlatGenerator, Location, Material};

use common::{test_world, wait_until};

#[test]
fn test_all_air_chunk_has_no_body() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    world.rebuild_chunk_now(&chunk, false);
    assert!(!chunk.body().has_body());
    assert_eq!(chunk.body().edge_count(), 0);
    assert_eq!(world.physics().lock().fixture_count(), 0);
}

#[test]
fn test_interior_block_with_resident_neighbors() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    for direction in Direction::CARDINAL {
        world.get_chunk(Location::ORIGIN.relative(direction));
    }
    chunk.set_block(10, 10, Material::Stone, false);
    world.rebuild_chunk_now(&chunk, false);

    assert!(chunk.body().has_body());
    assert_eq!(chunk.body().edge_count(), 4);
    assert!(!chunk.body().has_pending_retry());
    assert_eq!(world.physics().lock().fixture_count(), 4);
}

#[test]
fn test_missing_neighbor_retries_until_resident() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    chunk.set_block(0, 5, Material::Stone, false);
    world.rebuild_chunk_now(&chunk, false);

    assert!(chunk.body().has_pending_retry());
    assert_eq!(chunk.body().edge_count(), 3);

    for direction in Direction::CARDINAL {
        world.get_chunk(Location::ORIGIN.relative(direction));
    }
    assert!(
        wait_until(Duration::from_secs(5), || {
            !chunk.body().has_pending_retry() && chunk.body().edge_count() == 4
        }),
        "retry did not complete"
    );
}

#[test]
fn test_retry_is_dropped_for_unloaded_chunk() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    chunk.set_block(0, 5, Material::Stone, false);
    world.rebuild_chunk_now(&chunk, false);
    assert!(chunk.body().has_pending_retry());

    assert!(world.unload(&chunk));
    assert!(wait_until(Duration::from_secs(5), || !chunk.body().has_pending_retry()));
    assert!(!chunk.body().has_body());
}

#[test]
fn test_clearing_last_block_removes_body() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    for direction in Direction::CARDINAL {
        world.get_chunk(Location::ORIGIN.relative(direction));
    }
    chunk.set_block(4, 4, Material::Brick, false);
    world.rebuild_chunk_now(&chunk, false);
    assert!(chunk.body().has_body());

    chunk.set_block(4, 4, Material::Air, false);
    world.rebuild_chunk_now(&chunk, false);
    assert!(!chunk.body().has_body());
    assert_eq!(world.physics().lock().fixture_count(), 0);
}

#[test]
fn test_set_block_with_update_rebuilds_asynchronously() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    for direction in Direction::CARDINAL {
        world.get_chunk(Location::ORIGIN.relative(direction));
    }
    world.set_block(12, 12, Material::Stone, true);
    world.set_block(13, 12, Material::Glass, true);
    assert!(wait_until(Duration::from_secs(5), || chunk.body().edge_count() == 6));

    let edges = chunk.body().edges();
    assert_eq!(edges.iter().filter(|edge| edge.transparent).count(), 3);
}

#[test]
fn test_flat_surface_is_closed_at_chunk_seams() {
    let world = test_world(Arc::new(FlatGenerator::default()));
    world.chunks_in_view(Location::new(-64, -64), Location::new(63, 63));
    let chunk = world.get_chunk(Location::new(0, -1));
    world.rebuild_chunk_now(&chunk, false);

    // The grass row gets north edges. The outer columns get their rim edges.
    let edges = chunk.body().edges();
    let north = edges
        .iter()
        .filter(|edge| edge.start.y == 32.0 && edge.end.y == 32.0)
        .count();
    assert_eq!(north, 32);
    assert!(wait_until(Duration::from_secs(5), || !chunk.body().has_pending_retry()));
}

#[test]
fn test_torch_registers_light_after_rebuild() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    chunk.set_block(6, 7, Material::Torch, false);
    world.rebuild_chunk_now(&chunk, false);
    let lights = chunk.light_sources();
    assert_eq!(lights.len(), 1);
    assert_eq!((lights[0].x, lights[0].y), (6.5, 7.5));
}

#[test]
fn test_neighbor_refresh_rebuilds_cardinals_and_relights_diagonals() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    let cardinal = world.get_chunk(Location::new(1, 0));
    let diagonal = world.get_chunk(Location::new(1, 1));
    assert!(wait_until(Duration::from_secs(5), || {
        let stats = world.scheduler_stats();
        stats.tasks_completed == stats.tasks_submitted
    }));

    cardinal.set_block(10, 10, Material::Stone, false);
    diagonal.set_block(10, 10, Material::Stone, false);
    diagonal.set_block(12, 12, Material::Torch, false);
    world.rebuild_chunk_now(&chunk, true);

    assert!(wait_until(Duration::from_secs(5), || {
        cardinal.body().edge_count() == 4 && diagonal.light_sources().len() == 1
    }));
    assert_eq!(diagonal.body().edge_count(), 0);
    assert!(!diagonal.body().has_body());
    assert_eq!(diagonal.light_sources()[0].x, 44.5);
}
