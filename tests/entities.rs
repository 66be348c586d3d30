mod common;

use std::sync::Arc;
use std::time::Duration;

use cgmath::Vector2;
use flatland_engine::physics::FIXED_TIMESTEP;
use flatland_engine::{EmptyGenerator, EntityKind, EntityState, FlatGenerator, Location, Material, World};

use common::{test_world, wait_until};

/// Flat terrain around the origin with the surface chunk's mesh built
fn grounded_world() -> Arc<World> {
    let world = test_world(Arc::new(FlatGenerator::default()));
    world.chunks_in_view(Location::new(-64, -64), Location::new(63, 63));
    let surface = world.get_chunk(Location::new(0, -1));
    world.rebuild_chunk_now(&surface, false);
    world
}

#[test]
fn test_spawn_inside_solid_is_rejected() {
    let world = test_world(Arc::new(FlatGenerator::default()));
    let entity = world.spawn_entity(EntityKind::Generic, 0.0, -3.0, 1.0, 1.0);
    assert!(entity.is_none());
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn test_spawn_overlapping_entity_is_rejected() {
    let world = test_world(Arc::new(EmptyGenerator));
    let first = world
        .spawn_entity(EntityKind::Generic, 0.0, 0.0, 1.0, 1.0)
        .expect("free space");
    assert!(first.body().is_some());
    assert_eq!(first.state(), EntityState::Airborne);

    assert!(world.spawn_entity(EntityKind::Generic, 0.5, 0.5, 1.0, 1.0).is_none());
    assert_eq!(world.entity_count(), 1);

    // Touching edges is not overlapping
    assert!(world.spawn_entity(EntityKind::Generic, 1.0, 0.0, 1.0, 1.0).is_some());
    assert_eq!(world.entity_count(), 2);
    assert_eq!(first.touching_entities(&world).len(), 0);
}

#[test]
fn test_entity_falls_and_lands() {
    let world = grounded_world();
    let entity = world
        .spawn_entity(EntityKind::Generic, 0.25, 3.0, 0.5, 0.5)
        .expect("free space");

    let landed = wait_until(Duration::from_secs(10), || {
        world.step_physics(FIXED_TIMESTEP);
        entity.update(&world);
        entity.is_on_ground()
    });
    assert!(landed, "entity never landed, at {:?}", entity.position());
    assert_eq!(entity.state(), EntityState::Grounded);
    assert!((entity.position().y - 0.25).abs() < 1e-3);
    assert!(entity.touching_blocks(&world).is_empty());
}

#[test]
fn test_wall_contact_in_mid_air_is_not_ground() {
    let world = test_world(Arc::new(EmptyGenerator));
    for y in 2..10 {
        world.set_block(5, y, Material::Stone, false);
    }
    let chunk = world.get_chunk(Location::ORIGIN);
    world.rebuild_chunk_now(&chunk, false);

    let entity = world
        .spawn_entity(EntityKind::Generic, 3.5, 5.0, 1.0, 1.0)
        .expect("free space");
    entity.set_flying(&world, true);
    entity.set_velocity(&world, Vector2::new(2.0, 0.0));

    let touching = wait_until(Duration::from_secs(5), || {
        world.step_physics(FIXED_TIMESTEP);
        world.physics().lock().contact_count() > 0
    });
    assert!(touching, "entity never reached the wall, at {:?}", entity.position());
    for _ in 0..5 {
        world.step_physics(FIXED_TIMESTEP);
    }
    entity.update(&world);

    assert!((entity.position().x - 4.5).abs() < 1e-3);
    assert!(!entity.is_on_ground());
    assert_eq!(entity.state(), EntityState::Airborne);
}

#[test]
fn test_removing_floor_ends_ground_contact() {
    let world = grounded_world();
    let entity = world
        .spawn_entity(EntityKind::Generic, 0.25, 1.0, 0.5, 0.5)
        .expect("free space");
    assert!(wait_until(Duration::from_secs(10), || {
        world.step_physics(FIXED_TIMESTEP);
        entity.is_on_ground()
    }));

    world.set_block(0, -1, Material::Air, true);
    assert!(
        wait_until(Duration::from_secs(5), || {
            world.step_physics(FIXED_TIMESTEP);
            !entity.is_on_ground()
        }),
        "ground contact survived losing the floor"
    );

    // Falls into the hole and lands on the block below
    let landed = wait_until(Duration::from_secs(10), || {
        world.step_physics(FIXED_TIMESTEP);
        entity.update(&world);
        entity.is_on_ground() && entity.position().y < 0.0
    });
    assert!(landed, "entity never landed again, at {:?}", entity.position());
    assert!((entity.position().y + 0.75).abs() < 1e-3);
}

#[test]
fn test_flying_entity_ignores_gravity() {
    let world = test_world(Arc::new(EmptyGenerator));
    let entity = world
        .spawn_entity(EntityKind::Generic, 0.0, 10.0, 1.0, 1.0)
        .expect("free space");
    entity.set_velocity(&world, Vector2::new(0.0, -5.0));
    entity.set_flying(&world, true);
    assert!(entity.is_flying());

    for _ in 0..30 {
        world.step_physics(FIXED_TIMESTEP);
    }
    entity.update(&world);
    assert_eq!(entity.position().y, 10.5);

    entity.set_flying(&world, false);
    for _ in 0..30 {
        world.step_physics(FIXED_TIMESTEP);
    }
    entity.update(&world);
    assert!(entity.position().y < 10.5);
}

#[test]
fn test_dispose_is_idempotent() {
    let world = test_world(Arc::new(EmptyGenerator));
    let entity = world
        .spawn_entity(EntityKind::Generic, 0.0, 0.0, 1.0, 1.0)
        .expect("free space");
    let bodies = world.physics().lock().body_count();

    assert!(entity.dispose(&world));
    assert!(!entity.dispose(&world));
    assert_eq!(entity.state(), EntityState::Disposed);
    assert!(entity.body().is_none());
    assert_eq!(world.physics().lock().body_count(), bodies - 1);

    assert!(world.remove_entity(entity.id()));
    assert!(!world.remove_entity(entity.id()));
}
