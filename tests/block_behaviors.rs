mod common;

use std::sync::Arc;
use std::time::Duration;

use flatland_engine::physics::FIXED_TIMESTEP;
use flatland_engine::world::TntBlock;
use flatland_engine::{Direction, EmptyGenerator, EntityKind, FlatGenerator, Location, Material};

use common::{test_world, wait_until};

#[test]
fn test_unsupported_sand_turns_into_falling_block() {
    let world = test_world(Arc::new(EmptyGenerator));
    world.set_block(3, 10, Material::Sand, false);

    world.ticker().advance(1);
    world.update();
    assert_eq!(world.drain_main_queue(), 1);

    assert!(world.is_air(3, 10));
    let entities = world.entities();
    assert_eq!(entities.len(), 1);
    assert_eq!(
        entities[0].kind(),
        EntityKind::FallingBlock {
            material: Material::Sand
        }
    );
}

#[test]
fn test_supported_sand_stays() {
    let world = test_world(Arc::new(EmptyGenerator));
    world.set_block(3, 9, Material::Stone, false);
    world.set_block(3, 10, Material::Sand, false);

    world.ticker().advance(1);
    world.update();
    world.drain_main_queue();

    assert_eq!(world.get_block(3, 10).material(), Material::Sand);
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn test_falling_sand_lands_as_block() {
    let world = test_world(Arc::new(EmptyGenerator));
    let chunk = world.get_chunk(Location::ORIGIN);
    for direction in Direction::ALL {
        world.get_chunk(Location::ORIGIN.relative(direction));
    }
    for x in 0..8 {
        world.set_block(x, 0, Material::Stone, false);
    }
    world.rebuild_chunk_now(&chunk, false);
    world.set_block(3, 10, Material::Sand, false);

    world.ticker().advance(1);
    world.update();
    world.drain_main_queue();
    assert_eq!(world.entity_count(), 1);

    let landed = wait_until(Duration::from_secs(10), || {
        world.step_physics(FIXED_TIMESTEP);
        world.drain_main_queue();
        world.entity_count() == 0
    });
    assert!(landed, "falling block never landed");
    assert_eq!(world.get_block(3, 1).material(), Material::Sand);
    assert!(world.is_air(3, 10));
}

#[test]
fn test_tnt_explodes_after_fuse() {
    let world = test_world(Arc::new(FlatGenerator::default()));
    world.set_block(0, -1, Material::Tnt, false);
    let fuse = TntBlock::fuse_ticks(world.ticker().tps());

    for _ in 0..fuse {
        world.ticker().advance(1);
        world.update();
    }
    assert_eq!(world.get_block(0, -1).material(), Material::Tnt);

    for _ in 0..2 {
        world.ticker().advance(1);
        world.update();
    }
    let exploded = wait_until(Duration::from_secs(10), || {
        world.drain_main_queue();
        world.is_air(0, -1)
    });
    assert!(exploded, "tnt did not explode");
    assert!(world.is_air(1, -1));
    assert!(world.is_air(0, -3));
    assert_eq!(world.get_block(0, -30).material(), Material::Stone);
    assert_eq!(world.get_block(0, -64).material(), Material::Bedrock);
}
