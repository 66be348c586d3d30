mod common;

use std::sync::Arc;

use flatland_engine::{FlatGenerator, Location, Material, World, WorldConfig};
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> WorldConfig {
    WorldConfig {
        save_dir: Some(dir.path().to_path_buf()),
        ..common::test_config()
    }
}

#[test]
fn test_saved_world_restores_blocks() {
    common::init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let world = World::from_config(config_in(&temp_dir), Arc::new(FlatGenerator::default())).expect("world created");
    world.set_block(5, 5, Material::Brick, false);
    world.set_block(-3, -1, Material::Air, false);
    assert!(world.save_all() >= 2);
    world.dispose();
    assert!(temp_dir.path().join("chunk_0_0.bin").exists());

    let reloaded = World::from_config(config_in(&temp_dir), Arc::new(FlatGenerator::default())).expect("world created");
    assert_eq!(reloaded.get_block(5, 5).material(), Material::Brick);
    assert_eq!(reloaded.get_block(-3, -1).material(), Material::Air);
    assert_eq!(reloaded.get_block(-4, -1).material(), Material::Grass);
}

#[test]
fn test_corrupt_save_falls_back_to_generator() {
    common::init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("chunk_0_-1.bin"), b"not a chunk").expect("write works");

    let world = World::from_config(config_in(&temp_dir), Arc::new(FlatGenerator::default())).expect("world created");
    assert_eq!(world.get_block(0, -1).material(), Material::Grass);
    assert!(world.get_chunk(Location::new(0, -1)).is_loaded());
}

#[test]
fn test_evicted_chunk_is_written_to_disk() {
    common::init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let world = World::from_config(config_in(&temp_dir), Arc::new(FlatGenerator::default())).expect("world created");

    let chunk = world.set_block(40, 3, Material::Torch, false);
    assert_eq!(chunk.location(), Location::new(1, 0));
    world.ticker().advance(world.config().unload_ticks() + 1);
    world.update();

    assert!(!chunk.is_loaded());
    assert!(temp_dir.path().join("chunk_1_0.bin").exists());
}
