//! Chunk generators.
//!
//! A generator fills a freshly materialized chunk. It only ever writes to the
//! chunk it is given and must produce the same blocks for the same seed and
//! chunk location.

use crate::constants::core::CHUNK_SIZE;
use crate::world::position::chunk_to_world;
use crate::world::{Chunk, Material};

pub trait ChunkGenerator: Send + Sync {
    /// Fill `chunk` with its initial blocks
    fn populate(&self, chunk: &Chunk, seed: u64);

    /// Height of the first air cell above the terrain in a world column
    fn surface_height(&self, world_x: i32, seed: u64) -> i32;

    /// A spawn height with room above the surface
    fn find_safe_spawn_height(&self, world_x: i32, seed: u64) -> i32 {
        self.surface_height(world_x, seed) + 2
    }
}

/// Leaves every chunk as air
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGenerator;

impl ChunkGenerator for EmptyGenerator {
    fn populate(&self, _chunk: &Chunk, _seed: u64) {}

    fn surface_height(&self, _world_x: i32, _seed: u64) -> i32 {
        0
    }
}

/// Horizontal layers: bedrock floor, stone, dirt, one row of grass
#[derive(Debug, Clone, Copy)]
pub struct FlatGenerator {
    /// First air row
    pub surface: i32,
    pub dirt_depth: i32,
    /// Rows at or below this are bedrock
    pub bedrock_level: i32,
}

impl Default for FlatGenerator {
    fn default() -> Self {
        Self {
            surface: 0,
            dirt_depth: 3,
            bedrock_level: -64,
        }
    }
}

impl FlatGenerator {
    pub fn new(surface: i32) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }

    pub fn material_at(&self, world_y: i32) -> Material {
        if world_y >= self.surface {
            Material::Air
        } else if world_y <= self.bedrock_level {
            Material::Bedrock
        } else if world_y == self.surface - 1 {
            Material::Grass
        } else if world_y >= self.surface - 1 - self.dirt_depth {
            Material::Dirt
        } else {
            Material::Stone
        }
    }
}

impl ChunkGenerator for FlatGenerator {
    fn populate(&self, chunk: &Chunk, _seed: u64) {
        let location = chunk.location();
        for local_y in 0..CHUNK_SIZE {
            let material = self.material_at(chunk_to_world(location.y, local_y));
            if material.is_air() {
                continue;
            }
            for local_x in 0..CHUNK_SIZE {
                chunk.set_block(local_x, local_y, material, false);
            }
        }
    }

    fn surface_height(&self, _world_x: i32, _seed: u64) -> i32 {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Location;

    #[test]
    fn test_empty_generator_leaves_air() {
        let chunk = Chunk::new(Location::new(0, -1));
        EmptyGenerator.populate(&chunk, 7);
        assert!(chunk.is_all_air());
    }

    #[test]
    fn test_flat_layers() {
        let generator = FlatGenerator::default();
        assert_eq!(generator.material_at(0), Material::Air);
        assert_eq!(generator.material_at(-1), Material::Grass);
        assert_eq!(generator.material_at(-2), Material::Dirt);
        assert_eq!(generator.material_at(-4), Material::Dirt);
        assert_eq!(generator.material_at(-5), Material::Stone);
        assert_eq!(generator.material_at(-64), Material::Bedrock);
    }

    #[test]
    fn test_flat_chunks_above_surface_stay_air() {
        let generator = FlatGenerator::default();
        let above = Chunk::new(Location::new(3, 0));
        generator.populate(&above, 1);
        assert!(above.is_all_air());

        let below = Chunk::new(Location::new(3, -1));
        generator.populate(&below, 1);
        assert_eq!(below.material(0, CHUNK_SIZE - 1), Material::Grass);
        assert_eq!(below.material(5, 0), Material::Stone);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = FlatGenerator::new(10);
        let a = Chunk::new(Location::new(-2, 0));
        let b = Chunk::new(Location::new(-2, 0));
        generator.populate(&a, 99);
        generator.populate(&b, 99);
        assert_eq!(a.materials(), b.materials());
    }
}
