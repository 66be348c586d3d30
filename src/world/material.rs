use std::fmt;

use serde::{Deserialize, Serialize};

/// What a block is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Material {
    Air = 0,
    Stone = 1,
    Brick = 2,
    Dirt = 3,
    Grass = 4,
    Sand = 5,
    Glass = 6,
    Torch = 7,
    Tnt = 8,
    Bedrock = 9,
}

impl Material {
    pub const ALL: [Material; 10] = [
        Material::Air,
        Material::Stone,
        Material::Brick,
        Material::Dirt,
        Material::Grass,
        Material::Sand,
        Material::Glass,
        Material::Torch,
        Material::Tnt,
        Material::Bedrock,
    ];

    pub fn is_air(&self) -> bool {
        matches!(self, Material::Air)
    }

    /// Whether entities collide with this material
    pub fn is_solid(&self) -> bool {
        !matches!(self, Material::Air | Material::Torch)
    }

    /// Whether this material casts shadows
    pub fn blocks_light(&self) -> bool {
        !matches!(self, Material::Air | Material::Torch | Material::Glass)
    }

    /// Resistance to explosions. Negative means indestructible.
    pub fn hardness(&self) -> f32 {
        match self {
            Material::Air => 0.0,
            Material::Stone => 1.5,
            Material::Brick => 2.0,
            Material::Dirt => 1.0,
            Material::Grass => 0.8,
            Material::Sand => 0.6,
            Material::Glass => 0.3,
            Material::Torch => 0.1,
            Material::Tnt => 0.5,
            Material::Bedrock => -1.0,
        }
    }

    /// Whether blocks of this material carry a tick behavior
    pub fn is_tickable(&self) -> bool {
        matches!(self, Material::Tnt | Material::Sand)
    }

    /// Whether unsupported blocks of this material fall
    pub fn has_gravity(&self) -> bool {
        matches!(self, Material::Sand)
    }

    /// Whether blocks of this material emit a static light
    pub fn emits_light(&self) -> bool {
        matches!(self, Material::Torch)
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Material> {
        Material::ALL.get(id as usize).copied()
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Air
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Material::Air => "air",
            Material::Stone => "stone",
            Material::Brick => "brick",
            Material::Dirt => "dirt",
            Material::Grass => "grass",
            Material::Sand => "sand",
            Material::Glass => "glass",
            Material::Torch => "torch",
            Material::Tnt => "tnt",
            Material::Bedrock => "bedrock",
        };
        write!(f, "{}", name)
    }
}
