//! Collision filtering bits for fixtures

/// Category bits a fixture can belong to
pub mod category {
    /// Terrain edges entities stand on
    pub const GROUND: u16 = 0x0001;
    /// Terrain that casts shadows for the light system
    pub const LIGHTS: u16 = 0x0002;
    pub const ENTITY: u16 = 0x0004;
    pub const FALLING_BLOCK: u16 = 0x0008;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filter {
    pub category: u16,
    pub mask: u16,
}

impl Filter {
    pub const fn new(category: u16, mask: u16) -> Self {
        Self { category, mask }
    }

    /// Both fixtures must accept each other's category
    pub fn collides_with(&self, other: &Filter) -> bool {
        (self.category & other.mask) != 0 && (other.category & self.mask) != 0
    }

    pub fn is_ground(&self) -> bool {
        self.category & category::GROUND != 0
    }
}

/// Terrain edge of a block that blocks light
pub const SOLID_OPAQUE: Filter = Filter::new(
    category::GROUND | category::LIGHTS,
    category::ENTITY | category::FALLING_BLOCK | category::LIGHTS,
);

/// Terrain edge of a block light passes through
pub const SOLID_TRANSPARENT: Filter = Filter::new(
    category::GROUND,
    category::ENTITY | category::FALLING_BLOCK,
);

pub const ENTITY: Filter = Filter::new(category::ENTITY, category::GROUND | category::ENTITY);

pub const FALLING_BLOCK: Filter = Filter::new(category::FALLING_BLOCK, category::GROUND);

/// Light rays, used by the shadow system to query opaque terrain
pub const LIGHT_RAY: Filter = Filter::new(category::LIGHTS, category::LIGHTS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_only_hits_opaque_terrain() {
        assert!(LIGHT_RAY.collides_with(&SOLID_OPAQUE));
        assert!(!LIGHT_RAY.collides_with(&SOLID_TRANSPARENT));
    }

    #[test]
    fn test_bodies_collide_with_all_terrain() {
        for terrain in [SOLID_OPAQUE, SOLID_TRANSPARENT] {
            assert!(ENTITY.collides_with(&terrain));
            assert!(FALLING_BLOCK.collides_with(&terrain));
            assert!(terrain.is_ground());
        }
        assert!(!FALLING_BLOCK.collides_with(&ENTITY));
    }
}
