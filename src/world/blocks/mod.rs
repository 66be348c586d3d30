//! Block behaviors attached to specific materials

pub mod sand;
pub mod tnt;
pub mod torch;

pub use sand::SandBlock;
pub use tnt::TntBlock;
pub use torch::LightSource;

use crate::world::block::TickingBlock;
use crate::world::Material;

/// Fresh tick behavior for a newly placed block of `material`
pub fn create_behavior(material: Material) -> Option<Box<dyn TickingBlock>> {
    match material {
        Material::Tnt => Some(Box::new(TntBlock::new())),
        Material::Sand => Some(Box::new(SandBlock::new())),
        _ => None,
    }
}
