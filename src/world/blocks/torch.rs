use serde::{Deserialize, Serialize};

use crate::constants::light::TORCH_LIGHT_RADIUS;
use crate::world::Location;

/// A point light owned by a chunk, consumed by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl LightSource {
    /// Light emitted by a torch at the given world block
    pub fn torch(location: Location) -> Self {
        Self {
            x: location.x as f32 + 0.5,
            y: location.y as f32 + 0.5,
            radius: TORCH_LIGHT_RADIUS,
        }
    }
}
