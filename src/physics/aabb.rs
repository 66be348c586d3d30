use cgmath::{Point2, Vector2};

/// Axis-aligned bounding box in world block units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

/// Create a new AABB from min and max points
pub fn create_aabb(min: Point2<f32>, max: Point2<f32>) -> Aabb {
    Aabb { min, max }
}

/// Create AABB from center point and half extents
pub fn aabb_from_center_half_extents(center: Point2<f32>, half_extents: Vector2<f32>) -> Aabb {
    Aabb {
        min: center - half_extents,
        max: center + half_extents,
    }
}

/// Check whether two AABBs overlap with a positive area.
///
/// Boxes that only share a side do not intersect.
pub fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Smallest AABB containing both inputs
pub fn aabb_union(a: &Aabb, b: &Aabb) -> Aabb {
    Aabb {
        min: Point2::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
        max: Point2::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
    }
}

/// Grow an AABB by `margin` on every side
pub fn aabb_expanded(aabb: &Aabb, margin: f32) -> Aabb {
    Aabb {
        min: Point2::new(aabb.min.x - margin, aabb.min.y - margin),
        max: Point2::new(aabb.max.x + margin, aabb.max.y + margin),
    }
}

/// Integer cells whose unit squares overlap the AABB with positive area
pub fn aabb_overlapping_cells(aabb: &Aabb) -> impl Iterator<Item = (i32, i32)> {
    let min_x = aabb.min.x.floor() as i32;
    let min_y = aabb.min.y.floor() as i32;
    let max_x = (aabb.max.x.ceil() as i32 - 1).max(min_x);
    let max_y = (aabb.max.y.ceil() as i32 - 1).max(min_y);
    (min_x..=max_x).flat_map(move |x| (min_y..=max_y).map(move |y| (x, y)))
}
