//! Ray casts against shapes placed in cells.

use glam::DVec3;
use voxshape_core::{BlockPos, Direction};
use voxshape_shape::Shape;

/// A cell-local shape placed at a cell position.
#[derive(Debug, Clone)]
pub struct PlacedShape {
    pub pos: BlockPos,
    pub shape: Shape,
}

impl PlacedShape {
    pub fn new(pos: BlockPos, shape: Shape) -> Self {
        Self { pos, shape }
    }

    /// The shape translated into world space.
    pub fn world_shape(&self) -> Shape {
        let origin = self.pos.to_dvec3();
        self.shape.move_by(origin.x, origin.y, origin.z)
    }
}

/// Result of a raycast against voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// World-space hit position
    pub position: DVec3,
    /// Face that was hit
    pub normal: Direction,
    /// Distance from the ray start
    pub distance: f64,
    /// Cell of the shape that was hit
    pub block_position: BlockPos,
    /// The ray started inside the shape
    pub inside: bool,
}

/// Nearest hit of the segment `from -> to` over all placed shapes.
pub fn raycast<'a>(
    from: DVec3,
    to: DVec3,
    placed: impl IntoIterator<Item = &'a PlacedShape>,
) -> Option<RaycastHit> {
    placed
        .into_iter()
        .filter_map(|p| p.shape.clip(from, to, p.pos))
        .map(|hit| RaycastHit {
            position: hit.location,
            normal: hit.direction,
            distance: from.distance(hit.location),
            block_position: hit.block_pos,
            inside: hit.inside,
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
