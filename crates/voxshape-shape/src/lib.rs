//! Voxelized shape engine.
//!
//! Shapes are unions of axis-aligned boxes stored as an occupancy grid over
//! per-axis breakpoints. This crate provides:
//! - Factories for boxes, the unit block and the empty shape
//! - Boolean combination of shapes under any bounded operator
//! - Sweep collision of moving boxes against shapes
//! - Segment clipping and closest-point queries
//! - Face extraction and occlusion tests between neighboring cells

pub mod bit_grid;
pub mod coord_axis;
pub mod merger;
pub mod occlusion;
pub mod shape;
pub mod shapes;


pub use bit_grid::BitGrid;
pub use coord_axis::CoordAxis;
pub use merger::IndexMerger;
pub use occlusion::{block_occludes, face_shape_occludes, is_face_full, merged_face_occludes};
pub use shape::{Shape, ShapeKind};
pub use shapes::{
    block, collide, create, cuboid, empty, infinity, join, join_is_not_empty, join_unoptimized,
    or, or_all,
};
