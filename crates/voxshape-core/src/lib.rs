//! Core types, math, and traits for the voxshape engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - Axis algebra (axes, axis cycles, directions)
//! - Axis-aligned boxes and segment clipping
//! - Cell coordinates
//! - The closed table of boolean operators
//! - Common error types and numeric tolerances

pub mod coords;
pub mod error;
pub mod math;
pub mod op;

pub use coords::BlockPos;
pub use error::{Error, Result};
pub use math::{Aabb, Axis, AxisCycle, AxisDirection, BlockHitResult, Direction};
pub use op::BooleanOp;

/// Engine-wide constants
pub mod constants {
    /// Tolerance used for coordinate comparisons.
    pub const EPSILON: f64 = 1.0e-7;
    /// Looser tolerance used when testing whether a face is flush with a cell boundary.
    pub const BIG_EPSILON: f64 = 1.0e-6;
    /// Upper bound on `cells * lcm(a, b)` for merging two uniform axes arithmetically.
    pub const CUBE_MERGE_LIMIT: u64 = 256;
    /// Deepest power-of-two subdivision (2^3 = 8 parts) a box is snapped to.
    pub const MAX_CUBE_BITS: u32 = 3;
    /// Fraction of a ray segment advanced before the inside-cell test.
    pub const RAY_NUDGE: f64 = 0.001;
}
