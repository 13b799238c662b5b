//! Error types for the engine.

use glam::DVec3;
use thiserror::Error;

use crate::op::BooleanOp;

/// Engine-wide error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Box factory called with a min corner above the max corner
    #[error("Invalid bounds: min {min} must not exceed max {max}")]
    InvalidBounds { min: DVec3, max: DVec3 },

    /// Operator that would produce an unbounded result
    #[error("Unbounded operator: {0:?} maps (false, false) to true")]
    UnboundedOperator(BooleanOp),

    /// Bounds requested for a shape with no full cells
    #[error("No bounds for empty shape")]
    EmptyShape,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
