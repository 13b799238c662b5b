//! Face occlusion between neighboring cells.
//!
//! Used to cull faces that cannot be seen because the neighbor's shape covers
//! them completely.

use voxshape_core::constants::BIG_EPSILON;
use voxshape_core::{AxisDirection, BooleanOp, Direction};

use crate::shape::Shape;
use crate::shapes::{block, join_is_not_empty_raw, join_raw};

/// Whether `shape` and the `neighbor` on its `direction` side seal the
/// shared face between them, leaving no gap on either side.
pub fn block_occludes(shape: &Shape, neighbor: &Shape, direction: Direction) -> bool {
    let full = block();
    if shape.is_same(&full) && neighbor.is_same(&full) {
        return true;
    }
    if neighbor.is_empty() {
        return false;
    }

    let axis = direction.axis();
    let (lower, upper, op) = match direction.axis_direction() {
        AxisDirection::Positive => (shape, neighbor, BooleanOp::OnlyFirst),
        AxisDirection::Negative => (neighbor, shape, BooleanOp::OnlySecond),
    };

    (lower.max(axis) - 1.0).abs() <= BIG_EPSILON
        && upper.min(axis).abs() <= BIG_EPSILON
        && !join_is_not_empty_raw(
            &lower.slice(axis, lower.grid().size(axis) as isize - 1),
            &upper.slice(axis, 0),
            op,
        )
}

/// Whether two face slices together cover the whole unit face.
pub fn face_shape_occludes(first: &Shape, second: &Shape) -> bool {
    let full = block();
    if first.is_same(&full) || second.is_same(&full) {
        return true;
    }
    if first.is_empty() && second.is_empty() {
        return false;
    }
    !join_is_not_empty_raw(&full, &join_raw(first, second, BooleanOp::Or), BooleanOp::OnlyFirst)
}

/// [`face_shape_occludes`] applied to the touching faces of `shape` and the
/// `neighbor` on its `direction` side.
pub fn merged_face_occludes(shape: &Shape, neighbor: &Shape, direction: Direction) -> bool {
    let full = block();
    if shape.is_same(&full) && neighbor.is_same(&full) {
        return true;
    }
    face_shape_occludes(
        &shape.face_shape(direction),
        &neighbor.face_shape(direction.opposite()),
    )
}

/// Whether the `direction` face of `shape` covers the whole unit face.
pub fn is_face_full(shape: &Shape, direction: Direction) -> bool {
    !join_is_not_empty_raw(&block(), &shape.face_shape(direction), BooleanOp::NotSame)
}
