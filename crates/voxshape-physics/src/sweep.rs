//! Movement resolution against static shapes.

use glam::DVec3;
use tracing::trace;
use voxshape_core::{Aabb, Axis};
use voxshape_shape::{collide, Shape};

/// Clamp `movement` of `aabb` so the box does not enter any of `shapes`.
///
/// Shapes are in the same space as the box. Axes are resolved one at a time:
/// Y first, then the horizontal axis with the smaller movement, then the
/// larger one, moving the box after each step.
#[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
pub fn collide_movement(movement: DVec3, aabb: &Aabb, shapes: &[Shape]) -> DVec3 {
    if shapes.is_empty() {
        return movement;
    }

    let mut aabb = *aabb;
    let DVec3 {
        x: mut dx,
        y: mut dy,
        z: mut dz,
    } = movement;

    if dy != 0.0 {
        dy = collide(Axis::Y, &aabb, shapes, dy);
        if dy != 0.0 {
            aabb = aabb.translated(DVec3::new(0.0, dy, 0.0));
        }
    }

    let z_first = dx.abs() < dz.abs();
    if z_first && dz != 0.0 {
        dz = collide(Axis::Z, &aabb, shapes, dz);
        if dz != 0.0 {
            aabb = aabb.translated(DVec3::new(0.0, 0.0, dz));
        }
    }

    if dx != 0.0 {
        dx = collide(Axis::X, &aabb, shapes, dx);
        if !z_first && dx != 0.0 {
            aabb = aabb.translated(DVec3::new(dx, 0.0, 0.0));
        }
    }

    if !z_first && dz != 0.0 {
        dz = collide(Axis::Z, &aabb, shapes, dz);
    }

    let resolved = DVec3::new(dx, dy, dz);
    if resolved != movement {
        trace!(?movement, ?resolved, "movement clamped");
    }
    resolved
}
