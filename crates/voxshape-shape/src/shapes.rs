//! Shape factories and the boolean combinator.

use std::sync::{Arc, OnceLock};

use glam::DVec3;
use tracing::debug;
use voxshape_core::constants::{EPSILON, MAX_CUBE_BITS};
use voxshape_core::{Aabb, Axis, BooleanOp, Error, Result};

use crate::bit_grid::BitGrid;
use crate::coord_axis::CoordAxis;
use crate::merger::{self, IndexMerger};
use crate::shape::{Shape, ShapeKind};

static EMPTY: OnceLock<Shape> = OnceLock::new();
static BLOCK: OnceLock<Shape> = OnceLock::new();
static INFINITY: OnceLock<Shape> = OnceLock::new();

/// The shape with no cells.
pub fn empty() -> Shape {
    EMPTY
        .get_or_init(|| {
            let axis = CoordAxis::points(vec![0.0]);
            Shape::from_parts(
                Arc::new(BitGrid::new(0, 0, 0)),
                [axis.clone(), axis.clone(), axis],
                ShapeKind::Array,
            )
        })
        .clone()
}

/// The full unit cube.
pub fn block() -> Shape {
    BLOCK
        .get_or_init(|| Shape::cube(BitGrid::with_filled_bounds([1; 3], [0; 3], [1; 3])))
        .clone()
}

/// The box covering all of space.
pub fn infinity() -> Shape {
    INFINITY
        .get_or_init(|| create(Aabb::new(DVec3::NEG_INFINITY, DVec3::INFINITY)))
        .clone()
}

/// Box shape from corner coordinates.
pub fn cuboid(
    min_x: f64,
    min_y: f64,
    min_z: f64,
    max_x: f64,
    max_y: f64,
    max_z: f64,
) -> Result<Shape> {
    let min = DVec3::new(min_x, min_y, min_z);
    let max = DVec3::new(max_x, max_y, max_z);
    if min.cmpgt(max).any() {
        return Err(Error::InvalidBounds { min, max });
    }
    Ok(create(Aabb::new(min, max)))
}

/// Box shape from an [`Aabb`].
///
/// Boxes thinner than [`EPSILON`] on any axis are empty. Boxes inside the
/// unit cell whose faces sit on a power-of-two grid (up to eighths) get a
/// compact uniform representation; anything else stores its corners.
pub fn create(aabb: Aabb) -> Shape {
    let size = aabb.size();
    if size.x < EPSILON || size.y < EPSILON || size.z < EPSILON {
        return empty();
    }

    let bits = Axis::ALL.map(|axis| find_bits(aabb.min_on(axis), aabb.max_on(axis)));
    let [Some(bx), Some(by), Some(bz)] = bits else {
        debug!(?aabb, "box not on a power-of-two grid, storing corners");
        let axes = Axis::ALL.map(|axis| {
            CoordAxis::points(vec![aabb.min_on(axis), aabb.max_on(axis)])
        });
        return Shape::from_parts(Arc::clone(block().grid_arc()), axes, ShapeKind::Array);
    };

    if bx == 0 && by == 0 && bz == 0 {
        return block();
    }

    let parts = [1usize << bx, 1usize << by, 1usize << bz];
    let min = Axis::ALL.map(|axis| (aabb.min_on(axis) * parts[axis.index()] as f64).round() as usize);
    let max = Axis::ALL.map(|axis| (aabb.max_on(axis) * parts[axis.index()] as f64).round() as usize);
    Shape::cube(BitGrid::with_filled_bounds(parts, min, max))
}

/// Smallest power-of-two subdivision on which both `min` and `max` lie.
fn find_bits(min: f64, max: f64) -> Option<u32> {
    if min < -EPSILON || max > 1.0 + EPSILON {
        return None;
    }
    (0..=MAX_CUBE_BITS).find(|&bits| {
        let parts = f64::from(1u32 << bits);
        let (lo, hi) = (min * parts, max * parts);
        (lo - lo.round()).abs() < EPSILON * parts && (hi - hi.round()).abs() < EPSILON * parts
    })
}

/// Union of two shapes.
pub fn or(first: &Shape, second: &Shape) -> Shape {
    join_raw(first, second, BooleanOp::Or).optimize()
}

/// Union of any number of shapes, optimized once at the end.
pub fn or_all<'a>(first: &Shape, rest: impl IntoIterator<Item = &'a Shape>) -> Shape {
    rest.into_iter()
        .fold(first.clone(), |acc, shape| join_raw(&acc, shape, BooleanOp::Or))
        .optimize()
}

/// Combine two shapes cell by cell and optimize the result.
///
/// Fails for operators that map `(false, false)` to `true`, whose result
/// would cover all of space.
#[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
pub fn join(first: &Shape, second: &Shape, op: BooleanOp) -> Result<Shape> {
    Ok(join_unoptimized(first, second, op)?.optimize())
}

/// [`join`] without the final [`Shape::optimize`].
pub fn join_unoptimized(first: &Shape, second: &Shape, op: BooleanOp) -> Result<Shape> {
    let op = op.ensure_bounded()?;
    Ok(join_raw(first, second, op))
}

/// Merged axes for `first` and `second`, each costed by the cells merged so far.
fn axis_mergers(first: &Shape, second: &Shape, op: BooleanOp) -> [merger::Merger; 3] {
    let (keep_first, keep_second) = (op.keeps_first_only(), op.keeps_second_only());
    let x = merger::create(1, first.coords(Axis::X), second.coords(Axis::X), keep_first, keep_second);
    let y = merger::create(
        x.size() - 1,
        first.coords(Axis::Y),
        second.coords(Axis::Y),
        keep_first,
        keep_second,
    );
    let z = merger::create(
        (x.size() - 1) * (y.size() - 1),
        first.coords(Axis::Z),
        second.coords(Axis::Z),
        keep_first,
        keep_second,
    );
    [x, y, z]
}

/// The combinator proper; `op` must already be known to be bounded.
pub(crate) fn join_raw(first: &Shape, second: &Shape, op: BooleanOp) -> Shape {
    if first.is_same(second) {
        return if op.apply(true, true) {
            first.clone()
        } else {
            empty()
        };
    }
    if first.is_empty() {
        return if op.keeps_second_only() {
            second.clone()
        } else {
            empty()
        };
    }
    if second.is_empty() {
        return if op.keeps_first_only() {
            first.clone()
        } else {
            empty()
        };
    }

    let [x, y, z] = axis_mergers(first, second, op);
    let (a, b) = (first.grid(), second.grid());
    let mut grid = BitGrid::new(x.size() - 1, y.size() - 1, z.size() - 1);
    x.for_merged_indexes(|x1, x2, xr| {
        y.for_merged_indexes(|y1, y2, yr| {
            z.for_merged_indexes(|z1, z2, zr| {
                if op.apply(a.is_full_wide(x1, y1, z1), b.is_full_wide(x2, y2, z2)) {
                    grid.fill(xr, yr, zr);
                }
                true
            })
        })
    });

    let axes = [x.list(), y.list(), z.list()];
    if axes.iter().all(CoordAxis::is_uniform) {
        Shape::cube(grid)
    } else {
        Shape::from_parts(Arc::new(grid), axes, ShapeKind::Array)
    }
}

/// Whether [`join`] would produce a non-empty shape, without building it.
#[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
pub fn join_is_not_empty(first: &Shape, second: &Shape, op: BooleanOp) -> Result<bool> {
    let op = op.ensure_bounded()?;
    Ok(join_is_not_empty_raw(first, second, op))
}

pub(crate) fn join_is_not_empty_raw(first: &Shape, second: &Shape, op: BooleanOp) -> bool {
    let (first_empty, second_empty) = (first.is_empty(), second.is_empty());
    if first_empty || second_empty {
        return op.apply(!first_empty, !second_empty);
    }
    if first.is_same(second) {
        return op.apply(true, true);
    }

    let keeps_either = op.keeps_first_only() || op.keeps_second_only();
    for axis in Axis::ALL {
        if first.max(axis) < second.min(axis) - EPSILON
            || second.max(axis) < first.min(axis) - EPSILON
        {
            return keeps_either;
        }
    }

    let [x, y, z] = axis_mergers(first, second, op);
    let (a, b) = (first.grid(), second.grid());
    !x.for_merged_indexes(|x1, x2, _| {
        y.for_merged_indexes(|y1, y2, _| {
            z.for_merged_indexes(|z1, z2, _| {
                !op.apply(a.is_full_wide(x1, y1, z1), b.is_full_wide(x2, y2, z2))
            })
        })
    })
}

/// Clamp a movement of `aabb` along `axis` against every shape in turn.
#[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
pub fn collide<'a>(
    axis: Axis,
    aabb: &Aabb,
    shapes: impl IntoIterator<Item = &'a Shape>,
    mut max_distance: f64,
) -> f64 {
    for shape in shapes {
        if max_distance.abs() < EPSILON {
            break;
        }
        max_distance = shape.collide(axis, aabb, max_distance);
    }
    max_distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quarter(x: f64, y: f64, z: f64) -> Shape {
        cuboid(x, y, z, x + 0.5, y + 0.5, z + 0.5).unwrap()
    }

    #[test]
    fn factories() {
        assert!(empty().is_empty());
        assert!(!block().is_empty());
        assert_eq!(block().kind(), ShapeKind::Cube);
        assert!(block().is_same(&block()));
        assert!(cuboid(0.0, 0.0, 0.0, 1.0, 1.0, 1.0).unwrap().is_same(&block()));
        assert!(cuboid(0.0, 0.0, 0.0, 1.0, 0.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn cuboid_rejects_inverted_bounds() {
        let err = cuboid(0.0, 1.0, 0.0, 1.0, 0.5, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { .. }));
    }

    #[test]
    fn snapped_boxes_are_cubes() {
        let s = cuboid(0.125, 0.0, 0.25, 0.5, 1.0, 0.75).unwrap();
        assert_eq!(s.kind(), ShapeKind::Cube);
        assert_eq!(s.grid().sizes(), [8, 1, 4]);
        assert_eq!(s.grid().count_full(), 3 * 2);
    }

    #[test]
    fn unsnapped_boxes_keep_corners() {
        let s = cuboid(0.1, 0.0, 0.0, 0.3, 1.0, 2.0).unwrap();
        assert_eq!(s.kind(), ShapeKind::Array);
        assert_eq!(s.grid().sizes(), [1, 1, 1]);
        let aabb = s.bounding_box().unwrap();
        assert_relative_eq!(aabb.min.x, 0.1);
        assert_relative_eq!(aabb.max.z, 2.0);
    }

    #[test]
    fn infinity_covers_everything() {
        let inf = infinity();
        assert!(inf.contains(DVec3::new(1.0e9, -1.0e9, 3.0)));
        assert_eq!(inf.min(Axis::X), f64::NEG_INFINITY);
        assert!(join_is_not_empty(&inf, &block(), BooleanOp::And).unwrap());
    }

    #[test]
    fn join_fast_paths() {
        let s = quarter(0.0, 0.0, 0.0);
        assert!(join(&s, &s, BooleanOp::Or).unwrap().contains(DVec3::splat(0.25)));
        assert!(join(&s, &s, BooleanOp::NotSame).unwrap().is_empty());
        assert!(join(&s, &empty(), BooleanOp::OnlySecond).unwrap().is_empty());
        assert!(join(&empty(), &s, BooleanOp::OnlySecond).unwrap().contains(DVec3::splat(0.25)));
    }

    #[test]
    fn join_rejects_unbounded_operators() {
        for op in [BooleanOp::True, BooleanOp::NotOr, BooleanOp::Same, BooleanOp::NotFirst] {
            assert_eq!(join(&block(), &empty(), op).unwrap_err(), Error::UnboundedOperator(op));
            assert!(join_is_not_empty(&block(), &empty(), op).is_err());
        }
    }

    #[test]
    fn union_and_difference() {
        let a = quarter(0.0, 0.0, 0.0);
        let b = quarter(0.5, 0.0, 0.0);
        let ab = or(&a, &b);
        assert!(ab.contains(DVec3::new(0.25, 0.25, 0.25)));
        assert!(ab.contains(DVec3::new(0.75, 0.25, 0.25)));
        assert!(!ab.contains(DVec3::new(0.75, 0.75, 0.25)));
        assert_eq!(ab.to_aabbs().len(), 1);

        let rest = join(&block(), &ab, BooleanOp::OnlyFirst).unwrap();
        assert!(!rest.contains(DVec3::new(0.25, 0.25, 0.25)));
        assert!(rest.contains(DVec3::new(0.25, 0.75, 0.25)));
        assert!(rest.contains(DVec3::new(0.25, 0.25, 0.75)));
    }

    #[test]
    fn join_mixed_representations() {
        let snapped = cuboid(0.0, 0.0, 0.0, 0.5, 1.0, 1.0).unwrap();
        let odd = cuboid(0.3, 0.0, 0.0, 0.7, 1.0, 1.0).unwrap();
        let both = join(&snapped, &odd, BooleanOp::And).unwrap();
        let aabb = both.bounding_box().unwrap();
        assert_relative_eq!(aabb.min.x, 0.3);
        assert_relative_eq!(aabb.max.x, 0.5);

        let union = or(&snapped, &odd);
        let aabb = union.bounding_box().unwrap();
        assert_relative_eq!(aabb.max.x, 0.7);
        assert_eq!(union.to_aabbs().len(), 1);
    }

    #[test]
    fn join_far_apart_shapes() {
        let a = block();
        let b = block().move_by(5.0, 0.0, 0.0);
        let union = or(&a, &b);
        assert!(union.contains(DVec3::splat(0.5)));
        assert!(union.contains(DVec3::new(5.5, 0.5, 0.5)));
        assert!(!union.contains(DVec3::new(3.0, 0.5, 0.5)));
        assert!(join(&a, &b, BooleanOp::And).unwrap().is_empty());
        assert!(!join_is_not_empty(&a, &b, BooleanOp::And).unwrap());
        assert!(join_is_not_empty(&a, &b, BooleanOp::OnlyFirst).unwrap());
    }

    #[test]
    fn or_all_matches_pairwise_or() {
        let parts = [quarter(0.5, 0.0, 0.0), quarter(0.0, 0.5, 0.0), quarter(0.0, 0.0, 0.5)];
        let first = quarter(0.0, 0.0, 0.0);
        let all = or_all(&first, &parts);
        let pairwise = parts.iter().fold(first, |acc, s| or(&acc, s));
        for point in [
            DVec3::splat(0.25),
            DVec3::new(0.75, 0.25, 0.25),
            DVec3::new(0.25, 0.75, 0.25),
            DVec3::new(0.25, 0.25, 0.75),
            DVec3::new(0.75, 0.75, 0.25),
        ] {
            assert_eq!(all.contains(point), pairwise.contains(point), "at {point}");
        }
    }

    #[test]
    fn join_unoptimized_keeps_fragments() {
        let a = quarter(0.0, 0.0, 0.0);
        let b = quarter(0.5, 0.0, 0.0);
        let raw = join_unoptimized(&a, &b, BooleanOp::Or).unwrap();
        assert_eq!(raw.grid().count_full(), 2);
        assert_eq!(or(&a, &b).grid().count_full(), 1);
    }

    #[test]
    fn collide_threads_distance_through_shapes() {
        let floor = cuboid(0.0, 0.0, 0.0, 1.0, 0.5, 1.0).unwrap();
        let ledge = block().move_by(0.0, 1.0, 0.0);
        let falling = Aabb::new(DVec3::new(0.25, 3.0, 0.25), DVec3::new(0.75, 4.0, 0.75));
        let shapes = [floor, ledge];
        assert_relative_eq!(collide(Axis::Y, &falling, &shapes, -10.0), -1.0);
        assert_relative_eq!(collide(Axis::Y, &falling, &shapes, 0.5), 0.5);
        assert_relative_eq!(collide(Axis::Y, &falling, std::iter::empty(), -10.0), -10.0);
    }
}
