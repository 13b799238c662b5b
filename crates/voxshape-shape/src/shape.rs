//! Immutable voxelized shapes.
//!
//! A [`Shape`] pairs a [`BitGrid`] with one [`CoordAxis`] per axis; full cell
//! `(x, y, z)` denotes the box between breakpoints `x..x + 1`, `y..y + 1` and
//! `z..z + 1`. Shapes are cheap to clone and safe to share across threads.

use std::fmt;
use std::sync::{Arc, OnceLock};

use glam::DVec3;
use tracing::trace;
use voxshape_core::constants::{EPSILON, RAY_NUDGE};
use voxshape_core::{
    Aabb, Axis, AxisCycle, AxisDirection, BlockHitResult, BlockPos, BooleanOp, Direction, Error,
    Result,
};

use crate::bit_grid::BitGrid;
use crate::coord_axis::CoordAxis;
use crate::shapes;

/// How a shape's coordinate axes are represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Every axis is a uniform subdivision of `[0, 1]`.
    Cube,
    /// Explicit breakpoints on at least one axis.
    Array,
    /// One layer cut out of another shape, spanning `[0, 1]` along the cut axis.
    Slice(Axis),
}

struct ShapeData {
    grid: Arc<BitGrid>,
    axes: [CoordAxis; 3],
    kind: ShapeKind,
    /// Memoized [`Shape::face_shape`] results, indexed by [`Direction::index`].
    faces: [OnceLock<Shape>; 6],
}

/// A set of axis-aligned boxes stored as an occupancy grid.
#[derive(Clone)]
pub struct Shape(Arc<ShapeData>);

impl Shape {
    pub(crate) fn from_parts(grid: Arc<BitGrid>, axes: [CoordAxis; 3], kind: ShapeKind) -> Self {
        debug_assert!(
            Axis::ALL
                .iter()
                .all(|&a| axes[a.index()].len() == grid.size(a) + 1),
            "axis lengths {:?} do not match grid {:?}",
            axes.each_ref().map(CoordAxis::len),
            grid.sizes()
        );
        Self(Arc::new(ShapeData {
            grid,
            axes,
            kind,
            faces: Default::default(),
        }))
    }

    /// Shape over uniform axes matching the grid's resolution.
    pub(crate) fn cube(grid: BitGrid) -> Self {
        let axes = grid.sizes().map(CoordAxis::Uniform);
        Self::from_parts(Arc::new(grid), axes, ShapeKind::Cube)
    }

    pub(crate) fn grid_arc(&self) -> &Arc<BitGrid> {
        &self.0.grid
    }

    /// The occupancy grid.
    #[inline]
    pub fn grid(&self) -> &BitGrid {
        &self.0.grid
    }

    /// Breakpoints along `axis`.
    #[inline]
    pub fn coords(&self, axis: Axis) -> &CoordAxis {
        &self.0.axes[axis.index()]
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.0.kind
    }

    /// Whether both handles point at the same shape.
    #[inline]
    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.grid.is_empty()
    }

    /// Cell index along `axis` containing `coord`, in `-1..=size`.
    #[inline]
    pub fn find_index(&self, axis: Axis, coord: f64) -> isize {
        self.coords(axis).find_index(coord)
    }

    /// Lowest occupied coordinate along `axis`, `+inf` when empty.
    pub fn min(&self, axis: Axis) -> f64 {
        let i = self.0.grid.first_full(axis);
        if i >= self.0.grid.size(axis) {
            f64::INFINITY
        } else {
            self.coords(axis).get(i)
        }
    }

    /// Highest occupied coordinate along `axis`, `-inf` when empty.
    pub fn max(&self, axis: Axis) -> f64 {
        let i = self.0.grid.last_full(axis);
        if i == 0 {
            f64::NEG_INFINITY
        } else {
            self.coords(axis).get(i)
        }
    }

    /// [`Shape::min`] restricted to the column through `primary` on the
    /// axis after `axis` and `secondary` on the one after that.
    pub fn min_in(&self, axis: Axis, primary: f64, secondary: f64) -> f64 {
        let i = self.find_index(AxisCycle::Forward.cycle_axis(axis), primary);
        let j = self.find_index(AxisCycle::Backward.cycle_axis(axis), secondary);
        let k = self.0.grid.first_full_in(axis, i, j);
        if k >= self.0.grid.size(axis) {
            f64::INFINITY
        } else {
            self.coords(axis).get(k)
        }
    }

    /// [`Shape::max`] restricted to a single column, see [`Shape::min_in`].
    pub fn max_in(&self, axis: Axis, primary: f64, secondary: f64) -> f64 {
        let i = self.find_index(AxisCycle::Forward.cycle_axis(axis), primary);
        let j = self.find_index(AxisCycle::Backward.cycle_axis(axis), secondary);
        let k = self.0.grid.last_full_in(axis, i, j);
        if k == 0 {
            f64::NEG_INFINITY
        } else {
            self.coords(axis).get(k)
        }
    }

    /// Tight bounds of the occupied cells.
    pub fn bounding_box(&self) -> Result<Aabb> {
        if self.is_empty() {
            return Err(Error::EmptyShape);
        }
        Ok(Aabb::new(
            DVec3::new(self.min(Axis::X), self.min(Axis::Y), self.min(Axis::Z)),
            DVec3::new(self.max(Axis::X), self.max(Axis::Y), self.max(Axis::Z)),
        ))
    }

    /// The bounding box as a shape of its own.
    pub fn single_encompassing(&self) -> Self {
        match self.bounding_box() {
            Ok(aabb) => shapes::create(aabb),
            Err(_) => shapes::empty(),
        }
    }

    /// Translate the shape. The grid is shared, only the axes are offset.
    pub fn move_by(&self, dx: f64, dy: f64, dz: f64) -> Self {
        if self.is_empty() {
            return shapes::empty();
        }
        let [x, y, z] = &self.0.axes;
        Self::from_parts(
            Arc::clone(&self.0.grid),
            [x.offset(dx), y.offset(dy), z.offset(dz)],
            ShapeKind::Array,
        )
    }

    /// Rebuild the shape from its box decomposition.
    ///
    /// Boolean results can subdivide axes far more finely than needed;
    /// re-unioning the boxes collapses redundant breakpoints.
    #[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
    pub fn optimize(&self) -> Self {
        let mut result = shapes::empty();
        let mut boxes = 0usize;
        self.for_all_boxes(|min, max| {
            boxes += 1;
            result = shapes::join_raw(&result, &shapes::create(Aabb::new(min, max)), BooleanOp::Or);
        });
        trace!(
            boxes,
            before = ?self.grid().sizes(),
            after = ?result.grid().sizes(),
            "optimized shape"
        );
        result
    }

    /// Emit a box decomposition `(min, max)` covering the shape exactly.
    pub fn for_all_boxes(&self, mut consumer: impl FnMut(DVec3, DVec3)) {
        self.0.grid.for_all_boxes(
            |min, max| consumer(self.point_at(min), self.point_at(max)),
            true,
        );
    }

    /// Emit the shape's edges as segments.
    pub fn for_all_edges(&self, mut consumer: impl FnMut(DVec3, DVec3)) {
        self.0.grid.for_all_edges(
            |from, to| consumer(self.point_at(from), self.point_at(to)),
            true,
        );
    }

    /// Box decomposition as a list.
    pub fn to_aabbs(&self) -> Vec<Aabb> {
        let mut boxes = Vec::new();
        self.for_all_boxes(|min, max| boxes.push(Aabb::new(min, max)));
        boxes
    }

    fn point_at(&self, [x, y, z]: [usize; 3]) -> DVec3 {
        DVec3::new(
            self.coords(Axis::X).get(x),
            self.coords(Axis::Y).get(y),
            self.coords(Axis::Z).get(z),
        )
    }

    /// Whether `point` lies in a full cell (cells are half-open).
    pub fn contains(&self, point: DVec3) -> bool {
        self.0.grid.is_full_wide(
            self.find_index(Axis::X, point.x),
            self.find_index(Axis::Y, point.y),
            self.find_index(Axis::Z, point.z),
        )
    }

    /// One-cell-thick layer `index` along `axis`, stretched to `[0, 1]` on that axis.
    pub fn slice(&self, axis: Axis, index: isize) -> Self {
        let mut axes = self.0.axes.clone();
        axes[axis.index()] = CoordAxis::Uniform(1);
        Self::from_parts(
            Arc::new(self.0.grid.slice(axis, index)),
            axes,
            ShapeKind::Slice(axis),
        )
    }

    fn is_cube_like_along(&self, axis: Axis) -> bool {
        self.coords(axis).is_unit_span(EPSILON)
    }

    fn is_cube_like(&self) -> bool {
        Axis::ALL.into_iter().all(|axis| self.is_cube_like_along(axis))
    }

    /// The part of the shape touching the `direction` face of its cell,
    /// flattened to a slice.
    ///
    /// Computed on first use and cached.
    pub fn face_shape(&self, direction: Direction) -> Self {
        if self.is_empty() || self.is_cube_like_along(direction.axis()) {
            return self.clone();
        }
        self.0.faces[direction.index()]
            .get_or_init(|| self.calculate_face(direction))
            .clone()
    }

    fn calculate_face(&self, direction: Direction) -> Self {
        let axis = direction.axis();
        let probe = match direction.axis_direction() {
            AxisDirection::Positive => 1.0 - EPSILON,
            AxisDirection::Negative => EPSILON,
        };
        let slice = self.slice(axis, self.find_index(axis, probe));
        if slice.is_empty() {
            shapes::empty()
        } else if slice.is_cube_like() {
            shapes::block()
        } else {
            slice
        }
    }

    /// Furthest distance `aabb` can travel along `axis`, up to `max_distance`,
    /// before touching this shape.
    ///
    /// The result has the sign of `max_distance` and never a larger magnitude.
    #[cfg_attr(feature = "profiling", tracing::instrument(level = "trace", skip_all))]
    pub fn collide(&self, axis: Axis, aabb: &Aabb, max_distance: f64) -> f64 {
        if self.is_empty() || max_distance.abs() < EPSILON {
            return max_distance;
        }

        let inverse = AxisCycle::between(axis, Axis::X).inverse();
        let depth = inverse.cycle_axis(Axis::X);
        let width = inverse.cycle_axis(Axis::Y);
        let height = inverse.cycle_axis(Axis::Z);
        let grid = &self.0.grid;

        let front = aabb.max_on(depth);
        let back = aabb.min_on(depth);
        let first = self.find_index(depth, back + EPSILON);
        let last = self.find_index(depth, front - EPSILON);

        let width_min = self.find_index(width, aabb.min_on(width) + EPSILON).max(0);
        let width_max = (self.find_index(width, aabb.max_on(width) - EPSILON) + 1)
            .min(grid.size(width) as isize);
        let height_min = self.find_index(height, aabb.min_on(height) + EPSILON).max(0);
        let height_max = (self.find_index(height, aabb.max_on(height) - EPSILON) + 1)
            .min(grid.size(height) as isize);

        let blocked = |layer: isize| {
            (width_min..width_max)
                .any(|q| (height_min..height_max).any(|r| grid.is_full_cycled(inverse, layer, q, r)))
        };

        let mut distance = max_distance;
        if max_distance > 0.0 {
            let depth_size = grid.size(depth) as isize;
            if let Some(layer) = (last + 1..depth_size).find(|&p| blocked(p)) {
                let gap = self.coords(depth).get(layer as usize) - front;
                if gap >= -EPSILON {
                    distance = distance.min(gap.max(0.0));
                }
            }
        } else if let Some(layer) = (0..first).rev().find(|&p| blocked(p)) {
            let gap = self.coords(depth).get(layer as usize + 1) - back;
            if gap <= EPSILON {
                distance = distance.max(gap.min(0.0));
            }
        }
        distance
    }

    /// Trace the segment `from -> to` against this shape placed at `pos`.
    ///
    /// A segment starting inside a full cell reports an `inside` hit at the
    /// start. Returns `None` for empty shapes, near-zero segments and misses.
    pub fn clip(&self, from: DVec3, to: DVec3, pos: BlockPos) -> Option<BlockHitResult> {
        if self.is_empty() {
            return None;
        }
        let delta = to - from;
        if delta.length_squared() < EPSILON {
            return None;
        }

        let start = from + delta * RAY_NUDGE;
        if self.contains(start - pos.to_dvec3()) {
            return Some(BlockHitResult {
                location: start,
                direction: Direction::nearest(delta).opposite(),
                block_pos: pos,
                inside: true,
            });
        }
        Aabb::clip_all(&self.to_aabbs(), from, to, pos)
    }

    /// Nearest point of the shape to `target`, or `None` when empty.
    pub fn closest_point_to(&self, target: DVec3) -> Option<DVec3> {
        let mut best: Option<DVec3> = None;
        self.for_all_boxes(|min, max| {
            let candidate = target.clamp(min, max);
            if best.map_or(true, |b| target.distance_squared(candidate) < target.distance_squared(b)) {
                best = Some(candidate);
            }
        });
        best
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("kind", &self.0.kind)
            .field("cells", &self.0.grid.sizes())
            .field("bounds", &self.bounding_box().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{block, cuboid, empty};
    use approx::assert_relative_eq;

    fn slab() -> Shape {
        cuboid(0.0, 0.0, 0.0, 1.0, 0.5, 1.0).unwrap()
    }

    #[test]
    fn shape_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Shape>();
    }

    #[test]
    fn empty_bounds_are_infinite() {
        let e = empty();
        assert!(e.is_empty());
        assert_eq!(e.min(Axis::X), f64::INFINITY);
        assert_eq!(e.max(Axis::Y), f64::NEG_INFINITY);
        assert_eq!(e.bounding_box(), Err(Error::EmptyShape));
    }

    #[test]
    fn slab_bounds() {
        let s = slab();
        assert_eq!(s.kind(), ShapeKind::Cube);
        assert_relative_eq!(s.min(Axis::Y), 0.0);
        assert_relative_eq!(s.max(Axis::Y), 0.5);
        assert_relative_eq!(s.max(Axis::X), 1.0);
        let aabb = s.bounding_box().unwrap();
        assert_relative_eq!(aabb.max.y, 0.5);
    }

    #[test]
    fn windowed_bounds() {
        // An L: full bottom half, plus the top half of the west column
        let l = shapes::or(&slab(), &cuboid(0.0, 0.5, 0.0, 0.5, 1.0, 1.0).unwrap());
        // Columns along Y are addressed by (z, x)
        assert_relative_eq!(l.max_in(Axis::Y, 0.75, 0.75), 0.5);
        assert_relative_eq!(l.max_in(Axis::Y, 0.75, 0.25), 1.0);
        assert_relative_eq!(l.min_in(Axis::Y, 0.25, 0.25), 0.0);
        assert_eq!(l.min_in(Axis::Y, 5.0, 0.5), f64::INFINITY);
    }

    #[test]
    fn move_shares_grid() {
        let s = slab();
        let moved = s.move_by(1.0, 2.0, 3.0);
        assert!(Arc::ptr_eq(s.grid_arc(), moved.grid_arc()));
        assert_eq!(moved.kind(), ShapeKind::Array);
        let aabb = moved.bounding_box().unwrap();
        assert_relative_eq!(aabb.min.x, 1.0);
        assert_relative_eq!(aabb.max.y, 2.5);
        assert_relative_eq!(aabb.max.z, 4.0);
        assert!(empty().move_by(1.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let s = slab();
        assert!(s.contains(DVec3::new(0.5, 0.25, 0.5)));
        assert!(s.contains(DVec3::ZERO));
        assert!(!s.contains(DVec3::new(0.5, 0.5, 0.5)));
        assert!(!s.contains(DVec3::new(-0.1, 0.25, 0.5)));
    }

    #[test]
    fn single_encompassing_fills_bounds() {
        let l = shapes::or(
            &cuboid(0.0, 0.0, 0.0, 0.25, 0.25, 0.25).unwrap(),
            &cuboid(0.75, 0.75, 0.75, 1.0, 1.0, 1.0).unwrap(),
        );
        let hull = l.single_encompassing();
        assert!(hull.contains(DVec3::splat(0.5)));
        assert!(!l.contains(DVec3::splat(0.5)));
        assert!(empty().single_encompassing().is_empty());
    }

    #[test]
    fn to_aabbs_of_block() {
        assert_eq!(block().to_aabbs(), vec![Aabb::new(DVec3::ZERO, DVec3::ONE)]);
        assert!(empty().to_aabbs().is_empty());
    }

    #[test]
    fn block_has_twelve_edges() {
        let mut edges = 0;
        block().for_all_edges(|from, to| {
            assert_relative_eq!(from.distance(to), 1.0);
            edges += 1;
        });
        assert_eq!(edges, 12);
    }

    #[test]
    fn face_shapes() {
        let s = slab();
        // Spans the whole cell along X and Z
        assert!(s.face_shape(Direction::East).is_same(&s));
        assert!(s.face_shape(Direction::Down).is_same(&block()));
        assert!(s.face_shape(Direction::Up).is_empty());

        // Stair: bottom half plus the north half of the top
        let stair = shapes::or(&s, &cuboid(0.0, 0.5, 0.0, 1.0, 1.0, 0.5).unwrap());
        let top = stair.face_shape(Direction::Up);
        assert_eq!(top.kind(), ShapeKind::Slice(Axis::Y));
        assert_relative_eq!(top.min(Axis::Y), 0.0);
        assert_relative_eq!(top.max(Axis::Y), 1.0);
        assert_relative_eq!(top.max(Axis::Z), 0.5);
        // Cached
        assert!(stair.face_shape(Direction::Up).is_same(&top));
        assert!(!stair.face_shape(Direction::Down).is_empty());
        assert!(empty().face_shape(Direction::Up).is_empty());
    }

    #[test]
    fn collide_stops_at_surface() {
        let s = slab();
        let falling = Aabb::new(DVec3::new(0.25, 1.0, 0.25), DVec3::new(0.75, 2.0, 0.75));
        assert_relative_eq!(s.collide(Axis::Y, &falling, -3.0), -0.5);
        assert_relative_eq!(s.collide(Axis::Y, &falling, -0.25), -0.25);
        assert_relative_eq!(s.collide(Axis::Y, &falling, 2.0), 2.0);

        let beside = Aabb::new(DVec3::new(-1.0, 0.0, 0.0), DVec3::new(0.0, 0.5, 1.0));
        assert_relative_eq!(s.collide(Axis::X, &beside, 5.0), 0.0);
        assert_relative_eq!(s.collide(Axis::X, &beside, -5.0), -5.0);

        let beyond = Aabb::new(DVec3::new(0.0, 0.0, 3.0), DVec3::new(1.0, 0.5, 4.0));
        assert_relative_eq!(s.collide(Axis::Z, &beyond, -5.0), -2.0);
    }

    #[test]
    fn collide_ignores_shapes_outside_the_path() {
        let s = slab();
        let aside = Aabb::new(DVec3::new(2.0, 1.0, 0.0), DVec3::new(3.0, 2.0, 1.0));
        assert_relative_eq!(s.collide(Axis::Y, &aside, -4.0), -4.0);
        assert_relative_eq!(empty().collide(Axis::Y, &aside, -4.0), -4.0);
        assert_relative_eq!(s.collide(Axis::Y, &aside, 1.0e-9), 1.0e-9);
    }

    #[test]
    fn clip_block_from_above() {
        let hit = block()
            .clip(DVec3::new(0.5, 2.0, 0.5), DVec3::new(0.5, -1.0, 0.5), BlockPos::ORIGIN)
            .unwrap();
        assert_eq!(hit.direction, Direction::Up);
        assert!(!hit.inside);
        assert_relative_eq!(hit.location.y, 1.0);
    }

    #[test]
    fn clip_from_inside() {
        let pos = BlockPos::new(4, 0, 0);
        let hit = block()
            .clip(DVec3::new(4.5, 0.5, 0.5), DVec3::new(4.5, 0.5, 3.0), pos)
            .unwrap();
        assert!(hit.inside);
        assert_eq!(hit.direction, Direction::North);
        assert_eq!(hit.block_pos, pos);
    }

    #[test]
    fn clip_misses() {
        let origin = BlockPos::ORIGIN;
        assert!(block()
            .clip(DVec3::new(2.0, 2.0, 2.0), DVec3::new(3.0, 2.0, 2.0), origin)
            .is_none());
        assert!(block()
            .clip(DVec3::new(-1.0, 0.5, 0.5), DVec3::new(-1.0, 0.5, 0.5), origin)
            .is_none());
        assert!(empty()
            .clip(DVec3::new(-1.0, 0.5, 0.5), DVec3::new(2.0, 0.5, 0.5), origin)
            .is_none());
    }

    #[test]
    fn closest_point() {
        let s = slab();
        let p = s.closest_point_to(DVec3::new(0.5, 3.0, -1.0)).unwrap();
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 0.5);
        assert_relative_eq!(p.z, 0.0);
        assert!(empty().closest_point_to(DVec3::ZERO).is_none());
    }

    #[test]
    fn optimize_collapses_fragments() {
        let a = cuboid(0.0, 0.0, 0.0, 0.5, 1.0, 1.0).unwrap();
        let b = cuboid(0.5, 0.0, 0.0, 1.0, 1.0, 1.0).unwrap();
        let raw = shapes::join_unoptimized(&a, &b, BooleanOp::Or).unwrap();
        assert_eq!(raw.grid().count_full(), 2);
        let optimized = raw.optimize();
        assert_eq!(optimized.to_aabbs(), vec![Aabb::new(DVec3::ZERO, DVec3::ONE)]);
    }
}
