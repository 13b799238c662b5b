//! Math utilities and helpers.

use glam::DVec3;

use crate::constants::EPSILON;
use crate::coords::BlockPos;

/// Coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Index of the axis (X = 0, Y = 1, Z = 2)
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Pick the component belonging to this axis
    #[inline]
    pub fn choose<T>(self, x: T, y: T, z: T) -> T {
        match self {
            Self::X => x,
            Self::Y => y,
            Self::Z => z,
        }
    }

    /// Component of a vector along this axis
    #[inline]
    pub const fn of(self, v: DVec3) -> f64 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }
}

/// Rotation of the axis triple (X, Y, Z).
///
/// Lets a single routine written for one axis serve all three: `Forward`
/// maps X to Y, Y to Z and Z to X, `Backward` undoes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisCycle {
    None,
    Forward,
    Backward,
}

impl AxisCycle {
    /// The cycle that undoes this one
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// Axis that `axis` is rotated onto
    #[inline]
    pub const fn cycle_axis(self, axis: Axis) -> Axis {
        match (self, axis) {
            (Self::None, a) => a,
            (Self::Forward, Axis::X) | (Self::Backward, Axis::Z) => Axis::Y,
            (Self::Forward, Axis::Y) | (Self::Backward, Axis::X) => Axis::Z,
            (Self::Forward, Axis::Z) | (Self::Backward, Axis::Y) => Axis::X,
        }
    }

    /// Component `axis` of the rotated triple `(x, y, z)`
    #[inline]
    pub fn cycle<T>(self, x: T, y: T, z: T, axis: Axis) -> T {
        match self {
            Self::None => axis.choose(x, y, z),
            Self::Forward => axis.choose(z, x, y),
            Self::Backward => axis.choose(y, z, x),
        }
    }

    /// Whole rotated triple as `[x, y, z]`
    #[inline]
    pub fn cycle_all<T: Copy>(self, x: T, y: T, z: T) -> [T; 3] {
        match self {
            Self::None => [x, y, z],
            Self::Forward => [z, x, y],
            Self::Backward => [y, z, x],
        }
    }

    /// Cycle that rotates `from` onto `to`
    #[inline]
    pub const fn between(from: Axis, to: Axis) -> Self {
        match (to.index() + 3 - from.index()) % 3 {
            0 => Self::None,
            1 => Self::Forward,
            _ => Self::Backward,
        }
    }
}

/// Sign of a direction along its axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    Positive,
    Negative,
}

impl AxisDirection {
    /// +1 or -1
    #[inline]
    pub const fn step(self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }
}

/// One of the six faces of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Y
    Down,
    /// +Y
    Up,
    /// -Z
    North,
    /// +Z
    South,
    /// -X
    West,
    /// +X
    East,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Self; 6] = [
        Self::Down,
        Self::Up,
        Self::North,
        Self::South,
        Self::West,
        Self::East,
    ];

    /// Index of the direction within [`Direction::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Down | Self::Up => Axis::Y,
            Self::North | Self::South => Axis::Z,
            Self::West | Self::East => Axis::X,
        }
    }

    #[inline]
    pub const fn axis_direction(self) -> AxisDirection {
        match self {
            Self::Up | Self::South | Self::East => AxisDirection::Positive,
            Self::Down | Self::North | Self::West => AxisDirection::Negative,
        }
    }

    /// Direction along `axis` with the given sign
    #[inline]
    pub const fn from_axis(axis: Axis, direction: AxisDirection) -> Self {
        match (axis, direction) {
            (Axis::X, AxisDirection::Positive) => Self::East,
            (Axis::X, AxisDirection::Negative) => Self::West,
            (Axis::Y, AxisDirection::Positive) => Self::Up,
            (Axis::Y, AxisDirection::Negative) => Self::Down,
            (Axis::Z, AxisDirection::Positive) => Self::South,
            (Axis::Z, AxisDirection::Negative) => Self::North,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Integer step towards the neighboring cell
    #[inline]
    pub const fn step(self) -> [i32; 3] {
        let s = self.axis_direction().step();
        match self.axis() {
            Axis::X => [s, 0, 0],
            Axis::Y => [0, s, 0],
            Axis::Z => [0, 0, s],
        }
    }

    /// Unit normal of the face
    #[inline]
    pub fn normal(self) -> DVec3 {
        let [x, y, z] = self.step();
        DVec3::new(f64::from(x), f64::from(y), f64::from(z))
    }

    /// Direction whose normal is most aligned with `v`.
    ///
    /// Ties resolve to the earliest direction in [`Direction::ALL`];
    /// a zero vector yields `North`.
    pub fn nearest(v: DVec3) -> Self {
        let mut best = Self::North;
        let mut best_dot = f64::MIN;
        for direction in Self::ALL {
            let dot = direction.normal().dot(v);
            if dot > best_dot {
                best_dot = dot;
                best = direction;
            }
        }
        best
    }
}

/// Axis-Aligned Bounding Box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Get the size of the AABB
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Minimum coordinate along `axis`
    #[inline]
    pub const fn min_on(&self, axis: Axis) -> f64 {
        axis.of(self.min)
    }

    /// Maximum coordinate along `axis`
    #[inline]
    pub const fn max_on(&self, axis: Axis) -> f64 {
        axis.of(self.max)
    }

    /// Translate by an offset
    #[inline]
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Check if a point is inside the AABB
    #[inline]
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB overlaps another with positive volume
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Point where the segment `from -> to` first enters this box
    pub fn clip(&self, from: DVec3, to: DVec3) -> Option<DVec3> {
        let delta = to - from;
        let mut t = 1.0;
        clip_box(self, from, delta, &mut t, None)?;
        Some(from + delta * t)
    }

    /// Nearest entry of the segment `from -> to` into any box of `boxes`.
    ///
    /// Boxes are given relative to `pos`; the hit carries the face that was
    /// crossed. Returns `None` if no box is entered within the segment.
    pub fn clip_all(
        boxes: &[Self],
        from: DVec3,
        to: DVec3,
        pos: BlockPos,
    ) -> Option<BlockHitResult> {
        let delta = to - from;
        let origin = pos.to_dvec3();
        let mut t = 1.0;
        let mut face = None;
        for aabb in boxes {
            face = clip_box(&aabb.translated(origin), from, delta, &mut t, face);
        }
        face.map(|direction| BlockHitResult {
            location: from + delta * t,
            direction,
            block_pos: pos,
            inside: false,
        })
    }
}

/// Test the three entry planes of `aabb` that face the segment.
fn clip_box(
    aabb: &Aabb,
    from: DVec3,
    delta: DVec3,
    t: &mut f64,
    mut face: Option<Direction>,
) -> Option<Direction> {
    for axis in Axis::ALL {
        let d = axis.of(delta);
        let (plane, direction) = if d > EPSILON {
            (aabb.min_on(axis), Direction::from_axis(axis, AxisDirection::Negative))
        } else if d < -EPSILON {
            (aabb.max_on(axis), Direction::from_axis(axis, AxisDirection::Positive))
        } else {
            continue;
        };
        if clip_plane(aabb, from, delta, axis, plane, t) {
            face = Some(direction);
        }
    }
    face
}

/// Move `t` to the crossing of the plane `axis = plane` if it is nearer and
/// lands on the box face.
fn clip_plane(aabb: &Aabb, from: DVec3, delta: DVec3, axis: Axis, plane: f64, t: &mut f64) -> bool {
    let cycle = AxisCycle::between(Axis::X, axis);
    let b_axis = cycle.cycle_axis(Axis::Y);
    let c_axis = cycle.cycle_axis(Axis::Z);

    let hit_t = (plane - axis.of(from)) / axis.of(delta);
    let b = b_axis.of(from) + hit_t * b_axis.of(delta);
    let c = c_axis.of(from) + hit_t * c_axis.of(delta);

    if 0.0 < hit_t
        && hit_t < *t
        && aabb.min_on(b_axis) - EPSILON < b
        && b < aabb.max_on(b_axis) + EPSILON
        && aabb.min_on(c_axis) - EPSILON < c
        && c < aabb.max_on(c_axis) + EPSILON
    {
        *t = hit_t;
        true
    } else {
        false
    }
}

/// Result of clipping a segment against the boxes of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockHitResult {
    /// World-space hit position
    pub location: DVec3,
    /// Face that was crossed
    pub direction: Direction,
    /// Cell the boxes belong to
    pub block_pos: BlockPos,
    /// Whether the segment started inside a full cell
    pub inside: bool,
}
