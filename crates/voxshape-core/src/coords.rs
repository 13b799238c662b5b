//! Integer cell coordinates.

use glam::{DVec3, IVec3};

use crate::math::Direction;

/// Position of a world cell (the unit cube a shape is placed in).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// The cell at the origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a new cell position
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing the given point
    #[inline]
    pub fn containing(point: DVec3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// Neighboring cell in the given direction
    #[inline]
    pub const fn relative(self, direction: Direction) -> Self {
        let [dx, dy, dz] = direction.step();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Minimum corner as a floating point vector
    #[inline]
    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Convert to glam IVec3
    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for BlockPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}
