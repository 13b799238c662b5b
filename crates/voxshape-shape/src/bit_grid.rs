//! Dense 3D occupancy grid backed by a packed bitset.
//!
//! Cells are stored with Z contiguous, then Y, then X, so a run of cells
//! along Z is a contiguous bit range. Box decomposition relies on that to
//! test and clear whole strips at once.

use bitvec::vec::BitVec;
use voxshape_core::{Axis, AxisCycle, AxisDirection, Direction};

const CYCLES: [AxisCycle; 3] = [AxisCycle::None, AxisCycle::Forward, AxisCycle::Backward];

/// Boolean occupancy over `[0, size_x) x [0, size_y) x [0, size_z)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitGrid {
    size: [usize; 3],
    storage: BitVec,
    /// First full layer per axis, `size` while empty.
    min: [usize; 3],
    /// One past the last full layer per axis, `0` while empty.
    max: [usize; 3],
}

impl BitGrid {
    /// Create an empty grid.
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        let size = [size_x, size_y, size_z];
        Self {
            size,
            storage: BitVec::repeat(false, size_x * size_y * size_z),
            min: size,
            max: [0; 3],
        }
    }

    /// Create a grid with the box `[min, max)` filled.
    ///
    /// The box is clipped to the grid.
    pub fn with_filled_bounds(size: [usize; 3], min: [usize; 3], max: [usize; 3]) -> Self {
        let mut grid = Self::new(size[0], size[1], size[2]);
        let max = [max[0].min(size[0]), max[1].min(size[1]), max[2].min(size[2])];
        if (0..3).any(|a| min[a] >= max[a]) {
            return grid;
        }

        for x in min[0]..max[0] {
            for y in min[1]..max[1] {
                let start = grid.index(x, y, min[2]);
                let end = grid.index(x, y, max[2]);
                grid.storage[start..end].fill(true);
            }
        }
        grid.min = min;
        grid.max = max;
        grid
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.size[1] + y) * self.size[2] + z
    }

    /// Number of cells along `axis`.
    #[inline]
    pub const fn size(&self, axis: Axis) -> usize {
        self.size[axis.index()]
    }

    /// Cell counts on all three axes.
    #[inline]
    pub const fn sizes(&self) -> [usize; 3] {
        self.size
    }

    /// Returns false for any coordinate outside the grid.
    #[inline]
    pub fn is_full(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.size[0]
            && y < self.size[1]
            && z < self.size[2]
            && self.storage[self.index(x, y, z)]
    }

    /// Like [`BitGrid::is_full`], accepting the `-1` sentinel used by index mergers.
    #[inline]
    pub fn is_full_wide(&self, x: isize, y: isize, z: isize) -> bool {
        x >= 0 && y >= 0 && z >= 0 && self.is_full(x as usize, y as usize, z as usize)
    }

    /// Occupancy of the cell whose coordinates are `(x, y, z)` rotated by `cycle`.
    #[inline]
    pub fn is_full_cycled(&self, cycle: AxisCycle, x: isize, y: isize, z: isize) -> bool {
        let [x, y, z] = cycle.cycle_all(x, y, z);
        self.is_full_wide(x, y, z)
    }

    #[inline]
    fn cell(&self, cycle: AxisCycle, x: usize, y: usize, z: usize) -> bool {
        let [x, y, z] = cycle.cycle_all(x, y, z);
        self.is_full(x, y, z)
    }

    /// Mark a cell as full. Out-of-range cells are ignored.
    pub fn fill(&mut self, x: usize, y: usize, z: usize) {
        debug_assert!(
            x < self.size[0] && y < self.size[1] && z < self.size[2],
            "fill outside grid: ({x}, {y}, {z}) in {:?}",
            self.size
        );
        if x >= self.size[0] || y >= self.size[1] || z >= self.size[2] {
            return;
        }
        let index = self.index(x, y, z);
        self.storage.set(index, true);
        for (a, v) in [x, y, z].into_iter().enumerate() {
            self.min[a] = self.min[a].min(v);
            self.max[a] = self.max[a].max(v + 1);
        }
    }

    /// First layer along `axis` containing a full cell, or `size` when empty.
    #[inline]
    pub const fn first_full(&self, axis: Axis) -> usize {
        self.min[axis.index()]
    }

    /// One past the last layer along `axis` containing a full cell, or `0` when empty.
    #[inline]
    pub const fn last_full(&self, axis: Axis) -> usize {
        self.max[axis.index()]
    }

    /// Column of cells along `axis` at `i` on the next axis and `j` on the one after.
    fn column(&self, axis: Axis, i: isize, j: isize) -> Option<(AxisCycle, usize, usize)> {
        let i = usize::try_from(i).ok()?;
        let j = usize::try_from(j).ok()?;
        if i >= self.size(AxisCycle::Forward.cycle_axis(axis))
            || j >= self.size(AxisCycle::Backward.cycle_axis(axis))
        {
            return None;
        }
        Some((AxisCycle::between(Axis::X, axis), i, j))
    }

    /// [`BitGrid::first_full`] restricted to a single column.
    ///
    /// `i` indexes the axis after `axis` (X -> Y -> Z -> X) and `j` the one
    /// after that. Columns outside the grid are empty.
    pub fn first_full_in(&self, axis: Axis, i: isize, j: isize) -> usize {
        let size = self.size(axis);
        self.column(axis, i, j)
            .and_then(|(cycle, i, j)| (0..size).find(|&l| self.cell(cycle, l, i, j)))
            .unwrap_or(size)
    }

    /// [`BitGrid::last_full`] restricted to a single column.
    pub fn last_full_in(&self, axis: Axis, i: isize, j: isize) -> usize {
        let size = self.size(axis);
        self.column(axis, i, j)
            .and_then(|(cycle, i, j)| (0..size).rev().find(|&l| self.cell(cycle, l, i, j)))
            .map_or(0, |l| l + 1)
    }

    /// True when no cell is full.
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| self.min[a] >= self.max[a])
    }

    /// Number of full cells.
    pub fn count_full(&self) -> usize {
        self.storage.count_ones()
    }

    fn is_z_strip_full(&self, start_z: usize, end_z: usize, x: usize, y: usize) -> bool {
        x < self.size[0]
            && y < self.size[1]
            && self.storage[self.index(x, y, start_z)..self.index(x, y, end_z)].all()
    }

    fn is_xz_rect_full(&self, start_x: usize, end_x: usize, start_z: usize, end_z: usize, y: usize) -> bool {
        (start_x..end_x).all(|x| self.is_z_strip_full(start_z, end_z, x, y))
    }

    fn clear_z_strip(&mut self, start_z: usize, end_z: usize, x: usize, y: usize) {
        let start = self.index(x, y, start_z);
        let end = self.index(x, y, end_z);
        self.storage[start..end].fill(false);
    }

    /// Emit boxes `(min, max)` in cell units that exactly cover the full cells.
    ///
    /// With `combine`, runs along Z are grown greedily along X and then Y, so
    /// each cell is covered by exactly one box. Without it, one box is emitted
    /// per full cell.
    pub fn for_all_boxes(&self, mut consumer: impl FnMut([usize; 3], [usize; 3]), combine: bool) {
        let [size_x, size_y, size_z] = self.size;
        if !combine {
            for x in 0..size_x {
                for y in 0..size_y {
                    for z in 0..size_z {
                        if self.is_full(x, y, z) {
                            consumer([x, y, z], [x + 1, y + 1, z + 1]);
                        }
                    }
                }
            }
            return;
        }

        let mut scratch = self.clone();
        for y in 0..size_y {
            for x in 0..size_x {
                let mut start_z = None;
                for z in 0..=size_z {
                    if scratch.is_full(x, y, z) {
                        start_z.get_or_insert(z);
                        continue;
                    }
                    let Some(z0) = start_z.take() else {
                        continue;
                    };

                    let mut end_x = x;
                    let mut end_y = y;
                    scratch.clear_z_strip(z0, z, x, y);
                    while scratch.is_z_strip_full(z0, z, end_x + 1, y) {
                        scratch.clear_z_strip(z0, z, end_x + 1, y);
                        end_x += 1;
                    }
                    while scratch.is_xz_rect_full(x, end_x + 1, z0, z, end_y + 1) {
                        for cx in x..=end_x {
                            scratch.clear_z_strip(z0, z, cx, end_y + 1);
                        }
                        end_y += 1;
                    }
                    consumer([x, y, z0], [end_x + 1, end_y + 1, z]);
                }
            }
        }
    }

    /// Emit the silhouette edges of the occupied volume as segments in cell units.
    ///
    /// A grid line is an edge where the four cells around it are not split
    /// evenly into a flat face (one or three full, or two diagonal ones).
    /// With `combine`, collinear unit edges are merged into maximal runs.
    pub fn for_all_edges(&self, mut consumer: impl FnMut([usize; 3], [usize; 3]), combine: bool) {
        for transform in CYCLES {
            self.for_all_axis_edges(&mut consumer, transform.inverse(), combine);
        }
    }

    fn for_all_axis_edges(
        &self,
        consumer: &mut impl FnMut([usize; 3], [usize; 3]),
        inverse: AxisCycle,
        combine: bool,
    ) {
        let size_x = self.size(inverse.cycle_axis(Axis::X));
        let size_y = self.size(inverse.cycle_axis(Axis::Y));
        let size_z = self.size(inverse.cycle_axis(Axis::Z));

        for x in 0..=size_x {
            for y in 0..=size_y {
                let mut start_z = None;
                for z in 0..=size_z {
                    let mut full_sectors = 0;
                    let mut odd_sectors = 0;
                    for dx in 0..=1isize {
                        for dy in 0..=1isize {
                            let (cx, cy) = (x as isize + dx - 1, y as isize + dy - 1);
                            if self.is_full_cycled(inverse, cx, cy, z as isize) {
                                full_sectors += 1;
                                odd_sectors ^= dx ^ dy;
                            }
                        }
                    }

                    let edge = full_sectors == 1
                        || full_sectors == 3
                        || (full_sectors == 2 && odd_sectors & 1 == 0);
                    if edge {
                        if combine {
                            start_z.get_or_insert(z);
                        } else {
                            consumer(inverse.cycle_all(x, y, z), inverse.cycle_all(x, y, z + 1));
                        }
                    } else if let Some(z0) = start_z.take() {
                        consumer(inverse.cycle_all(x, y, z0), inverse.cycle_all(x, y, z));
                    }
                }
            }
        }
    }

    /// Emit every exposed cell face as `(direction, cell)`.
    pub fn for_all_faces(&self, mut consumer: impl FnMut(Direction, [usize; 3])) {
        for transform in CYCLES {
            let inverse = transform.inverse();
            let axis = inverse.cycle_axis(Axis::Z);
            let size_x = self.size(inverse.cycle_axis(Axis::X));
            let size_y = self.size(inverse.cycle_axis(Axis::Y));
            let size_z = self.size(axis);
            let negative = Direction::from_axis(axis, AxisDirection::Negative);
            let positive = Direction::from_axis(axis, AxisDirection::Positive);

            for x in 0..size_x {
                for y in 0..size_y {
                    let mut last_full = false;
                    for z in 0..=size_z {
                        let full = z != size_z && self.cell(inverse, x, y, z);
                        if !last_full && full {
                            consumer(negative, inverse.cycle_all(x, y, z));
                        }
                        if last_full && !full {
                            consumer(positive, inverse.cycle_all(x, y, z - 1));
                        }
                        last_full = full;
                    }
                }
            }
        }
    }

    /// One-cell-thick copy of layer `index` along `axis`.
    ///
    /// Layers outside the grid produce an empty slice.
    pub fn slice(&self, axis: Axis, index: isize) -> Self {
        let mut size = self.size;
        size[axis.index()] = 1;
        let mut out = Self::new(size[0], size[1], size[2]);

        let Ok(index) = usize::try_from(index) else {
            return out;
        };
        if index >= self.size(axis) {
            return out;
        }

        for x in 0..size[0] {
            for y in 0..size[1] {
                for z in 0..size[2] {
                    let mut src = [x, y, z];
                    src[axis.index()] = index;
                    if self.is_full(src[0], src[1], src[2]) {
                        out.fill(x, y, z);
                    }
                }
            }
        }
        out
    }
}
