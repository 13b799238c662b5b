//! Index mergers: align two differently subdivided axes.
//!
//! A merger walks the cells of the combined axis and reports, for each one,
//! the cell index into the first and second source axis. Indices may fall
//! outside a source grid (`-1` or past the end); the grids treat those cells
//! as empty.
//!
//! Four strategies share the [`IndexMerger`] contract and differ only in cost.
//! [`create`] picks the cheapest that applies.

use tracing::trace;
use voxshape_core::constants::{CUBE_MERGE_LIMIT, EPSILON};

use crate::coord_axis::CoordAxis;

/// Combined view of two coordinate axes.
pub trait IndexMerger {
    /// Breakpoints of the combined axis.
    fn list(&self) -> CoordAxis;

    /// Number of breakpoints of the combined axis.
    fn size(&self) -> usize;

    /// Call `consumer(first, second, merged)` for every merged cell in order.
    ///
    /// Stops and returns false as soon as the consumer returns false.
    fn for_merged_indexes(&self, consumer: impl FnMut(isize, isize, usize) -> bool) -> bool;
}

/// Both axes are the same sequence.
#[derive(Clone, Debug)]
pub struct IdenticalMerger {
    coords: CoordAxis,
}

impl IndexMerger for IdenticalMerger {
    fn list(&self) -> CoordAxis {
        self.coords.clone()
    }

    fn size(&self) -> usize {
        self.coords.len()
    }

    fn for_merged_indexes(&self, mut consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        (0..self.coords.cells()).all(|i| consumer(i as isize, i as isize, i))
    }
}

/// One axis ends before the other begins; the result is the two lists
/// back to back with the gap between them as an extra cell.
#[derive(Clone, Debug)]
pub struct DisjointMerger {
    lower: CoordAxis,
    upper: CoordAxis,
    /// The lower list belongs to the second operand.
    swap: bool,
}

impl DisjointMerger {
    fn for_unswapped_indexes(&self, mut consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        let lower_len = self.lower.len();
        for i in 0..lower_len {
            if !consumer(i as isize, -1, i) {
                return false;
            }
        }
        let past_lower = lower_len as isize - 1;
        for k in 0..self.upper.cells() {
            if !consumer(past_lower, k as isize, lower_len + k) {
                return false;
            }
        }
        true
    }
}

impl IndexMerger for DisjointMerger {
    fn list(&self) -> CoordAxis {
        CoordAxis::points(
            self.lower
                .iter()
                .chain(self.upper.iter())
                .collect::<Vec<_>>(),
        )
    }

    fn size(&self) -> usize {
        self.lower.len() + self.upper.len()
    }

    fn for_merged_indexes(&self, mut consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        if self.swap {
            self.for_unswapped_indexes(|lower, upper, merged| consumer(upper, lower, merged))
        } else {
            self.for_unswapped_indexes(consumer)
        }
    }
}

/// Both axes are uniform; the result is uniform with `lcm(a, b)` parts and
/// indices are computed arithmetically.
#[derive(Clone, Debug)]
pub struct CubicMerger {
    parts: usize,
    first_div: usize,
    second_div: usize,
}

impl CubicMerger {
    fn new(first_parts: usize, second_parts: usize) -> Self {
        let gcd = gcd(first_parts, second_parts);
        Self {
            parts: first_parts / gcd * second_parts,
            first_div: first_parts / gcd,
            second_div: second_parts / gcd,
        }
    }
}

impl IndexMerger for CubicMerger {
    fn list(&self) -> CoordAxis {
        CoordAxis::Uniform(self.parts)
    }

    fn size(&self) -> usize {
        self.parts + 1
    }

    fn for_merged_indexes(&self, mut consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        (0..self.parts).all(|j| {
            consumer(
                (j / self.second_div) as isize,
                (j / self.first_div) as isize,
                j,
            )
        })
    }
}

/// General two-pointer merge with an explicit index table.
#[derive(Clone, Debug)]
pub struct IndirectMerger {
    result: Vec<f64>,
    first_indices: Vec<isize>,
    second_indices: Vec<isize>,
}

impl IndirectMerger {
    /// Merge `first` and `second`.
    ///
    /// Breakpoints of one axis lying outside the other's extent are dropped
    /// unless cells covered only by that axis matter (`first_only` /
    /// `second_only`). Breakpoints closer than [`EPSILON`] collapse into one.
    pub fn new(first: &CoordAxis, second: &CoordAxis, first_only: bool, second_only: bool) -> Self {
        let (first_len, second_len) = (first.len(), second.len());
        let capacity = first_len + second_len;
        let mut result = Vec::with_capacity(capacity);
        let mut first_indices = Vec::with_capacity(capacity);
        let mut second_indices = Vec::with_capacity(capacity);

        let mut last = f64::NAN;
        let (mut m, mut n) = (0, 0);
        loop {
            let first_done = m >= first_len;
            let second_done = n >= second_len;
            if first_done && second_done {
                break;
            }

            let take_first =
                !first_done && (second_done || first.get(m) < second.get(n) + EPSILON);
            if take_first {
                m += 1;
                if !first_only && (n == 0 || second_done) {
                    continue;
                }
            } else {
                n += 1;
                if !second_only && (m == 0 || first_done) {
                    continue;
                }
            }

            let (i, j) = (m as isize - 1, n as isize - 1);
            let value = if take_first {
                first.get(m - 1)
            } else {
                second.get(n - 1)
            };
            if last.is_nan() || last < value - EPSILON {
                result.push(value);
                first_indices.push(i);
                second_indices.push(j);
                last = value;
            } else if let (Some(fi), Some(si)) = (first_indices.last_mut(), second_indices.last_mut())
            {
                *fi = i;
                *si = j;
            }
        }

        if result.is_empty() {
            result.push(0.0);
        }

        Self {
            result,
            first_indices,
            second_indices,
        }
    }
}

impl IndexMerger for IndirectMerger {
    fn list(&self) -> CoordAxis {
        CoordAxis::points(self.result.clone())
    }

    fn size(&self) -> usize {
        self.result.len()
    }

    fn for_merged_indexes(&self, mut consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        (0..self.result.len() - 1)
            .all(|k| consumer(self.first_indices[k], self.second_indices[k], k))
    }
}

/// Merger chosen by [`create`].
#[derive(Clone, Debug)]
pub enum Merger {
    Identical(IdenticalMerger),
    Disjoint(DisjointMerger),
    Cubic(CubicMerger),
    Indirect(IndirectMerger),
}

impl IndexMerger for Merger {
    fn list(&self) -> CoordAxis {
        match self {
            Self::Identical(m) => m.list(),
            Self::Disjoint(m) => m.list(),
            Self::Cubic(m) => m.list(),
            Self::Indirect(m) => m.list(),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Identical(m) => m.size(),
            Self::Disjoint(m) => m.size(),
            Self::Cubic(m) => m.size(),
            Self::Indirect(m) => m.size(),
        }
    }

    fn for_merged_indexes(&self, consumer: impl FnMut(isize, isize, usize) -> bool) -> bool {
        match self {
            Self::Identical(m) => m.for_merged_indexes(consumer),
            Self::Disjoint(m) => m.for_merged_indexes(consumer),
            Self::Cubic(m) => m.for_merged_indexes(consumer),
            Self::Indirect(m) => m.for_merged_indexes(consumer),
        }
    }
}

/// Pick the cheapest merger for `first` and `second`.
///
/// `cost` is the number of merged cells on the axes already merged; the
/// arithmetic cube merger is only used while `cost * lcm` stays within
/// [`CUBE_MERGE_LIMIT`], since it can subdivide far more finely than needed.
pub fn create(
    cost: usize,
    first: &CoordAxis,
    second: &CoordAxis,
    first_only: bool,
    second_only: bool,
) -> Merger {
    if first == second {
        trace!(strategy = "identical", points = first.len());
        return Merger::Identical(IdenticalMerger {
            coords: first.clone(),
        });
    }

    if first.last() < second.first() - EPSILON {
        trace!(strategy = "disjoint", swap = false);
        return Merger::Disjoint(DisjointMerger {
            lower: first.clone(),
            upper: second.clone(),
            swap: false,
        });
    }
    if second.last() < first.first() - EPSILON {
        trace!(strategy = "disjoint", swap = true);
        return Merger::Disjoint(DisjointMerger {
            lower: second.clone(),
            upper: first.clone(),
            swap: true,
        });
    }

    if let (CoordAxis::Uniform(a), CoordAxis::Uniform(b)) = (first, second) {
        let lcm = lcm(*a, *b);
        if (cost as u64).saturating_mul(lcm as u64) <= CUBE_MERGE_LIMIT {
            trace!(strategy = "cubic", parts = lcm);
            return Merger::Cubic(CubicMerger::new(*a, *b));
        }
    }

    trace!(strategy = "indirect", first = first.len(), second = second.len());
    Merger::Indirect(IndirectMerger::new(first, second, first_only, second_only))
}

const fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple of two subdivision counts.
pub const fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(merger: &impl IndexMerger) -> Vec<(isize, isize, usize)> {
        let mut out = Vec::new();
        merger.for_merged_indexes(|i, j, k| {
            out.push((i, j, k));
            true
        });
        out
    }

    /// Every merged cell must map back to the source cells containing its midpoint.
    fn assert_consistent(merger: &Merger, first: &CoordAxis, second: &CoordAxis) {
        let list = merger.list();
        assert_eq!(list.len(), merger.size());
        let mut visited = 0;
        merger.for_merged_indexes(|i, j, k| {
            let mid = (list.get(k) + list.get(k + 1)) * 0.5;
            assert_eq!(i, first.find_index(mid), "first index of cell {k} at {mid}");
            assert_eq!(j, second.find_index(mid), "second index of cell {k} at {mid}");
            visited += 1;
            true
        });
        assert_eq!(visited, merger.size() - 1);
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(1, 8), 8);
        assert_eq!(lcm(8, 8), 8);
    }

    #[test]
    fn identical_axes() {
        let a = CoordAxis::points(vec![0.0, 0.25, 1.0]);
        let merger = create(1, &a, &a.clone(), true, true);
        assert!(matches!(merger, Merger::Identical(_)));
        assert_eq!(collect(&merger), vec![(0, 0, 0), (1, 1, 1)]);
    }

    #[test]
    fn identical_uniform_axes_stay_uniform() {
        let merger = create(1, &CoordAxis::Uniform(4), &CoordAxis::Uniform(4), true, true);
        assert!(matches!(merger, Merger::Identical(_)));
        assert!(merger.list().is_uniform());
    }

    #[test]
    fn disjoint_axes() {
        let a = CoordAxis::points(vec![0.0, 1.0]);
        let b = CoordAxis::points(vec![2.0, 3.0]);

        let merger = create(1, &a, &b, true, true);
        assert!(matches!(merger, Merger::Disjoint(_)));
        assert_eq!(merger.list().to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(collect(&merger), vec![(0, -1, 0), (1, -1, 1), (1, 0, 2)]);

        let swapped = create(1, &b, &a, true, true);
        assert!(matches!(swapped, Merger::Disjoint(_)));
        assert_eq!(collect(&swapped), vec![(-1, 0, 0), (-1, 1, 1), (0, 1, 2)]);
    }

    #[test]
    fn cubic_axes() {
        let a = CoordAxis::Uniform(2);
        let b = CoordAxis::Uniform(3);
        let merger = create(1, &a, &b, true, true);
        assert!(matches!(merger, Merger::Cubic(_)));
        assert_eq!(merger.size(), 7);
        assert!(merger.list().is_uniform());
        assert_consistent(&merger, &a, &b);
    }

    #[test]
    fn cubic_cost_guard_falls_back_to_indirect() {
        let a = CoordAxis::Uniform(2);
        let b = CoordAxis::Uniform(3);
        let merger = create(100, &a, &b, true, true);
        assert!(matches!(merger, Merger::Indirect(_)));
        assert_eq!(merger.list().to_vec().len(), 5);
        assert_consistent(&merger, &a, &b);
    }

    #[test]
    fn indirect_merge_keeps_outside_cells_when_they_matter() {
        let a = CoordAxis::points(vec![0.0, 1.0]);
        let b = CoordAxis::points(vec![0.5, 1.5]);
        let merger = create(1, &a, &b, true, true);
        assert!(matches!(merger, Merger::Indirect(_)));
        assert_eq!(merger.list().to_vec(), vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(collect(&merger), vec![(0, -1, 0), (0, 0, 1), (1, 0, 2)]);
    }

    #[test]
    fn indirect_merge_drops_outside_cells_when_they_do_not_matter() {
        let a = CoordAxis::points(vec![0.0, 1.0]);
        let b = CoordAxis::points(vec![0.5, 1.5]);
        let merger = create(1, &a, &b, false, false);
        assert_eq!(merger.list().to_vec(), vec![0.5, 1.0]);
        assert_eq!(collect(&merger), vec![(0, 0, 0)]);
    }

    #[test]
    fn indirect_merge_collapses_near_duplicates() {
        let a = CoordAxis::points(vec![0.0, 0.5, 1.0]);
        let b = CoordAxis::points(vec![0.0, 0.5 + 1.0e-9, 1.0]);
        let merger = IndirectMerger::new(&a, &b, true, true);
        assert_eq!(merger.size(), 3);
        assert_eq!(collect(&merger), vec![(0, 0, 0), (1, 1, 1)]);
    }

    #[test]
    fn merging_stops_when_consumer_declines() {
        let a = CoordAxis::Uniform(4);
        let b = CoordAxis::Uniform(2);
        let merger = create(1, &a, &b, true, true);
        let mut seen = 0;
        let finished = merger.for_merged_indexes(|_, _, k| {
            seen += 1;
            k < 1
        });
        assert!(!finished);
        assert_eq!(seen, 2);
    }

    #[test]
    fn strategies_agree_on_irregular_axes() {
        let axes = [
            CoordAxis::Uniform(1),
            CoordAxis::Uniform(4),
            CoordAxis::Uniform(8),
            CoordAxis::points(vec![0.0, 0.375, 1.0]),
            CoordAxis::points(vec![0.125, 0.25, 0.875]),
            CoordAxis::points(vec![-0.5, 0.5]),
            CoordAxis::points(vec![1.25, 1.5, 2.0]),
            CoordAxis::Uniform(2).offset(0.5),
        ];
        for a in &axes {
            for b in &axes {
                assert_consistent(&create(1, a, b, true, true), a, b);
                assert_consistent(&Merger::Indirect(IndirectMerger::new(a, b, true, true)), a, b);
            }
        }
    }
}
