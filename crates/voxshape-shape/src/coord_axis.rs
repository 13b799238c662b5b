//! Per-axis breakpoints mapping grid indices to real coordinates.

use std::sync::Arc;

/// Strictly increasing breakpoints along one axis.
///
/// A grid with `n` cells on an axis has `n + 1` breakpoints; cell `i` spans
/// `[get(i), get(i + 1))`.
#[derive(Clone, Debug)]
pub enum CoordAxis {
    /// `parts` equal subdivisions of `[0, 1]`, never materialized.
    Uniform(usize),
    /// Explicit breakpoints, all shifted by `offset`.
    Points { points: Arc<[f64]>, offset: f64 },
}

impl CoordAxis {
    /// Explicit breakpoints with no offset.
    pub fn points(points: impl Into<Arc<[f64]>>) -> Self {
        Self::Points {
            points: points.into(),
            offset: 0.0,
        }
    }

    /// Number of breakpoints.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Uniform(parts) => parts + 1,
            Self::Points { points, .. } => points.len(),
        }
    }

    /// Number of cells spanned (one less than the breakpoint count).
    #[inline]
    pub fn cells(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Returns true if there are no breakpoints at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Breakpoint `index`.
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        match self {
            Self::Uniform(parts) => index as f64 / *parts as f64,
            Self::Points { points, offset } => points[index] + offset,
        }
    }

    #[inline]
    pub fn first(&self) -> f64 {
        self.get(0)
    }

    #[inline]
    pub fn last(&self) -> f64 {
        self.get(self.len() - 1)
    }

    /// Whether this is the arithmetic subdivision of the unit interval.
    #[inline]
    pub const fn is_uniform(&self) -> bool {
        matches!(self, Self::Uniform(_))
    }

    /// Cell containing `coord`, in `-1..=cells()`.
    ///
    /// `-1` means below the first breakpoint, `cells()` at or past the last.
    pub fn find_index(&self, coord: f64) -> isize {
        match self {
            Self::Uniform(parts) => {
                let parts = *parts as f64;
                (coord * parts).floor().clamp(-1.0, parts) as isize
            }
            Self::Points { points, offset } => {
                points.partition_point(|&p| p + offset <= coord) as isize - 1
            }
        }
    }

    /// The same breakpoints shifted by `by`.
    pub fn offset(&self, by: f64) -> Self {
        match self {
            Self::Uniform(_) => Self::Points {
                points: self.iter().collect(),
                offset: by,
            },
            Self::Points { points, offset } => Self::Points {
                points: Arc::clone(points),
                offset: offset + by,
            },
        }
    }

    /// Iterate over the breakpoints.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// Materialize the breakpoints.
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Whether the axis is exactly `[0, 1]` in one part, within `epsilon`.
    pub fn is_unit_span(&self, epsilon: f64) -> bool {
        self.len() == 2 && self.first().abs() < epsilon && (self.last() - 1.0).abs() < epsilon
    }
}

impl PartialEq for CoordAxis {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Uniform(a), Self::Uniform(b)) => a == b,
            _ => self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b),
        }
    }
}
