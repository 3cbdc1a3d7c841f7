use std::collections::BTreeMap;

use crate::{geom::Point, num::CheapOrderedFloat, segments::EndIdx};

/// The snap-rounding grid.
///
/// The grid spacing is always a power of two, which means that snapping is exact
/// for coordinates that are already on the grid (and for their sums and differences,
/// as long as they don't get too big).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapGrid {
    size: f64,
}

impl SnapGrid {
    /// Creates the coarsest power-of-two grid that is at least as fine as `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        debug_assert!(tolerance > 0.0 && tolerance.is_finite());
        let mut size = tolerance.log2().floor().exp2();
        // log2 isn't exact, so fix up any rounding in either direction.
        while size > tolerance {
            size /= 2.0;
        }
        while size * 2.0 <= tolerance {
            size *= 2.0;
        }
        SnapGrid { size }
    }

    /// The spacing between grid lines.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Half the spacing: the distance from the center of a tolerance square to its sides.
    pub fn half(&self) -> f64 {
        self.size / 2.0
    }

    pub fn snap(&self, v: f64) -> f64 {
        (v / self.size).round() * self.size
    }

    pub fn snap_point(&self, p: Point) -> Point {
        Point {
            x: self.snap(p.x),
            y: self.snap(p.y),
        }
    }
}

/// The tolerance squares of the current sweep column.
///
/// Squares are identified by their (snapped) `y` coordinate, and they remember
/// which endpoints were registered in them. A square can also exist with no
/// endpoints, if something else (like a crossing with a vertical segment) requires
/// segments to be broken there.
#[derive(Clone, Debug, Default)]
pub struct ToleranceSquares {
    squares: BTreeMap<CheapOrderedFloat, Vec<EndIdx>>,
}

impl ToleranceSquares {
    /// Registers an endpoint in the square at height `y`.
    pub fn register(&mut self, y: f64, e: EndIdx) {
        self.squares.entry(y.into()).or_default().push(e);
    }

    /// Makes sure that there's a square at height `y`, returning true if it's new.
    pub fn ensure(&mut self, y: f64) -> bool {
        let mut inserted = false;
        self.squares.entry(y.into()).or_insert_with(|| {
            inserted = true;
            Vec::new()
        });
        inserted
    }

    pub fn clear(&mut self) {
        self.squares.clear();
    }

    /// The heights of all the squares, from the bottom up.
    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.squares.keys().map(|y| y.into_inner())
    }

    /// The heights of all the squares strictly between `y0` and `y1`.
    pub fn heights_between(&self, y0: f64, y1: f64) -> Vec<f64> {
        use std::ops::Bound::Excluded;
        // BTreeMap::range panics on empty ranges with excluded bounds.
        if y0 >= y1 {
            return Vec::new();
        }
        let range = (
            Excluded(CheapOrderedFloat::from(y0)),
            Excluded(CheapOrderedFloat::from(y1)),
        );
        self.squares
            .range(range)
            .map(|(y, _)| y.into_inner())
            .collect()
    }

    /// All registered endpoints.
    pub fn members(&self) -> impl Iterator<Item = EndIdx> + '_ {
        self.squares.values().flatten().copied()
    }
}
