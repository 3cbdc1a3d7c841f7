//! Geometric primitives, like points and lines.

use arrayvec::ArrayVec;

use crate::num::CheapOrderedFloat;

/// A two-dimensional point.
///
/// Points are sorted by `x` and then by `y`, for the convenience of our sweep-line
/// algorithm (which moves in increasing `x`).
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical coordinate.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are up, so that counter-clockwise contours enclose
    /// positive area.
    pub y: f64,
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (
            CheapOrderedFloat::from(self.x),
            CheapOrderedFloat::from(self.y),
        )
            .cmp(&(
                CheapOrderedFloat::from(other.x),
                CheapOrderedFloat::from(other.y),
            ))
    }
}

impl PartialOrd for Point {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Point {}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite());
        debug_assert!(y.is_finite());
        Point { x, y }
    }

    /// Moves a fraction `t` of the way from `self` to `other`.
    ///
    /// This is computed as `self + t * (other - self)`, so `t == 0.0` returns
    /// `self` exactly.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }

    /// Converts to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub(crate) fn minus(self, other: Point) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// The two-dimensional cross product.
#[inline]
pub(crate) fn cross((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> f64 {
    ax * by - ay * bx
}

#[inline]
pub(crate) fn dot((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> f64 {
    ax * bx + ay * by
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive if `c` is to the left of the line from `a` to `b`.
#[inline]
pub(crate) fn orient(a: Point, b: Point, c: Point) -> f64 {
    cross(b.minus(a), c.minus(a))
}

/// The distance from `p` to the infinite line through `a` and `b`.
fn line_distance(a: Point, b: Point, p: Point) -> f64 {
    let (dx, dy) = b.minus(a);
    let len = dx.hypot(dy);
    if len == 0.0 {
        let (px, py) = p.minus(a);
        px.hypot(py)
    } else {
        orient(a, b, p).abs() / len
    }
}

/// The `y` coordinate of the segment from `p0` to `p1` at horizontal position `x`.
///
/// `x` is clamped to the segment's horizontal extent, and the endpoints' own
/// coordinates are returned exactly at the ends. For vertical segments, this
/// returns the lower `y` coordinate.
pub(crate) fn y_at(p0: Point, p1: Point, x: f64) -> f64 {
    debug_assert!(p0 <= p1);
    if x <= p0.x {
        p0.y
    } else if x >= p1.x {
        p1.y
    } else {
        p0.y + (x - p0.x) * (p1.y - p0.y) / (p1.x - p0.x)
    }
}

/// Intersects the segment `a0 -- a1` with the segment `b0 -- b1`.
///
/// Both segments must be given in sweep order (`a0 < a1` and `b0 < b1`). The
/// returned points are in sweep order. There are at most two of them, and two
/// are only returned when the segments overlap: in that case, the endpoints of
/// the overlap are returned.
///
/// Segments whose endpoints are all within `tol` of the other segment's line are
/// treated as collinear.
pub(crate) fn intersect(
    a0: Point,
    a1: Point,
    b0: Point,
    b1: Point,
    tol: f64,
) -> ArrayVec<Point, 2> {
    debug_assert!(a0 < a1 && b0 < b1);
    let mut ret = ArrayVec::new();

    // Cheap rejection on the bounding boxes.
    if a1.x < b0.x || b1.x < a0.x {
        return ret;
    }
    if a0.y.max(a1.y) < b0.y.min(b1.y) || b0.y.max(b1.y) < a0.y.min(a1.y) {
        return ret;
    }

    let collinear = line_distance(a0, a1, b0) <= tol
        && line_distance(a0, a1, b1) <= tol
        && line_distance(b0, b1, a0) <= tol
        && line_distance(b0, b1, a1) <= tol;
    if collinear {
        let lo = a0.max(b0);
        let hi = a1.min(b1);
        match lo.cmp(&hi) {
            std::cmp::Ordering::Less => {
                ret.push(lo);
                ret.push(hi);
            }
            std::cmp::Ordering::Equal => ret.push(lo),
            std::cmp::Ordering::Greater => {}
        }
        return ret;
    }

    let da = a1.minus(a0);
    let db = b1.minus(b0);
    let d = cross(da, db);
    if d == 0.0 {
        return ret;
    }

    let ab = b0.minus(a0);
    let ta = cross(ab, db) / d;
    let tb = cross(ab, da) / d;
    if !(0.0..=1.0).contains(&ta) || !(0.0..=1.0).contains(&tb) {
        return ret;
    }

    // Prefer the exact input coordinates when the intersection is at an endpoint.
    let z = if tb == 0.0 {
        b0
    } else if tb == 1.0 {
        b1
    } else if ta == 0.0 {
        a0
    } else if ta == 1.0 {
        a1
    } else {
        a0.lerp(&a1, ta)
    };
    ret.push(z);
    ret
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    pub fn reasonable_point() -> BoxedStrategy<Point> {
        (-1e3f64..1e3, -1e3f64..1e3)
            .prop_map(|(x, y)| Point::new(x, y))
            .boxed()
    }

    #[test]
    fn crossing() {
        let z = intersect(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0), 1e-9);
        assert_eq!(z.as_slice(), &[p(1.0, 1.0)]);
    }

    #[test]
    fn touching_at_endpoint() {
        let z = intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(3.0, 5.0), 1e-9);
        assert_eq!(z.as_slice(), &[p(1.0, 0.0)]);
    }

    #[test]
    fn parallel() {
        let z = intersect(p(0.0, 0.0), p(2.0, 0.0), p(0.0, 1.0), p(2.0, 1.0), 1e-9);
        assert!(z.is_empty());
    }

    #[test]
    fn overlapping() {
        let z = intersect(p(0.0, 0.0), p(4.0, 4.0), p(1.0, 1.0), p(6.0, 6.0), 1e-9);
        assert_eq!(z.as_slice(), &[p(1.0, 1.0), p(4.0, 4.0)]);

        let z = intersect(p(0.0, 0.0), p(0.0, 4.0), p(0.0, 4.0), p(0.0, 6.0), 1e-9);
        assert_eq!(z.as_slice(), &[p(0.0, 4.0)]);

        let z = intersect(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0), 1e-9);
        assert!(z.is_empty());
    }

    #[test]
    fn y_at_endpoints_is_exact() {
        let a = p(0.1, 0.3);
        let b = p(0.7, 0.9);
        assert_eq!(y_at(a, b, 0.1), 0.3);
        assert_eq!(y_at(a, b, 0.7), 0.9);
        assert_eq!(y_at(a, b, -5.0), 0.3);
        assert_eq!(y_at(a, b, 5.0), 0.9);
    }

    proptest! {
    #[test]
    fn intersections_are_close_to_both(
        a0 in reasonable_point(),
        a1 in reasonable_point(),
        b0 in reasonable_point(),
        b1 in reasonable_point(),
    ) {
        prop_assume!(a0 != a1 && b0 != b1);
        let (a0, a1) = (a0.min(a1), a0.max(a1));
        let (b0, b1) = (b0.min(b1), b0.max(b1));
        let tol = 1e-6;
        for z in intersect(a0, a1, b0, b1, tol) {
            prop_assert!(line_distance(a0, a1, z) <= 1e-6 * 1e3);
            prop_assert!(line_distance(b0, b1, z) <= 1e-6 * 1e3);
        }
    }
    }
}
