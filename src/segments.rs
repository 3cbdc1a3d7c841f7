//! The endpoint arena.
//!
//! Every line segment is represented by two [`SweepPoint`]s that refer to one another.
//! The sweep-line algorithm mostly deals with the left endpoint of each segment,
//! which also carries the per-segment state (winding numbers and so on).

use kurbo::{BezPath, PathEl};

use crate::{
    geom::{self, Point},
    status::NodeIdx,
    winding::WindingNumber,
    Error, NonFlatPath,
};

/// The identity of an input segment.
///
/// When a segment gets split, all the pieces keep the identity of the input segment
/// they came from. This is only used for diagnostics and for breaking ties between
/// overlapping segments deterministically.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SegIdx(pub usize);

impl std::fmt::Debug for SegIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

typed_vec!(
    /// A vector indexed by [`EndIdx`].
    EndVec,
    /// An index into the endpoint arena.
    EndIdx,
    "e"
);

/// The mutable state of a segment, stored on its left endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentState {
    /// The winding numbers of the region just below the segment (or just east of it,
    /// if it's vertical).
    pub windings: WindingNumber,
    /// The amount that the winding numbers change when crossing this segment upwards
    /// (or westwards, if it's vertical).
    ///
    /// For a single segment this is a unit, but merging coincident segments adds
    /// their contributions together.
    pub self_windings: WindingNumber,
    /// The segment just below this one when it entered the sweep line.
    pub below: Option<EndIdx>,
    /// Does this segment bound the output?
    pub in_result: bool,
    /// Has contour assembly already consumed this segment?
    pub processed: bool,
    /// Bumped whenever the geometry of the segment changes, so that pairs of
    /// segments get re-tested for intersection.
    pub version: u32,
}

/// One end of a line segment.
#[derive(Clone, Debug)]
pub struct SweepPoint {
    /// Where we are.
    pub point: Point,
    /// The other end of our segment.
    pub other: EndIdx,
    /// Are we the left (or, for vertical segments, the bottom) end of our segment?
    pub left: bool,
    /// Does our segment belong to the clipping path?
    pub clipping: bool,
    /// The input segment that we came from.
    pub seg: SegIdx,
    /// Did the original path run from the left endpoint to the right one?
    pub increasing: bool,
    /// Is our segment vertical?
    pub vertical: bool,
    /// Set once our segment has collapsed, or been merged into another one.
    pub dead: bool,
    /// The sweep-line node of our segment, if it's in the sweep line.
    ///
    /// Only ever set on left endpoints.
    pub node: Option<NodeIdx>,
    /// Only meaningful on left endpoints.
    pub state: SegmentState,
}

/// An arena of segment endpoints.
///
/// Endpoints are indexed by [`EndIdx`] and can be retrieved by indexing (i.e. with
/// square brackets).
/// Nothing ever gets removed from the arena: dead segments are just marked as such.
#[derive(Debug, Clone, Default)]
pub struct Segments {
    ends: EndVec<SweepPoint>,
    seg_count: usize,
}

fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2)
        .map(|pair| (&pair[0], &pair[1]))
        .chain(xs.last().zip(xs.first()))
}

impl Segments {
    /// The number of endpoints in this arena (twice the number of segments).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Iterates over all endpoint indices.
    pub fn indices(&self) -> impl Iterator<Item = EndIdx> {
        self.ends.indices()
    }

    /// Iterates over the left endpoints of all segments that haven't died.
    pub fn live_lefts(&self) -> impl Iterator<Item = EndIdx> + '_ {
        self.ends
            .iter()
            .filter(|(_, e)| e.left && !e.dead)
            .map(|(idx, _)| idx)
    }

    /// Adds a closed polygon, one segment per pair of consecutive points.
    ///
    /// The polygon is closed implicitly: there's a segment from the last point
    /// back to the first one. Zero-length segments are skipped.
    pub fn add_polygon(&mut self, points: &[Point], clipping: bool) {
        if points.len() < 2 {
            return;
        }
        for (p, q) in cyclic_pairs(points) {
            if p != q {
                let seg = SegIdx(self.seg_count);
                self.seg_count += 1;
                self.add_segment(*p, *q, clipping, seg);
            }
        }
    }

    /// Adds a segment from `p` to `q`, returning its left endpoint.
    fn add_segment(&mut self, p: Point, q: Point, clipping: bool, seg: SegIdx) -> EndIdx {
        debug_assert!(p != q);
        let increasing = p < q;
        let (l, r) = if increasing { (p, q) } else { (q, p) };
        let l_idx = self.ends.next_idx();
        let r_idx = EndIdx(l_idx.0 + 1);
        let vertical = l.x == r.x;
        let end = |point, other, left| SweepPoint {
            point,
            other,
            left,
            clipping,
            seg,
            increasing,
            vertical,
            dead: false,
            node: None,
            state: SegmentState {
                self_windings: WindingNumber::unit(clipping, increasing),
                ..SegmentState::default()
            },
        };
        self.ends.push(end(l, r_idx, true));
        self.ends.push(end(r, l_idx, false));
        l_idx
    }

    /// The left endpoint of the segment that `e` belongs to.
    pub fn left(&self, e: EndIdx) -> EndIdx {
        if self[e].left {
            e
        } else {
            self[e].other
        }
    }

    /// The endpoint that the original path started from.
    #[cfg(test)]
    pub fn start(&self, e: EndIdx) -> EndIdx {
        let l = self.left(e);
        if self[l].increasing {
            l
        } else {
            self[l].other
        }
    }

    /// The endpoint that the original path ended at.
    #[cfg(test)]
    pub fn end(&self, e: EndIdx) -> EndIdx {
        self[self.start(e)].other
    }

    /// The two points of the segment that `e` belongs to, in sweep order.
    pub fn points(&self, e: EndIdx) -> (Point, Point) {
        let l = self.left(e);
        (self[l].point, self[self[l].other].point)
    }

    /// The segment's `y` coordinate at `x`, clamped to its horizontal extent.
    pub fn y_at(&self, e: EndIdx, x: f64) -> f64 {
        let (p0, p1) = self.points(e);
        geom::y_at(p0, p1, x)
    }

    /// The range of `y` coordinates that the segment covers for `x` in `x0..=x1`.
    ///
    /// Returns `None` if the segment doesn't reach that range of `x`.
    pub fn y_range(&self, e: EndIdx, x0: f64, x1: f64) -> Option<(f64, f64)> {
        let (p0, p1) = self.points(e);
        if p1.x < x0 || p0.x > x1 {
            return None;
        }
        let ya = geom::y_at(p0, p1, x0.max(p0.x));
        let yb = geom::y_at(p0, p1, x1.min(p1.x));
        Some((ya.min(yb), ya.max(yb)))
    }

    /// Swaps the roles of the two endpoints of a segment.
    ///
    /// Both `left` flags and both `increasing` flags change together, and the segment
    /// state moves to the new left endpoint (with its own winding contribution
    /// negated, since "above" is now on the other side). Returns the new left endpoint.
    ///
    /// The segment must not be in the sweep line.
    pub fn reverse(&mut self, e: EndIdx) -> EndIdx {
        let l = self.left(e);
        let r = self[l].other;
        debug_assert!(self[l].node.is_none());

        let mut state = std::mem::take(&mut self[l].state);
        state.self_windings = -state.self_windings;
        for idx in [l, r] {
            let end = &mut self[idx];
            end.left = !end.left;
            end.increasing = !end.increasing;
        }
        self[r].state = state;
        r
    }

    /// Makes sure that the left endpoint really is the smaller one, reversing the
    /// segment if necessary. Also refreshes the `vertical` flag.
    ///
    /// Returns the left endpoint.
    pub fn normalize(&mut self, e: EndIdx) -> EndIdx {
        let mut l = self.left(e);
        let r = self[l].other;
        if self[l].point > self[r].point {
            l = self.reverse(l);
        }
        let vertical = self[l].point.x == self[self[l].other].point.x;
        let r = self[l].other;
        self[l].vertical = vertical;
        self[r].vertical = vertical;
        l
    }

    /// Splits a segment at `z`.
    ///
    /// The "near" half keeps the left endpoint (and its state, and its node in the
    /// sweep line) and gets a new right endpoint at `z`. The "far" half gets a new
    /// left endpoint at `z` and keeps the original right endpoint.
    ///
    /// Returns the near half's new right endpoint and the far half's new left endpoint.
    pub fn split(&mut self, e: EndIdx, z: Point) -> (EndIdx, EndIdx) {
        let l = self.left(e);
        let r = self[l].other;
        let near_right = self.ends.next_idx();
        let far_left = EndIdx(near_right.0 + 1);

        let template = self[l].clone();
        let state = SegmentState {
            self_windings: template.state.self_windings,
            ..SegmentState::default()
        };
        self.ends.push(SweepPoint {
            point: z,
            other: l,
            left: false,
            node: None,
            state: SegmentState::default(),
            ..template.clone()
        });
        self.ends.push(SweepPoint {
            point: z,
            other: r,
            left: true,
            node: None,
            state,
            ..template
        });
        self[l].other = near_right;
        self[l].state.version += 1;
        self[r].other = far_left;
        (near_right, far_left)
    }

    /// Marks a segment as dead.
    pub fn kill(&mut self, e: EndIdx) {
        let l = self.left(e);
        let r = self[l].other;
        debug_assert!(self[l].node.is_none());
        self[l].dead = true;
        self[r].dead = true;
        self[l].state.in_result = false;
    }

    /// The winding numbers just above (or just west of) a segment.
    pub fn above(&self, e: EndIdx) -> WindingNumber {
        let state = &self[self.left(e)].state;
        state.windings + state.self_windings
    }
}

impl std::ops::Index<EndIdx> for Segments {
    type Output = SweepPoint;

    fn index(&self, index: EndIdx) -> &Self::Output {
        &self.ends[index]
    }
}

impl std::ops::IndexMut<EndIdx> for Segments {
    fn index_mut(&mut self, index: EndIdx) -> &mut Self::Output {
        &mut self.ends[index]
    }
}

/// Splits a path into closed polylines.
///
/// Every sub-path is closed implicitly. A line after a `ClosePath` that isn't
/// preceded by a `MoveTo` starts from the closed sub-path's first point, and
/// consecutive repeated points are dropped. Curves are rejected.
pub fn polylines(path: &BezPath) -> Result<Vec<Vec<Point>>, Error> {
    let mut ret = Vec::new();
    let mut cur: Vec<Point> = Vec::new();
    let mut start = Point::new(0.0, 0.0);

    let check = |p: kurbo::Point| -> Result<Point, Error> {
        if p.x.is_nan() || p.y.is_nan() {
            Err(Error::NaN)
        } else if p.x.is_infinite() || p.y.is_infinite() {
            Err(Error::Infinity)
        } else {
            Ok(p.into())
        }
    };

    for (element, el) in path.elements().iter().enumerate() {
        match *el {
            PathEl::MoveTo(p) => {
                ret.push(std::mem::take(&mut cur));
                start = check(p)?;
                cur.push(start);
            }
            PathEl::LineTo(p) => {
                let p = check(p)?;
                if cur.is_empty() {
                    cur.push(start);
                }
                if cur.last() != Some(&p) {
                    cur.push(p);
                }
            }
            PathEl::ClosePath => {
                ret.push(std::mem::take(&mut cur));
            }
            PathEl::QuadTo(..) => {
                return Err(Error::NonFlat(NonFlatPath {
                    element,
                    kind: crate::CurveKind::Quadratic,
                }))
            }
            PathEl::CurveTo(..) => {
                return Err(Error::NonFlat(NonFlatPath {
                    element,
                    kind: crate::CurveKind::Cubic,
                }))
            }
        }
    }
    ret.push(cur);

    for poly in &mut ret {
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
    }
    ret.retain(|poly| poly.len() >= 2);
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::CurveKind;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn endpoints_pair_up() {
        let mut segs = Segments::default();
        segs.add_polygon(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)], false);
        assert_eq!(segs.len(), 6);
        for e in segs.indices() {
            assert_eq!(segs[segs[e].other].other, e);
            assert_ne!(segs[segs[e].other].left, segs[e].left);
        }

        // The closing segment runs from (1, 1) back to (0, 0), so it's decreasing.
        let closing = EndIdx(4);
        assert!(segs[closing].left);
        assert!(!segs[closing].increasing);
        assert_eq!(segs[segs.start(closing)].point, p(1.0, 1.0));
        assert_eq!(segs[segs.end(closing)].point, p(0.0, 0.0));

        let vertical = EndIdx(2);
        assert!(segs[vertical].vertical);
    }

    #[test]
    fn reverse_moves_state() {
        let mut segs = Segments::default();
        segs.add_polygon(&[p(0.0, 0.0), p(1.0, 0.0)], true);
        let l = EndIdx(0);
        segs[l].state.in_result = true;
        let start = segs[segs.start(l)].point;

        let r = segs.reverse(l);
        assert_eq!(r, EndIdx(1));
        assert!(segs[r].left && !segs[l].left);
        assert!(segs[r].state.in_result);
        assert!(!segs[l].state.in_result);
        assert_eq!(segs[r].state.self_windings, WindingNumber::unit(true, false));
        assert_eq!(segs[segs.start(r)].point, start);
    }

    #[test]
    fn split() {
        let mut segs = Segments::default();
        segs.add_polygon(&[p(0.0, 0.0), p(2.0, 2.0)], false);
        let l = EndIdx(0);
        let r = EndIdx(1);
        let (near_right, far_left) = segs.split(l, p(1.0, 1.0));

        assert_eq!(segs.points(l), (p(0.0, 0.0), p(1.0, 1.0)));
        assert_eq!(segs.points(far_left), (p(1.0, 1.0), p(2.0, 2.0)));
        assert_eq!(segs[near_right].other, l);
        assert_eq!(segs[r].other, far_left);
        assert_eq!(segs[l].state.version, 1);
        assert_eq!(segs[far_left].seg, segs[l].seg);
        assert_eq!(segs[far_left].state.self_windings, segs[l].state.self_windings);
    }

    #[test]
    fn polylines_close_implicitly() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((1.0, 1.0));
        path.close_path();
        path.line_to((0.0, 1.0));
        path.line_to((-1.0, 1.0));

        let polys = polylines(&path).unwrap();
        assert_eq!(
            polys,
            vec![
                vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)],
                vec![p(0.0, 0.0), p(0.0, 1.0), p(-1.0, 1.0)],
            ]
        );
    }

    #[test]
    fn polylines_reject_curves() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.quad_to((1.0, 1.0), (0.0, 1.0));
        assert_matches!(
            polylines(&path),
            Err(Error::NonFlat(NonFlatPath {
                element: 2,
                kind: CurveKind::Quadratic
            }))
        );

        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((f64::NAN, 0.0));
        assert_matches!(polylines(&path), Err(Error::NaN));

        let mut path = BezPath::new();
        path.move_to((f64::INFINITY, 0.0));
        assert_matches!(polylines(&path), Err(Error::Infinity));
    }
}
