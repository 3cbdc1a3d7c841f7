//! Walking the output segments to build closed contours.

use std::collections::BTreeMap;

use kurbo::BezPath;
use log::{debug, trace};

use crate::{
    geom::{cross, dot, Point},
    segments::{EndIdx, Segments},
    sweep::GeometryInconsistency,
    winding::Classifier,
};

/// An index for a [`Contour`] within [`Contours`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Serialize)]
pub struct ContourIdx(pub usize);

/// A closed polyline.
///
/// Contours don't cross one another, but they can touch at vertices.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Contour {
    /// The points making up this contour.
    ///
    /// If you're drawing a contour with line segments, don't forget to close it: the last point
    /// should be connected to the first point. The first point is always the smallest one (in
    /// lexicographic order), and no point lies on the straight line between its neighbors.
    pub points: Vec<Point>,

    /// Whether this contour is "outer" or not.
    ///
    /// As you walk along a contour, the "occupied" part of the set it represents is
    /// on your left. This means that outer contours wind counter-clockwise and inner
    /// contours (holes) wind clockwise.
    pub outer: bool,
}

impl Contour {
    fn new(points: Vec<Point>) -> Self {
        let mut ret = Contour {
            points,
            outer: true,
        };
        ret.outer = ret.signed_area() > 0.0;
        ret
    }

    /// The area enclosed by this contour: positive for outer contours and negative
    /// for holes.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice / 2.0
    }

    /// Converts this contour to a closed path.
    pub fn to_path(&self) -> BezPath {
        let mut ret = BezPath::new();
        if let Some((first, rest)) = self.points.split_first() {
            ret.move_to(first.to_kurbo());
            for p in rest {
                ret.line_to(p.to_kurbo());
            }
            ret.close_path();
        }
        ret
    }
}

/// A collection of [`Contour`]s.
///
/// Can be indexed with a [`ContourIdx`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Contours {
    contours: Vec<Contour>,
}

impl Contours {
    /// Iterates over all of the contours.
    pub fn contours(&self) -> impl Iterator<Item = &Contour> + '_ {
        self.contours.iter()
    }

    /// The number of contours.
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Are there no contours at all?
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// The total area of the set, counting holes negatively.
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }

    /// Converts all the contours into a single path, one closed sub-path per contour.
    pub fn to_path(&self) -> BezPath {
        let mut ret = BezPath::new();
        for c in &self.contours {
            ret.extend(c.to_path().elements().iter().cloned());
        }
        ret
    }
}

impl std::ops::Index<ContourIdx> for Contours {
    type Output = Contour;

    fn index(&self, index: ContourIdx) -> &Self::Output {
        &self.contours[index.0]
    }
}

/// An output segment, oriented so that the output set is on its left.
#[derive(Clone, Copy, Debug)]
struct Edge {
    from: Point,
    to: Point,
    seg: EndIdx,
}

/// How far we turn clockwise to go from direction `r` to direction `d`, in `(0, 2π]`.
fn clockwise_angle(r: (f64, f64), d: (f64, f64)) -> f64 {
    let angle = -cross(r, d).atan2(dot(r, d));
    if angle <= 0.0 {
        angle + std::f64::consts::TAU
    } else {
        angle
    }
}

/// Removes points that are on the straight line between their neighbors.
fn drop_collinear(points: &mut Vec<Point>) {
    loop {
        let n = points.len();
        if n < 3 {
            return;
        }
        let redundant = (0..n).find(|&i| {
            let d0 = points[i].minus(points[(i + n - 1) % n]);
            let d1 = points[(i + 1) % n].minus(points[i]);
            cross(d0, d1) == 0.0 && dot(d0, d1) > 0.0
        });
        match redundant {
            Some(i) => {
                points.remove(i);
            }
            None => return,
        }
    }
}

/// Walks the segments that bound the output, and assembles them into contours.
///
/// At every vertex, we leave along the segment that makes the sharpest clockwise
/// turn from the one we arrived on. Since the output is on our left, this keeps
/// contours that only touch at a vertex separate.
pub(crate) fn assemble(
    segs: &mut Segments,
    classifier: &Classifier,
) -> (Contours, Vec<GeometryInconsistency>) {
    let mut edges: Vec<Edge> = segs
        .live_lefts()
        .filter(|&l| segs[l].state.in_result)
        .map(|l| {
            let (p, q) = segs.points(l);
            if classifier.is_inside(segs.above(l)) {
                Edge {
                    from: p,
                    to: q,
                    seg: l,
                }
            } else {
                Edge {
                    from: q,
                    to: p,
                    seg: l,
                }
            }
        })
        .collect();
    edges.sort_by(|a, b| (a.from, a.to, a.seg).cmp(&(b.from, b.to, b.seg)));

    let mut outgoing: BTreeMap<Point, Vec<usize>> = BTreeMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut warnings = Vec::new();
    let mut contours = Vec::new();
    for start in 0..edges.len() {
        if segs[edges[start].seg].state.processed {
            continue;
        }

        let mut points = vec![edges[start].from];
        let mut cur = start;
        loop {
            segs[edges[cur].seg].state.processed = true;
            let Edge { from, to, .. } = edges[cur];
            let back = from.minus(to);

            let next = outgoing
                .get(&to)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&i| i == start || !segs[edges[i].seg].state.processed)
                .map(|i| (clockwise_angle(back, edges[i].to.minus(to)), i))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            match next {
                Some((_, next)) if next == start => break,
                Some((_, next)) => {
                    points.push(to);
                    cur = next;
                }
                None => {
                    let w = GeometryInconsistency::UnclosedContour {
                        start: edges[start].from,
                        stuck_at: to,
                    };
                    log::warn!("{w}");
                    warnings.push(w);
                    points.push(to);
                    break;
                }
            }
        }

        drop_collinear(&mut points);
        if points.len() < 3 {
            trace!("dropping degenerate contour {points:?}");
            continue;
        }
        // unwrap: there are at least 3 points
        let min = (0..points.len()).min_by_key(|&i| points[i]).unwrap();
        points.rotate_left(min);
        contours.push(Contour::new(points));
    }

    contours.sort_by(|a, b| a.points.cmp(&b.points));
    debug!("assembled {} contours", contours.len());
    (Contours { contours }, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn angles() {
        let west = (-1.0, 0.0);
        assert_eq!(clockwise_angle(west, (0.0, 1.0)), std::f64::consts::FRAC_PI_2);
        assert_eq!(clockwise_angle(west, (1.0, 0.0)), std::f64::consts::PI);
        let down = clockwise_angle(west, (0.0, -1.0));
        assert!((down - 3.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        // Going straight back is the last resort.
        assert_eq!(clockwise_angle(west, west), std::f64::consts::TAU);
    }

    #[test]
    fn collinear_points() {
        let mut points = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 1.0),
        ];
        drop_collinear(&mut points);
        assert_eq!(points, vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);

        let mut triangle = vec![p(0.0, 0.0), p(2.0, 0.0), p(1.0, 1.0)];
        drop_collinear(&mut triangle);
        assert_eq!(triangle.len(), 3);
    }

    #[test]
    fn orientation() {
        let ccw = Contour::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        assert!(ccw.outer);
        assert_eq!(ccw.signed_area(), 0.5);

        let cw = Contour::new(vec![p(0.0, 0.0), p(1.0, 1.0), p(1.0, 0.0)]);
        assert!(!cw.outer);
        assert_eq!(cw.signed_area(), -0.5);

        let contours = Contours {
            contours: vec![ccw, cw],
        };
        assert_eq!(contours.area(), 0.0);
        assert_eq!(contours.to_path().elements().len(), 8);
    }
}
