#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod contours;
mod geom;
mod num;
mod order;
mod segments;
mod sweep;
mod winding;

#[cfg(feature = "generators")]
pub mod generators;

// pub so that we can use it in fuzz tests, but it's really private
#[doc(hidden)]
pub mod status;

pub use contours::{Contour, ContourIdx, Contours};
pub use geom::Point;
pub use segments::SegIdx;
pub use sweep::GeometryInconsistency;
pub use winding::WindingNumber;

use kurbo::{BezPath, Rect};
use log::debug;

use segments::Segments;
use sweep::{SnapGrid, Sweep};
use winding::{Classifier, Operation};

/// A fill rule tells us how to decide whether a point is "inside" a polyline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    #[default]
    NonZero,
    /// The point is "inside" if its winding number is positive.
    Positive,
    /// The point is "inside" if its winding number is negative.
    Negative,
}

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    /// A point is in the union of two sets if it is in either one.
    Union,
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the difference of two sets if it is in the first but not the second.
    Difference,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Xor,
}

/// The kinds of curves that we can't handle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CurveKind {
    /// A quadratic Bézier segment.
    Quadratic,
    /// A cubic Bézier segment.
    Cubic,
}

/// An input path contained a curve.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NonFlatPath {
    /// The index of the offending path element.
    pub element: usize,
    /// What kind of curve it was.
    pub kind: CurveKind,
}

/// Something went wrong.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs was not a number.
    NaN,
    /// One of the inputs had a curve in it.
    NonFlat(NonFlatPath),
    /// The sweep ran into numerical trouble, so the output can't be trusted.
    ///
    /// Use [`binary_op_with`] or [`settle_with`] to get the output anyway.
    Inconsistent(Vec<GeometryInconsistency>),
}

impl From<NonFlatPath> for Error {
    fn from(nfp: NonFlatPath) -> Self {
        Error::NonFlat(nfp)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infinity => write!(f, "one of the inputs was infinite"),
            Error::NaN => write!(f, "one of the inputs had a NaN"),
            Error::NonFlat(NonFlatPath { element, kind }) => {
                let kind = match kind {
                    CurveKind::Quadratic => "quadratic",
                    CurveKind::Cubic => "cubic",
                };
                write!(f, "path element {element} is a {kind} curve")
            }
            Error::Inconsistent(warnings) => {
                write!(f, "geometry became inconsistent")?;
                for w in warnings {
                    write!(f, "; {w}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

/// Tuning knobs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Options {
    /// How to decide which points are inside the inputs.
    pub fill_rule: FillRule,
    /// The snap-rounding tolerance.
    ///
    /// Output coordinates are multiples of a power of two that is at most this
    /// large. If this is `None` (or not a positive number), we pick a tolerance
    /// based on the magnitude of the input coordinates.
    pub tolerance: Option<f64>,
}

impl Options {
    /// Options with a fill rule and the default tolerance.
    pub fn with_fill_rule(fill_rule: FillRule) -> Self {
        Options {
            fill_rule,
            tolerance: None,
        }
    }
}

/// The result of a boolean operation, along with anything that went wrong while
/// computing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    /// The output set.
    pub contours: Contours,
    /// Problems that came up along the way. If this is empty, `contours` is exactly right
    /// (up to snap rounding).
    pub warnings: Vec<GeometryInconsistency>,
}

impl Output {
    /// Returns the contours, unless something went wrong.
    pub fn into_result(self) -> Result<Contours, Error> {
        if self.warnings.is_empty() {
            Ok(self.contours)
        } else {
            Err(Error::Inconsistent(self.warnings))
        }
    }

    fn empty() -> Self {
        Output {
            contours: Contours::default(),
            warnings: Vec::new(),
        }
    }
}

/// Picks a snapping tolerance that the input coordinates can support.
fn tolerance(polys: &[&[Vec<geom::Point>]], requested: Option<f64>) -> f64 {
    if let Some(tol) = requested.filter(|t| *t > 0.0 && t.is_finite()) {
        return tol;
    }
    let m = polys
        .iter()
        .flat_map(|ps| ps.iter().flatten())
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0, f64::max);
    let eps = m * (f64::EPSILON * 64.0);
    eps.max(1e-6)
}

/// Snaps polylines to the grid, removing any repeated points that creates.
fn snap_polylines(polys: Vec<Vec<geom::Point>>, grid: &SnapGrid) -> Vec<Vec<geom::Point>> {
    polys
        .into_iter()
        .filter_map(|poly| {
            let mut out: Vec<geom::Point> = Vec::with_capacity(poly.len());
            for p in poly {
                let p = grid.snap_point(p);
                if out.last() != Some(&p) {
                    out.push(p);
                }
            }
            while out.len() > 1 && out.first() == out.last() {
                out.pop();
            }
            (out.len() >= 2).then_some(out)
        })
        .collect()
}

fn bbox(poly: &[geom::Point]) -> Rect {
    let first = poly[0].to_kurbo();
    poly[1..]
        .iter()
        .fold(Rect::from_points(first, first), |r, p| r.union_pt(p.to_kurbo()))
}

/// Do two boxes intersect (or touch)?
fn touches(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Drops the polylines whose bounding boxes don't touch any of `others`' bounding boxes.
///
/// A closed polyline only changes winding numbers inside its bounding box, so these
/// can't affect the result of an intersection or difference.
fn prune(polys: Vec<Vec<geom::Point>>, others: &[Rect]) -> Vec<Vec<geom::Point>> {
    polys
        .into_iter()
        .filter(|poly| {
            let b = bbox(poly);
            others.iter().any(|o| touches(&b, o))
        })
        .collect()
}

fn run(
    subject: &BezPath,
    clipping: Option<&BezPath>,
    op: Operation,
    opts: &Options,
) -> Result<Output, Error> {
    let subject = segments::polylines(subject)?;
    let clipping = match clipping {
        Some(c) => segments::polylines(c)?,
        None => Vec::new(),
    };

    let tol = tolerance(&[subject.as_slice(), clipping.as_slice()], opts.tolerance);
    let grid = SnapGrid::new(tol);
    debug!("tolerance {tol}, grid size {}", grid.size());
    let mut subject = snap_polylines(subject, &grid);
    let mut clipping = snap_polylines(clipping, &grid);

    match op {
        Operation::Binary(BinaryOp::Intersection) => {
            let subject_boxes: Vec<_> = subject.iter().map(|p| bbox(p)).collect();
            let clipping_boxes: Vec<_> = clipping.iter().map(|p| bbox(p)).collect();
            subject = prune(subject, &clipping_boxes);
            clipping = prune(clipping, &subject_boxes);
            if subject.is_empty() || clipping.is_empty() {
                return Ok(Output::empty());
            }
        }
        Operation::Binary(BinaryOp::Difference) => {
            if subject.is_empty() {
                return Ok(Output::empty());
            }
            let subject_boxes: Vec<_> = subject.iter().map(|p| bbox(p)).collect();
            clipping = prune(clipping, &subject_boxes);
        }
        _ => {}
    }

    let mut segs = Segments::default();
    for poly in &subject {
        segs.add_polygon(poly, false);
    }
    for poly in &clipping {
        segs.add_polygon(poly, true);
    }
    debug!("sweeping {} segments", segs.len() / 2);

    let classifier = Classifier::new(op, opts.fill_rule);
    let (mut segs, mut warnings) = Sweep::new(segs, classifier, grid).run();
    let (contours, more_warnings) = contours::assemble(&mut segs, &classifier);
    warnings.extend(more_warnings);
    Ok(Output { contours, warnings })
}

/// Resolves the self-intersections of a path.
///
/// The output consists of non-crossing contours, with the filled parts on the left
/// of each contour.
pub fn settle_with(path: &BezPath, opts: &Options) -> Result<Output, Error> {
    run(path, None, Operation::Settle, opts)
}

/// Computes a boolean operation between two sets, each of which is described as a
/// collection of closed polylines.
pub fn binary_op_with(
    subject: &BezPath,
    clipping: &BezPath,
    op: BinaryOp,
    opts: &Options,
) -> Result<Output, Error> {
    run(subject, Some(clipping), Operation::Binary(op), opts)
}

/// Computes a boolean operation between two sets, returning the result as a path.
pub fn binary_op(
    subject: &BezPath,
    clipping: &BezPath,
    fill_rule: FillRule,
    op: BinaryOp,
) -> Result<BezPath, Error> {
    let output = binary_op_with(subject, clipping, op, &Options::with_fill_rule(fill_rule))?;
    Ok(output.into_result()?.to_path())
}

/// Resolves the self-intersections of a path, returning the result as a path.
pub fn settle(path: &BezPath, fill_rule: FillRule) -> Result<BezPath, Error> {
    let output = settle_with(path, &Options::with_fill_rule(fill_rule))?;
    Ok(output.into_result()?.to_path())
}

/// The intersection of two sets.
pub fn and(subject: &BezPath, clipping: &BezPath, fill_rule: FillRule) -> Result<BezPath, Error> {
    binary_op(subject, clipping, fill_rule, BinaryOp::Intersection)
}

/// The union of two sets.
pub fn or(subject: &BezPath, clipping: &BezPath, fill_rule: FillRule) -> Result<BezPath, Error> {
    binary_op(subject, clipping, fill_rule, BinaryOp::Union)
}

/// The symmetric difference of two sets.
pub fn xor(subject: &BezPath, clipping: &BezPath, fill_rule: FillRule) -> Result<BezPath, Error> {
    binary_op(subject, clipping, fill_rule, BinaryOp::Xor)
}

/// The part of `subject` that isn't in `clipping`.
pub fn not(subject: &BezPath, clipping: &BezPath, fill_rule: FillRule) -> Result<BezPath, Error> {
    binary_op(subject, clipping, fill_rule, BinaryOp::Difference)
}
