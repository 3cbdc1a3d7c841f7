//! Orderings on endpoints and segments.
//!
//! There are two orders here: the event order, which decides when the sweep line
//! processes an endpoint, and the vertical order of segments that are crossing the
//! sweep line at the same time.

use std::cmp::Ordering;

use crate::{
    geom::{cross, orient},
    segments::{EndIdx, Segments},
};

/// Orders two overlapping segments.
///
/// Segments from the clipping path go above segments from the subject path, and
/// otherwise we order by input segment and then by endpoint.
fn compare_overlaps(segs: &Segments, a: EndIdx, b: EndIdx) -> Ordering {
    segs[a]
        .clipping
        .cmp(&segs[b].clipping)
        .then(segs[a].seg.cmp(&segs[b].seg))
        .then(a.cmp(&b))
}

/// Orders two segments that start at the same point, by their direction.
///
/// Shallower directions come first, and vertical segments come last.
pub fn compare_tangents(segs: &Segments, a: EndIdx, b: EndIdx) -> Ordering {
    let (a0, a1) = segs.points(a);
    let (b0, b1) = segs.points(b);
    let da = a1.minus(a0);
    let db = b1.minus(b0);
    let a_vertical = da.0 == 0.0;
    let b_vertical = db.0 == 0.0;

    match (a_vertical, b_vertical) {
        (true, true) => compare_overlaps(segs, a, b),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            // If b is counter-clockwise from a, b is steeper.
            let c = cross(da, db);
            if c > 0.0 {
                Ordering::Less
            } else if c < 0.0 {
                Ordering::Greater
            } else {
                compare_overlaps(segs, a, b)
            }
        }
    }
}

/// The order in which endpoints are processed.
///
/// Points go left to right (and bottom to top). At the same point, right endpoints
/// come before left endpoints, and left endpoints are sorted by their direction.
pub fn compare_events(segs: &Segments, a: EndIdx, b: EndIdx) -> Ordering {
    let ea = &segs[a];
    let eb = &segs[b];
    ea.point
        .cmp(&eb.point)
        .then(ea.left.cmp(&eb.left))
        .then_with(|| {
            if ea.left && eb.left {
                compare_tangents(segs, a, b)
            } else {
                Ordering::Equal
            }
        })
        .then(a.cmp(&b))
}

/// The vertical order of two segments that are both crossing the sweep line.
///
/// `a` and `b` are the segments' left endpoints. We compare at the later of the two
/// left endpoints: the one that starts later gets compared against the line of the
/// one that started earlier.
pub fn compare_segments(segs: &Segments, a: EndIdx, b: EndIdx) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (a0, a1) = segs.points(a);
    let (b0, b1) = segs.points(b);

    if a0 == b0 {
        return compare_tangents(segs, a, b);
    }
    if a0.x == b0.x {
        return a0.y.total_cmp(&b0.y);
    }

    // Compare b's start against a's line, flipping things around if b started first.
    let (first, p0, p1, q0, q1, flip) = if a0 < b0 {
        (a, a0, a1, b0, b1, false)
    } else {
        (b, b0, b1, a0, a1, true)
    };
    let o = orient(p0, p1, q0);
    let ord = if o > 0.0 {
        // The later one starts above the earlier one.
        Ordering::Less
    } else if o < 0.0 {
        Ordering::Greater
    } else {
        let c = cross(p1.minus(p0), q1.minus(q0));
        if c > 0.0 {
            Ordering::Less
        } else if c < 0.0 {
            Ordering::Greater
        } else {
            let other = if first == a { b } else { a };
            compare_overlaps(segs, first, other)
        }
    };
    if flip {
        ord.reverse()
    } else {
        ord
    }
}
