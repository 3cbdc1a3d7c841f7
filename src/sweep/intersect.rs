use std::collections::HashSet;

use log::debug;

use super::{GeometryInconsistency, Sweep};
use crate::{
    geom::{self, Point},
    segments::{EndIdx, SegIdx, Segments},
};

/// A segment, as of a particular version of its geometry.
type SegKey = (EndIdx, u32);

/// The pairs of segments that have already been tested for intersection.
///
/// A segment is identified by its left endpoint together with its version, so
/// moving or shortening a segment automatically makes its pairs stale.
#[derive(Clone, Debug, Default)]
pub struct HandledPairs {
    pairs: HashSet<(SegKey, SegKey)>,
}

fn key(segs: &Segments, e: EndIdx) -> SegKey {
    let l = segs.left(e);
    (l, segs[l].state.version)
}

fn ordered(a: SegKey, b: SegKey) -> (SegKey, SegKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl HandledPairs {
    /// Has this pair already been handled?
    #[cfg(test)]
    pub fn contains(&self, segs: &Segments, a: EndIdx, b: EndIdx) -> bool {
        self.pairs.contains(&ordered(key(segs, a), key(segs, b)))
    }

    /// Marks this pair as handled, returning true if it wasn't already.
    pub fn insert(&mut self, segs: &Segments, a: EndIdx, b: EndIdx) -> bool {
        self.pairs.insert(ordered(key(segs, a), key(segs, b)))
    }

    /// Marks every pair between the two groups as handled.
    pub fn insert_all(&mut self, segs: &Segments, xs: &[EndIdx], ys: &[EndIdx]) {
        for &x in xs {
            for &y in ys {
                self.insert(segs, x, y);
            }
        }
    }
}

impl Sweep {
    /// Tests two segments for intersection, and splits them where they meet.
    pub(super) fn check_pair(&mut self, a: EndIdx, b: EndIdx) {
        if !self.splitting {
            return;
        }
        let a = self.segs.left(a);
        let b = self.segs.left(b);
        if a == b {
            return;
        }
        for e in [a, b] {
            if self.segs[e].dead || self.segs[e].vertical {
                return;
            }
        }
        if !self.handled.insert(&self.segs, a, b) {
            return;
        }

        let (a0, a1) = self.segs.points(a);
        let (b0, b1) = self.segs.points(b);
        let hits = geom::intersect(a0, a1, b0, b1, self.grid.half());
        if hits.is_empty() {
            return;
        }
        debug!("{a:?} and {b:?} intersect at {hits:?}");

        let segments = (self.segs[a].seg, self.segs[b].seg);
        let mut a_pieces = vec![a];
        let mut b_pieces = vec![b];
        for z in hits {
            for pieces in [&mut a_pieces, &mut b_pieces] {
                // unwrap: pieces always starts out non-empty
                let last = *pieces.last().unwrap();
                if let Some(far) = self.split_at(last, z, segments) {
                    pieces.push(far);
                }
            }
        }
        self.handled.insert_all(&self.segs, &a_pieces, &b_pieces);
    }

    /// Splits a segment at an intersection point, unless that point is already
    /// (up to snapping) one of its endpoints.
    ///
    /// Returns the left endpoint of the far half.
    fn split_at(&mut self, l: EndIdx, z: Point, segments: (SegIdx, SegIdx)) -> Option<EndIdx> {
        let (p, q) = self.segs.points(l);
        if !(p < z && z < q) {
            return None;
        }
        let snapped = self.grid.snap_point(z);
        if snapped == self.grid.snap_point(p) || snapped == self.grid.snap_point(q) {
            return None;
        }

        if snapped.x < self.column {
            self.warn(GeometryInconsistency::IntersectionBehindSweep {
                segments,
                point: z,
                column: self.column,
            });
            None
        } else if snapped.x == self.column {
            let (_, far_left) = self.reroute(l, z);
            Some(far_left)
        } else {
            let (near_right, far_left) = self.segs.split(l, z);
            self.queue.push(&self.segs, near_right);
            self.queue.push(&self.segs, far_left);
            Some(far_left)
        }
    }
}
