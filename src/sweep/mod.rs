//! A snap-rounded sweep-line algorithm.
//!
//! The sweep line moves from left to right, one column of the snapping grid at a
//! time. Within a column, we first process all the events that snap to it. Then we
//! repeatedly
//!
//! - break up any segment that passes through a tolerance square of the column
//!   without having an endpoint there, by re-routing it through the square's center,
//! - snap every endpoint that's new in this column to the grid, and put the segments
//!   that moved back into the sweep line at their new position,
//!
//! until nothing changes. Finally we compute winding numbers for the segments that
//! start in the column, and merge coincident segments that end in it.
//!
//! Because every segment that comes close to an endpoint gets re-routed through it,
//! the order of segments in the sweep line can't be upset by rounding errors in the
//! intersection computations.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace, warn};

use crate::{
    geom::Point,
    order::compare_segments,
    segments::{EndIdx, SegIdx, Segments},
    status::SweepStatus,
    winding::{Classifier, WindingNumber},
};

mod intersect;
mod queue;
mod snap;

use intersect::HandledPairs;
use queue::EventQueue;
pub use snap::SnapGrid;
use snap::ToleranceSquares;

/// If a single column needs more rounds of snapping than this, we give up on it.
const MAX_ROUNDS: usize = 32;

/// Something went wrong in the sweep, but we carried on anyway.
///
/// These indicate that the output might not be exactly right: usually that some
/// intersection was missed because of numerical trouble.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryInconsistency {
    /// A segment ended, but it wasn't in the sweep line.
    MissingNode {
        /// The input segment.
        segment: SegIdx,
        /// Where it ended.
        point: Point,
    },
    /// Two segments intersect at a point that the sweep line has already passed.
    IntersectionBehindSweep {
        /// The input segments.
        segments: (SegIdx, SegIdx),
        /// The intersection point.
        point: Point,
        /// The current position of the sweep line.
        column: f64,
    },
    /// Snap rounding of a column didn't settle down, so it was abandoned.
    UnsettledColumn {
        /// The column's `x` coordinate.
        column: f64,
    },
    /// Some coincident segments couldn't be merged in the right order.
    AmbiguousOverlap {
        /// The input segments.
        segments: Vec<SegIdx>,
        /// One end of the overlap.
        start: Point,
        /// The other end of the overlap.
        end: Point,
    },
    /// Contour assembly ran out of segments before closing a contour.
    UnclosedContour {
        /// Where the contour started.
        start: Point,
        /// Where it got stuck.
        stuck_at: Point,
    },
}

impl std::fmt::Display for GeometryInconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryInconsistency::MissingNode { segment, point } => {
                write!(f, "segment {segment:?} ended at {point} but wasn't in the sweep line")
            }
            GeometryInconsistency::IntersectionBehindSweep {
                segments: (a, b),
                point,
                column,
            } => write!(
                f,
                "segments {a:?} and {b:?} intersect at {point}, \
                 behind the sweep line at x = {column}"
            ),
            GeometryInconsistency::UnsettledColumn { column } => {
                write!(f, "snap rounding didn't settle at x = {column}")
            }
            GeometryInconsistency::AmbiguousOverlap {
                segments,
                start,
                end,
            } => write!(
                f,
                "couldn't order overlapping segments {segments:?} between {start} and {end}"
            ),
            GeometryInconsistency::UnclosedContour { start, stuck_at } => write!(
                f,
                "contour starting at {start} got stuck at {stuck_at}"
            ),
        }
    }
}

/// The state of the sweep line.
pub(crate) struct Sweep {
    segs: Segments,
    classifier: Classifier,
    grid: SnapGrid,
    queue: EventQueue,
    status: SweepStatus<EndIdx>,
    handled: HandledPairs,
    squares: ToleranceSquares,
    /// Endpoints that have appeared in this column since we last snapped.
    pending: Vec<EndIdx>,
    /// Vertical segments in this column (their bottom endpoints).
    verticals: Vec<EndIdx>,
    /// How many of `verticals` we've already checked for crossings.
    verticals_checked: usize,
    column: f64,
    /// Turned off when a column doesn't settle, to guarantee termination.
    splitting: bool,
    warnings: Vec<GeometryInconsistency>,
}

impl Sweep {
    /// Prepares to sweep over some segments.
    ///
    /// All of the segments' endpoints should already be on the grid.
    pub fn new(segs: Segments, classifier: Classifier, grid: SnapGrid) -> Self {
        let queue = EventQueue::new(&segs, segs.indices().collect());
        Sweep {
            segs,
            classifier,
            grid,
            queue,
            status: SweepStatus::new(),
            handled: HandledPairs::default(),
            squares: ToleranceSquares::default(),
            pending: Vec::new(),
            verticals: Vec::new(),
            verticals_checked: 0,
            column: f64::NEG_INFINITY,
            splitting: true,
            warnings: Vec::new(),
        }
    }

    /// Runs the sweep to completion.
    ///
    /// Returns the segments, with their winding numbers filled in, along with anything
    /// that went wrong.
    pub fn run(mut self) -> (Segments, Vec<GeometryInconsistency>) {
        while let Some(top) = self.queue.top() {
            let column = self.grid.snap(self.segs[top].point.x);
            self.process_column(column);
        }
        (self.segs, self.warnings)
    }

    fn warn(&mut self, w: GeometryInconsistency) {
        warn!("{w}");
        self.warnings.push(w);
    }

    fn process_column(&mut self, column: f64) {
        debug!(
            "column x = {column}: {} active segments, {} queued events",
            self.status.len(),
            self.queue.len()
        );
        self.column = column;
        self.splitting = true;

        self.drain_column();
        let mut rounds = 0;
        loop {
            if self.splitting {
                self.break_up();
            }
            if self.pending.is_empty() {
                break;
            }
            self.snap_pending();
            if self.splitting {
                self.cross_verticals();
            }

            rounds += 1;
            if rounds == MAX_ROUNDS {
                self.warn(GeometryInconsistency::UnsettledColumn { column });
                self.splitting = false;
            }
        }
        self.finish_column();

        #[cfg(feature = "slow-asserts")]
        self.check_invariants();
    }

    /// Pops all of the events that snap to the current column.
    fn drain_column(&mut self) {
        while let Some(e) = self.queue.top() {
            if self.grid.snap(self.segs[e].point.x) != self.column {
                break;
            }
            self.queue.pop(&self.segs);
            if self.segs[e].dead {
                continue;
            }
            trace!(
                "{} event {e:?} at {:?}",
                if self.segs[e].left { "left" } else { "right" },
                self.segs[e].point
            );

            if self.segs[e].left {
                let segs = &self.segs;
                let node = self.status.insert(e, |other| compare_segments(segs, e, other));
                self.segs[e].node = Some(node);
                self.check_neighbors(e);
            } else {
                let l = self.segs[e].other;
                if self.segs[l].node.is_some() {
                    self.remove_from_sweep_line(l);
                } else if !self.segs[l].vertical {
                    self.warn(GeometryInconsistency::MissingNode {
                        segment: self.segs[e].seg,
                        point: self.segs[e].point,
                    });
                }
            }
            self.register(e);
        }
    }

    fn register(&mut self, e: EndIdx) {
        let y = self.grid.snap(self.segs[e].point.y);
        self.squares.register(y, e);
        self.pending.push(e);
    }

    /// Takes a segment out of the sweep line, and checks its former neighbors against each other.
    fn remove_from_sweep_line(&mut self, l: EndIdx) {
        if let Some(node) = self.segs[l].node.take() {
            let prev = self.status.prev(node).map(|n| self.status.get(n));
            let next = self.status.next(node).map(|n| self.status.get(n));
            self.status.remove(node);
            if let (Some(p), Some(n)) = (prev, next) {
                self.check_pair(p, n);
            }
        }
    }

    /// Checks a segment in the sweep line against its neighbors.
    fn check_neighbors(&mut self, e: EndIdx) {
        // Each check can split `e`, after which it might not be in the sweep line anymore.
        if let Some(prev) = self.segs[e].node.and_then(|n| self.status.prev(n)) {
            let p = self.status.get(prev);
            self.check_pair(p, e);
        }
        if let Some(next) = self.segs[e].node.and_then(|n| self.status.next(n)) {
            let n = self.status.get(next);
            self.check_pair(e, n);
        }
    }

    /// Finds segments that pass through a tolerance square in this column without having
    /// an endpoint in it, and re-routes them through the square's center.
    fn break_up(&mut self) {
        let h = self.grid.half();
        let (x0, x1) = (self.column - h, self.column + h);
        let mut seen = HashSet::new();
        let mut reroutes = Vec::new();

        for y in self.squares.heights() {
            let center = Point::new(self.column, y);
            let segs = &self.segs;
            let grid = &self.grid;
            let column = self.column;
            let passes_through = |e: EndIdx| -> Option<bool> {
                let (lo, hi) = segs.y_range(e, x0, x1)?;
                Some(hi >= y - h && lo < y + h && grid.snap_point(segs[e].point) != center)
            };

            // Scan down from the last segment below the center, then up from the one after it.
            let anchor = self.status.last_where(|e| segs.y_at(e, column) <= y);
            let mut cur = anchor;
            while let Some(n) = cur {
                let e = self.status.get(n);
                if segs.y_range(e, x0, x1).is_some_and(|(_, hi)| hi < y - h) {
                    break;
                }
                if passes_through(e) == Some(true) && seen.insert(e) {
                    reroutes.push((e, center));
                }
                cur = self.status.prev(n);
            }

            let mut cur = match anchor {
                Some(a) => self.status.next(a),
                None => self.status.first(),
            };
            while let Some(n) = cur {
                let e = self.status.get(n);
                if segs.y_range(e, x0, x1).is_some_and(|(lo, _)| lo >= y + h) {
                    break;
                }
                if passes_through(e) == Some(true) && seen.insert(e) {
                    reroutes.push((e, center));
                }
                cur = self.status.next(n);
            }
        }

        // Segments that end in this column have already left the sweep line, but they
        // can still cut through another square on their way in.
        let mut ending: Vec<_> = self
            .squares
            .members()
            .filter(|&e| !self.segs[e].left && !self.segs[e].dead)
            .map(|e| self.segs[e].other)
            .collect();
        ending.sort();
        ending.dedup();
        let mut ending_reroutes = Vec::new();
        for l in ending {
            let end = &self.segs[l];
            if end.node.is_some() || end.vertical || self.grid.snap(end.point.x) == self.column {
                continue;
            }
            let ends = [
                self.grid.snap_point(end.point),
                self.grid.snap_point(self.segs[end.other].point),
            ];
            let Some((lo, hi)) = self.segs.y_range(l, x0, x1) else {
                continue;
            };
            let center = self
                .squares
                .heights()
                .map(|y| Point::new(self.column, y))
                .find(|c| hi >= c.y - h && lo < c.y + h && !ends.contains(c));
            if let Some(center) = center {
                ending_reroutes.push((l, center));
            }
        }

        for (e, center) in reroutes {
            if !self.segs[e].dead && self.segs[e].node.is_some() {
                debug!("re-routing {e:?} through {center:?}");
                self.reroute(e, center);
            }
        }
        for (l, center) in ending_reroutes {
            debug!("re-routing ending segment {l:?} through {center:?}");
            self.reroute(l, center);
        }
    }

    /// Splits a segment at a point in the current column.
    ///
    /// The far half takes the near half's place in the sweep line, and the near half
    /// leaves it (since it now ends in this column).
    fn reroute(&mut self, e: EndIdx, z: Point) -> (EndIdx, EndIdx) {
        let l = self.segs.left(e);
        let node = self.segs[l].node;
        let (near_right, far_left) = self.segs.split(l, z);
        if node.is_some() {
            let far_node = self.status.insert_after(node, far_left);
            self.segs[far_left].node = Some(far_node);
            if let Some(n) = self.segs[l].node.take() {
                self.status.remove(n);
            }
        }
        self.register(near_right);
        self.register(far_left);
        (near_right, far_left)
    }

    /// Snaps all the pending endpoints, and fixes up the segments that they belong to.
    fn snap_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for &e in &pending {
            let p = self.segs[e].point;
            let q = self.grid.snap_point(p);
            if p != q {
                self.segs[e].point = q;
                let l = self.segs.left(e);
                self.segs[l].state.version += 1;
            }
        }

        let mut touched: Vec<_> = pending.iter().map(|&e| self.segs.left(e)).collect();
        touched.sort();
        touched.dedup();

        let mut reinsert = Vec::new();
        let mut to_check = Vec::new();
        for l in touched {
            if self.segs[l].dead {
                continue;
            }
            if let Some(node) = self.segs[l].node.take() {
                let prev = self.status.prev(node).map(|n| self.status.get(n));
                let next = self.status.next(node).map(|n| self.status.get(n));
                self.status.remove(node);
                if let (Some(p), Some(n)) = (prev, next) {
                    to_check.push((p, n));
                }
            }

            let r = self.segs[l].other;
            let l_in = self.segs[l].point.x == self.column;
            let r_in = self.segs[r].point.x == self.column;
            if l_in && r_in {
                if self.segs[l].point == self.segs[r].point {
                    trace!("segment {l:?} collapsed at {:?}", self.segs[l].point);
                    self.segs.kill(l);
                } else {
                    let l = self.segs.normalize(l);
                    self.verticals.push(l);
                }
            } else if l_in {
                let l = self.segs.normalize(l);
                reinsert.push(l);
            }
            // Otherwise, the segment ended in this column and it's already out of the sweep line.
        }

        reinsert.sort_by(|&a, &b| compare_segments(&self.segs, a, b));
        for &l in &reinsert {
            let segs = &self.segs;
            let node = self.status.insert(l, |other| compare_segments(segs, l, other));
            self.segs[l].node = Some(node);
        }
        for (p, n) in to_check {
            self.check_pair(p, n);
        }
        for l in reinsert {
            self.check_neighbors(l);
        }
    }

    /// Looks for segments crossing the interiors of this column's vertical segments.
    ///
    /// We don't compare vertical segments against the sweep line, so instead we make
    /// sure that there's a tolerance square wherever something crosses them. The next
    /// round of breaking up will then split the crossing segment there.
    fn cross_verticals(&mut self) {
        while self.verticals_checked < self.verticals.len() {
            let v = self.verticals[self.verticals_checked];
            self.verticals_checked += 1;
            if self.segs[v].dead {
                continue;
            }

            let (bottom, top) = self.segs.points(v);
            let segs = &self.segs;
            let column = self.column;
            let below = self.status.last_where(|e| segs.y_at(e, column) <= bottom.y);
            let mut cur = match below {
                Some(b) => self.status.next(b),
                None => self.status.first(),
            };
            while let Some(n) = cur {
                let e = self.status.get(n);
                let y = self.segs.y_at(e, column);
                if y >= top.y {
                    break;
                }
                if self.squares.ensure(self.grid.snap(y)) {
                    debug!("{e:?} crosses vertical segment {v:?} at y = {y}");
                }
                cur = self.status.next(n);
            }
        }
    }

    /// Splits vertical segments at squares, computes winding numbers and merges
    /// coincident segments.
    fn finish_column(&mut self) {
        let column = self.column;

        // Vertical segments get split wherever another segment touches them.
        let mut verticals = Vec::new();
        for v in std::mem::take(&mut self.verticals) {
            if self.segs[v].dead {
                continue;
            }
            let (bottom, top) = self.segs.points(v);
            let mut cur = v;
            for y in self.squares.heights_between(bottom.y, top.y) {
                let (near_right, far_left) = self.segs.split(cur, Point::new(column, y));
                self.squares.register(y, near_right);
                self.squares.register(y, far_left);
                verticals.push(cur);
                cur = far_left;
            }
            verticals.push(cur);
        }
        self.verticals_checked = 0;

        // Segments that start here get their winding numbers from the segment below.
        let mut starting: Vec<_> = self
            .squares
            .members()
            .filter(|&e| {
                let end = &self.segs[e];
                end.left && !end.dead && !end.vertical && end.node.is_some()
            })
            .collect();
        starting.sort();
        starting.dedup();
        // Re-routing can leave overlapping segments in a different order than
        // `compare_segments` would give them, so we follow the sweep line itself: find
        // the bottom of each run of starting segments and work upwards from there.
        let mut todo: HashSet<_> = starting.iter().copied().collect();
        for l in starting {
            if !todo.contains(&l) {
                continue;
            }
            // unwrap: we only kept segments that are in the sweep line
            let mut node = self.segs[l].node.unwrap();
            while let Some(prev) = self
                .status
                .prev(node)
                .filter(|&n| todo.contains(&self.status.get(n)))
            {
                node = prev;
            }

            let mut cur = Some(node);
            while let Some(n) = cur {
                let e = self.status.get(n);
                if !todo.remove(&e) {
                    break;
                }
                let below = self.status.prev(n).map(|n| self.status.get(n));
                let windings = below.map_or(WindingNumber::default(), |b| self.segs.above(b));
                self.set_windings(e, below, windings);
                cur = self.status.next(n);
            }
        }

        // Vertical segments get their winding numbers from the segment to their east.
        for v in &verticals {
            let bottom = self.segs[*v].point;
            let segs = &self.segs;
            let east = self
                .status
                .last_where(|e| segs.y_at(e, column) <= bottom.y)
                .map(|n| self.status.get(n));
            let windings = east.map_or(WindingNumber::default(), |e| self.segs.above(e));
            self.set_windings(*v, None, windings);
        }

        self.merge_coincident();
        self.squares.clear();
    }

    fn set_windings(&mut self, l: EndIdx, below: Option<EndIdx>, windings: WindingNumber) {
        let state = &mut self.segs[l].state;
        state.below = below;
        state.windings = windings;
        state.in_result = self.classifier.is_boundary(windings, state.self_windings);
        trace!(
            "{l:?}: windings {windings:?}, in result: {}",
            state.in_result
        );
    }

    /// Merges segments that end in this column and have identical endpoints.
    fn merge_coincident(&mut self) {
        let mut groups: BTreeMap<(Point, Point), Vec<EndIdx>> = BTreeMap::new();
        let ending: HashSet<_> = self
            .squares
            .members()
            .filter(|&e| !self.segs[e].left && !self.segs[e].dead)
            .map(|e| self.segs[e].other)
            .collect();
        for l in ending {
            groups.entry(self.segs.points(l)).or_default().push(l);
        }

        for ((start, end), mut group) in groups {
            if group.len() < 2 {
                continue;
            }
            group.sort();

            let survivor = if self.segs[group[0]].vertical {
                group[0]
            } else {
                let bottoms: Vec<_> = group
                    .iter()
                    .copied()
                    .filter(|&m| {
                        !self.segs[m]
                            .state
                            .below
                            .is_some_and(|b| group.contains(&b))
                    })
                    .collect();
                if let [bottom] = bottoms[..] {
                    bottom
                } else {
                    self.warn(GeometryInconsistency::AmbiguousOverlap {
                        segments: group.iter().map(|&m| self.segs[m].seg).collect(),
                        start,
                        end,
                    });
                    group[0]
                }
            };

            let mut total = WindingNumber::default();
            for &m in &group {
                total += self.segs[m].state.self_windings;
                if m != survivor {
                    self.segs.kill(m);
                }
            }
            let state = &mut self.segs[survivor].state;
            state.self_windings = total;
            state.in_result = self.classifier.is_boundary(state.windings, total);
            trace!(
                "merged {} segments from {start:?} to {end:?} into {survivor:?}",
                group.len()
            );
        }
    }

    #[cfg(feature = "slow-asserts")]
    fn check_invariants(&self) {
        self.status.check_invariants();
        for node in self.status.nodes() {
            let e = self.status.get(node);
            let end = &self.segs[e];
            assert!(end.left && !end.dead && !end.vertical, "bad segment {e:?} in sweep line");
            assert_eq!(end.node, Some(node));
            assert!(self.segs[end.other].point.x > self.column);
        }
    }
}
