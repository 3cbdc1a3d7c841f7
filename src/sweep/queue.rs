use std::cmp::Ordering;

use crate::{
    order::compare_events,
    segments::{EndIdx, Segments},
};

/// A binary min-heap of endpoints, in event order.
///
/// The heap only stores indices; the order is looked up in the endpoint arena, which
/// is why every operation takes one. Endpoints in the queue must not move.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    heap: Vec<EndIdx>,
}

impl EventQueue {
    /// Builds a queue out of a bunch of endpoints, in linear time.
    pub fn new(segs: &Segments, events: Vec<EndIdx>) -> Self {
        let mut ret = EventQueue { heap: events };
        for i in (0..ret.heap.len() / 2).rev() {
            ret.sift_down(segs, i);
        }
        ret
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// The next event, without removing it.
    pub fn top(&self) -> Option<EndIdx> {
        self.heap.first().copied()
    }

    pub fn push(&mut self, segs: &Segments, e: EndIdx) {
        self.heap.push(e);
        self.sift_up(segs, self.heap.len() - 1);
    }

    pub fn pop(&mut self, segs: &Segments) -> Option<EndIdx> {
        if self.heap.is_empty() {
            return None;
        }
        let ret = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(segs, 0);
        }
        Some(ret)
    }

    fn less(&self, segs: &Segments, i: usize, j: usize) -> bool {
        compare_events(segs, self.heap[i], self.heap[j]) == Ordering::Less
    }

    fn sift_up(&mut self, segs: &Segments, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.less(segs, i, parent) {
                self.heap.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, segs: &Segments, mut i: usize) {
        let n = self.heap.len();
        loop {
            let l = 2 * i + 1;
            let r = l + 1;
            let mut smallest = i;
            if l < n && self.less(segs, l, smallest) {
                smallest = l;
            }
            if r < n && self.less(segs, r, smallest) {
                smallest = r;
            }
            if smallest == i {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::geom::{tests::reasonable_point, Point};

    #[test]
    fn rights_before_lefts() {
        let mut segs = Segments::default();
        segs.add_polygon(
            &[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
            false,
        );
        let mut queue = EventQueue::new(&segs, segs.indices().collect());
        let mut popped = Vec::new();
        while let Some(e) = queue.pop(&segs) {
            popped.push((segs[e].point, segs[e].left));
        }
        assert_eq!(
            popped,
            vec![
                (Point::new(0.0, 0.0), true),
                (Point::new(0.0, 0.0), true),
                (Point::new(0.0, 1.0), false),
                (Point::new(0.0, 1.0), true),
                (Point::new(1.0, 0.0), false),
                (Point::new(1.0, 0.0), false),
            ]
        );
    }

    proptest! {
    #[test]
    fn pops_in_order(
        points in prop::collection::vec(reasonable_point(), 3..20),
        extra in 0usize..20
    ) {
        let mut segs = Segments::default();
        segs.add_polygon(&points, false);
        let all: Vec<_> = segs.indices().collect();
        let split = extra.min(all.len());
        let mut queue = EventQueue::new(&segs, all[..split].to_vec());
        for &e in &all[split..] {
            queue.push(&segs, e);
        }
        prop_assert_eq!(queue.len(), all.len());

        let mut sorted = all.clone();
        sorted.sort_by(|&a, &b| compare_events(&segs, a, b));
        let mut popped = Vec::new();
        while let Some(e) = queue.pop(&segs) {
            popped.push(e);
        }
        prop_assert_eq!(popped, sorted);
    }
    }
}
