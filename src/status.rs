//! An AVL tree with stable node handles.
//!
//! The sweep line keeps its active segments in one of these. The tree doesn't know
//! how to compare its items: every ordered operation takes a comparison closure,
//! because the order of segments depends on the endpoint arena that lives outside
//! the tree.
//!
//! Nodes are allocated from a per-tree pool, and a node keeps its [`NodeIdx`] for as
//! long as it's in the tree (removal relinks nodes rather than moving items around),
//! so callers can hold on to node handles.

use std::cmp::Ordering;

typed_vec!(
    /// A vector indexed by [`NodeIdx`].
    NodeVec,
    /// A handle to a node in a [`SweepStatus`].
    NodeIdx,
    "n"
);

#[derive(Clone, Debug)]
struct Node<T> {
    item: T,
    parent: Option<NodeIdx>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    height: i32,
}

/// A self-balancing binary tree of `T`s, in caller-defined order.
#[derive(Clone, Debug)]
pub struct SweepStatus<T> {
    nodes: NodeVec<Node<T>>,
    free: Vec<NodeIdx>,
    root: Option<NodeIdx>,
    len: usize,
}

impl<T> Default for SweepStatus<T> {
    fn default() -> Self {
        Self {
            nodes: NodeVec::default(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }
}

impl<T: Copy> SweepStatus<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of items in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The item stored at `node`.
    pub fn get(&self, node: NodeIdx) -> T {
        self.nodes[node].item
    }

    fn alloc(&mut self, item: T, parent: Option<NodeIdx>) -> NodeIdx {
        let node = Node {
            item,
            parent,
            left: None,
            right: None,
            height: 1,
        };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node)
        }
    }

    fn height(&self, node: Option<NodeIdx>) -> i32 {
        node.map_or(0, |n| self.nodes[n].height)
    }

    fn balance(&self, node: NodeIdx) -> i32 {
        self.height(self.nodes[node].left) - self.height(self.nodes[node].right)
    }

    fn update_height(&mut self, node: NodeIdx) {
        let h = 1 + self
            .height(self.nodes[node].left)
            .max(self.height(self.nodes[node].right));
        self.nodes[node].height = h;
    }

    fn replace_child(&mut self, parent: Option<NodeIdx>, old: NodeIdx, new: Option<NodeIdx>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    debug_assert_eq!(self.nodes[p].right, Some(old));
                    self.nodes[p].right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: NodeIdx) -> NodeIdx {
        // unwrap: only called when x is right-heavy
        let y = self.nodes[x].right.unwrap();
        let b = self.nodes[y].left;
        let p = self.nodes[x].parent;

        self.replace_child(p, x, Some(y));
        self.nodes[y].parent = p;
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[x].right = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(x);
        }
        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: NodeIdx) -> NodeIdx {
        // unwrap: only called when x is left-heavy
        let y = self.nodes[x].left.unwrap();
        let b = self.nodes[y].right;
        let p = self.nodes[x].parent;

        self.replace_child(p, x, Some(y));
        self.nodes[y].parent = p;
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[x].left = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(x);
        }
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Walks from `node` up to the root, fixing heights and rotating where necessary.
    ///
    /// # Panics
    ///
    /// Panics if it finds a node whose subtrees differ in height by more than two,
    /// which means that the tree was corrupted.
    fn rebalance_from(&mut self, mut node: Option<NodeIdx>) {
        while let Some(x) = node {
            self.update_height(x);
            let balance = self.balance(x);
            assert!(
                balance.abs() <= 2,
                "AVL invariant violated at {x:?}: balance {balance}"
            );

            let top = if balance == 2 {
                // unwrap: a left-heavy node has a left child
                let l = self.nodes[x].left.unwrap();
                if self.balance(l) < 0 {
                    self.rotate_left(l);
                }
                self.rotate_right(x)
            } else if balance == -2 {
                // unwrap: a right-heavy node has a right child
                let r = self.nodes[x].right.unwrap();
                if self.balance(r) > 0 {
                    self.rotate_right(r);
                }
                self.rotate_left(x)
            } else {
                x
            };
            node = self.nodes[top].parent;
        }

        #[cfg(feature = "slow-asserts")]
        self.check_invariants();
    }

    fn leftmost(&self, mut node: NodeIdx) -> NodeIdx {
        while let Some(l) = self.nodes[node].left {
            node = l;
        }
        node
    }

    fn rightmost(&self, mut node: NodeIdx) -> NodeIdx {
        while let Some(r) = self.nodes[node].right {
            node = r;
        }
        node
    }

    /// The smallest node.
    pub fn first(&self) -> Option<NodeIdx> {
        self.root.map(|r| self.leftmost(r))
    }

    /// The largest node.
    pub fn last(&self) -> Option<NodeIdx> {
        self.root.map(|r| self.rightmost(r))
    }

    /// The in-order successor of `node`.
    pub fn next(&self, node: NodeIdx) -> Option<NodeIdx> {
        if let Some(r) = self.nodes[node].right {
            return Some(self.leftmost(r));
        }
        let mut cur = node;
        while let Some(p) = self.nodes[cur].parent {
            if self.nodes[p].left == Some(cur) {
                return Some(p);
            }
            cur = p;
        }
        None
    }

    /// The in-order predecessor of `node`.
    pub fn prev(&self, node: NodeIdx) -> Option<NodeIdx> {
        if let Some(l) = self.nodes[node].left {
            return Some(self.rightmost(l));
        }
        let mut cur = node;
        while let Some(p) = self.nodes[cur].parent {
            if self.nodes[p].right == Some(cur) {
                return Some(p);
            }
            cur = p;
        }
        None
    }

    /// Searches for a position.
    ///
    /// `cmp` is called on items in the tree, and should return the order of the
    /// thing being searched for relative to that item. Returns the last node
    /// visited together with the result of comparing against it, or `None` if the
    /// tree is empty.
    pub fn find(&self, mut cmp: impl FnMut(T) -> Ordering) -> Option<(NodeIdx, Ordering)> {
        let mut cur = self.root?;
        loop {
            let ord = cmp(self.nodes[cur].item);
            let child = match ord {
                Ordering::Less => self.nodes[cur].left,
                Ordering::Greater => self.nodes[cur].right,
                Ordering::Equal => None,
            };
            match child {
                Some(c) => cur = c,
                None => return Some((cur, ord)),
            }
        }
    }

    /// The last node for which `is_below` returns true.
    ///
    /// `is_below` must be monotone along the tree: true on some prefix of it and
    /// false afterwards.
    pub fn last_where(&self, mut is_below: impl FnMut(T) -> bool) -> Option<NodeIdx> {
        let mut cur = self.root;
        let mut ret = None;
        while let Some(c) = cur {
            if is_below(self.nodes[c].item) {
                ret = Some(c);
                cur = self.nodes[c].right;
            } else {
                cur = self.nodes[c].left;
            }
        }
        ret
    }

    /// Inserts an item in order.
    ///
    /// `cmp` has the same meaning as in [`SweepStatus::find`]. Items that compare
    /// equal to existing ones are inserted after them.
    pub fn insert(&mut self, item: T, mut cmp: impl FnMut(T) -> Ordering) -> NodeIdx {
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(c) = cur {
            parent = Some(c);
            go_left = cmp(self.nodes[c].item) == Ordering::Less;
            cur = if go_left {
                self.nodes[c].left
            } else {
                self.nodes[c].right
            };
        }

        let node = self.alloc(item, parent);
        match parent {
            None => self.root = Some(node),
            Some(p) if go_left => self.nodes[p].left = Some(node),
            Some(p) => self.nodes[p].right = Some(node),
        }
        self.len += 1;
        self.rebalance_from(parent);
        node
    }

    /// Inserts an item immediately after `node`, or at the very beginning if `node` is `None`.
    pub fn insert_after(&mut self, node: Option<NodeIdx>, item: T) -> NodeIdx {
        let (parent, as_left) = match node {
            None => match self.first() {
                None => (None, false),
                Some(f) => (Some(f), true),
            },
            Some(n) => match self.nodes[n].right {
                None => (Some(n), false),
                Some(r) => (Some(self.leftmost(r)), true),
            },
        };

        let new = self.alloc(item, parent);
        match parent {
            None => self.root = Some(new),
            Some(p) if as_left => self.nodes[p].left = Some(new),
            Some(p) => self.nodes[p].right = Some(new),
        }
        self.len += 1;
        self.rebalance_from(parent);
        new
    }

    /// Removes a node from the tree, returning its item.
    ///
    /// The node goes back to the pool, so `node` must not be used afterwards.
    pub fn remove(&mut self, node: NodeIdx) -> T {
        let Node {
            item,
            parent,
            left,
            right,
            height,
        } = self.nodes[node].clone();

        let rebalance_start = match (left, right) {
            (Some(l), Some(r)) => {
                // Move the successor into our place.
                let succ = self.leftmost(r);
                let start = if succ == r {
                    succ
                } else {
                    // unwrap: succ is strictly below r, so it has a parent
                    let succ_parent = self.nodes[succ].parent.unwrap();
                    let succ_right = self.nodes[succ].right;
                    self.nodes[succ_parent].left = succ_right;
                    if let Some(sr) = succ_right {
                        self.nodes[sr].parent = Some(succ_parent);
                    }
                    self.nodes[succ].right = Some(r);
                    self.nodes[r].parent = Some(succ);
                    succ_parent
                };
                self.nodes[succ].left = Some(l);
                self.nodes[l].parent = Some(succ);
                self.nodes[succ].parent = parent;
                self.nodes[succ].height = height;
                self.replace_child(parent, node, Some(succ));
                Some(start)
            }
            (child, None) | (None, child) => {
                if let Some(c) = child {
                    self.nodes[c].parent = parent;
                }
                self.replace_child(parent, node, child);
                parent
            }
        };

        let freed = &mut self.nodes[node];
        freed.parent = None;
        freed.left = None;
        freed.right = None;
        self.free.push(node);
        self.len -= 1;
        self.rebalance_from(rebalance_start);
        item
    }

    /// Iterates over the items in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::successors(self.first(), |&n| self.next(n)).map(|n| self.nodes[n].item)
    }

    /// Iterates over the nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        std::iter::successors(self.first(), |&n| self.next(n))
    }

    /// Checks the parent links, the cached heights, and the balance of every node.
    ///
    /// # Panics
    ///
    /// Panics if anything is wrong.
    pub fn check_invariants(&self) {
        fn check<T>(tree: &SweepStatus<T>, node: NodeIdx, count: &mut usize) -> i32 {
            *count += 1;
            let n = &tree.nodes[node];
            let mut heights = [0, 0];
            for (i, child) in [n.left, n.right].into_iter().enumerate() {
                if let Some(c) = child {
                    assert_eq!(tree.nodes[c].parent, Some(node), "bad parent link at {c:?}");
                    heights[i] = check(tree, c, count);
                }
            }
            assert!((heights[0] - heights[1]).abs() <= 1, "unbalanced at {node:?}");
            let height = 1 + heights[0].max(heights[1]);
            assert_eq!(height, n.height, "stale height at {node:?}");
            height
        }

        let mut count = 0;
        if let Some(root) = self.root {
            assert_eq!(self.nodes[root].parent, None);
            check(self, root, &mut count);
        }
        assert_eq!(count, self.len);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn insert_sorted(tree: &mut SweepStatus<i32>, x: i32) -> NodeIdx {
        tree.insert(x, |y| x.cmp(&y))
    }

    #[test]
    fn insert_find_remove() {
        let mut tree = SweepStatus::new();
        let nodes: Vec<_> = [5, 3, 8, 1, 4, 7, 9, 2, 6]
            .into_iter()
            .map(|x| (x, insert_sorted(&mut tree, x)))
            .collect();
        tree.check_invariants();
        assert_eq!(tree.iter().collect::<Vec<_>>(), (1..=9).collect::<Vec<_>>());

        let (node, ord) = tree.find(|y| 4.cmp(&y)).unwrap();
        assert_eq!(ord, Ordering::Equal);
        assert_eq!(tree.get(node), 4);

        // Node handles stay valid across removals of other nodes.
        let (_, five) = nodes[0];
        tree.remove(five);
        tree.check_invariants();
        for &(x, n) in &nodes[1..] {
            assert_eq!(tree.get(n), x);
        }
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 6, 7, 8, 9]);
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn neighbors() {
        let mut tree = SweepStatus::new();
        let a = insert_sorted(&mut tree, 10);
        let b = insert_sorted(&mut tree, 20);
        let c = insert_sorted(&mut tree, 30);
        assert_eq!(tree.first(), Some(a));
        assert_eq!(tree.last(), Some(c));
        assert_eq!(tree.next(a), Some(b));
        assert_eq!(tree.prev(c), Some(b));
        assert_eq!(tree.prev(a), None);
        assert_eq!(tree.next(c), None);

        assert_eq!(tree.last_where(|x| x <= 25), Some(b));
        assert_eq!(tree.last_where(|x| x <= 5), None);
    }

    #[test]
    fn insert_after() {
        let mut tree = SweepStatus::new();
        let a = tree.insert_after(None, 2);
        let b = tree.insert_after(Some(a), 4);
        tree.insert_after(Some(a), 3);
        tree.insert_after(None, 1);
        tree.insert_after(Some(b), 5);
        tree.check_invariants();
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn pool_reuse() {
        let mut tree = SweepStatus::new();
        let a = insert_sorted(&mut tree, 1);
        tree.remove(a);
        assert!(tree.is_empty());
        let b = insert_sorted(&mut tree, 2);
        assert_eq!(a, b);
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50i32..50).prop_map(Op::Insert),
            (0usize..100).prop_map(Op::Remove),
        ]
    }

    proptest! {
    #[test]
    fn agrees_with_sorted_vec(ops in prop::collection::vec(op(), 0..200)) {
        let mut tree = SweepStatus::new();
        let mut vec: Vec<(i32, NodeIdx)> = Vec::new();
        for op in ops {
            match op {
                Op::Insert(x) => {
                    let node = insert_sorted(&mut tree, x);
                    let pos = vec.partition_point(|&(y, _)| y <= x);
                    vec.insert(pos, (x, node));
                }
                Op::Remove(idx) => {
                    if !vec.is_empty() {
                        let (x, node) = vec.remove(idx % vec.len());
                        prop_assert_eq!(tree.remove(node), x);
                    }
                }
            }
            tree.check_invariants();
            prop_assert_eq!(
                tree.nodes().collect::<Vec<_>>(),
                vec.iter().map(|&(_, n)| n).collect::<Vec<_>>()
            );
        }
    }
    }
}
