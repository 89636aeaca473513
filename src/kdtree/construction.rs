//! Insert path: weight-tracked descent, successor maintenance, and
//! scapegoat rebuilds.

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use super::{Axis, KdTreePointSet, Node, NodeIdx};
use crate::geom::Point;

/// Scapegoat balance factor: a child subtree heavier than `ALPHA` times its
/// parent triggers a rebuild of the parent's subtree. Tuning constant, not
/// a correctness parameter.
const ALPHA: f64 = 0.7;

impl KdTreePointSet {
    /// Inserts `p`, re-balancing on the way back up if the insert left any
    /// subtree on the path weight-unbalanced. A point already present
    /// (within epsilon on both axes) is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kapok::{KdTreePointSet, Point};
    ///
    /// let mut set = KdTreePointSet::new();
    /// set.put(Point::new(0.1, 0.2));
    /// set.put(Point::new(0.1, 0.2));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn put(&mut self, p: Point) {
        if self.contains(p) {
            return;
        }
        match self.root {
            Some(root) => {
                let root = self.insert_at(root, p, None, true);
                self.root = Some(root);
                self.first = Some(self.leftmost(root));
            }
            None => {
                let idx = self.alloc(Node::leaf(p, Axis::X, None));
                self.root = Some(idx);
                self.first = Some(idx);
            }
        }
        self.bump_len();
    }

    /// Descends from `idx` and attaches `p` as a new leaf, incrementing
    /// weights on the way down. `next` is the in-order successor of the
    /// subtree rooted at `idx`, threaded down so a new rightmost leaf can
    /// link past the subtree. Returns the subtree's root index, which
    /// changes when a scapegoat rebuild replaces it.
    fn insert_at(&mut self, idx: NodeIdx, p: Point, next: Option<NodeIdx>, balance: bool) -> NodeIdx {
        self.nodes[idx as usize].weight += 1;
        let node = &self.nodes[idx as usize];
        let axis = node.axis;
        let (left, right) = (node.left, node.right);
        let go_left = axis.coord(p) < axis.coord(node.point);

        if go_left {
            let child = match left {
                Some(child) => self.insert_at(child, p, Some(idx), balance),
                None => self.alloc(Node::leaf(p, axis.flip(), Some(idx))),
            };
            self.nodes[idx as usize].left = Some(child);
            if balance && self.weight(child) as f64 > ALPHA * self.weight(idx) as f64 {
                return self.rebuild(idx);
            }
        } else {
            let child = match right {
                Some(child) => self.insert_at(child, p, next, balance),
                None => self.alloc(Node::leaf(p, axis.flip(), next)),
            };
            self.nodes[idx as usize].right = Some(child);
            // the in-order successor moved: it is now the leftmost node of
            // the (possibly rebuilt) right subtree
            let successor = self.leftmost(child);
            self.nodes[idx as usize].next = Some(successor);
            if balance && self.weight(child) as f64 > ALPHA * self.weight(idx) as f64 {
                return self.rebuild(idx);
            }
        }
        idx
    }

    /// Flattens the subtree at `idx` via its successor chain and rebuilds
    /// it balanced by recursive median split, recycling the old slots.
    /// Returns the new subtree root.
    fn rebuild(&mut self, idx: NodeIdx) -> NodeIdx {
        let axis = self.nodes[idx as usize].axis;
        let first = self.leftmost(idx);
        let last = self.rightmost(idx);
        let after = self.nodes[last as usize].next;

        let mut slots = Vec::with_capacity(self.weight(idx) as usize);
        let mut cur = first;
        loop {
            slots.push(cur);
            if cur == last {
                break;
            }
            cur = self.nodes[cur as usize]
                .next
                .expect("successor chain ends inside subtree");
        }

        #[cfg(feature = "tracing")]
        event!(Level::TRACE, size = slots.len(), "rebuilding unbalanced subtree");

        let points: Vec<Point> = slots.iter().map(|&i| self.nodes[i as usize].point).collect();
        for &slot in &slots {
            self.release(slot);
        }

        let mut root = None;
        self.build_span(&mut root, &points, axis, after, 0, points.len());
        root.expect("rebuilt subtree is never empty")
    }

    /// Reinserts `points[lo..hi]` under `root`, middle element first, with
    /// scapegoat checks disabled. Every reinsertion threads `after`, the
    /// rebuilt subtree's external successor, so the new rightmost node
    /// links past the subtree.
    fn build_span(
        &mut self,
        root: &mut Option<NodeIdx>,
        points: &[Point],
        axis: Axis,
        after: Option<NodeIdx>,
        lo: usize,
        hi: usize,
    ) {
        if lo >= hi {
            return;
        }
        let mid = (lo + hi) / 2;
        *root = Some(match *root {
            Some(idx) => self.insert_at(idx, points[mid], after, false),
            None => self.alloc(Node::leaf(points[mid], axis, after)),
        });
        self.build_span(root, points, axis, after, lo, mid);
        self.build_span(root, points, axis, after, mid + 1, hi);
    }

    pub(crate) fn leftmost(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(left) = self.nodes[idx as usize].left {
            idx = left;
        }
        idx
    }

    fn rightmost(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(right) = self.nodes[idx as usize].right {
            idx = right;
        }
        idx
    }

    fn weight(&self, idx: NodeIdx) -> u32 {
        self.nodes[idx as usize].weight
    }
}

#[cfg(test)]
mod tests {
    use super::ALPHA;
    use crate::geom::Point;
    use crate::kdtree::{Axis, KdTreePointSet, NodeIdx};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Walks the structure and checks every invariant the tree promises:
    /// weights, discriminant alternation, partitioning, balance, and the
    /// successor chain.
    fn check_invariants(set: &KdTreePointSet) {
        let mut visited = 0usize;
        if let Some(root) = set.root {
            assert_eq!(set.nodes[root as usize].axis, Axis::X);
            visited = check_subtree(set, root);
        }
        assert_eq!(visited, set.len());

        // the successor chain enumerates every point exactly once
        let walked: Vec<Point> = set.iter().collect();
        assert_eq!(walked.len(), set.len());
        for p in &walked {
            assert!(set.contains(*p));
        }
    }

    fn check_subtree(set: &KdTreePointSet, idx: NodeIdx) -> usize {
        let node = &set.nodes[idx as usize];
        let value = node.axis.coord(node.point);

        let mut count = 1;
        if let Some(left) = node.left {
            let child = &set.nodes[left as usize];
            assert_eq!(child.axis, node.axis.flip());
            assert_subtree_coords(set, left, node.axis, |v| v < value);
            count += check_subtree(set, left);
        }
        if let Some(right) = node.right {
            let child = &set.nodes[right as usize];
            assert_eq!(child.axis, node.axis.flip());
            assert_subtree_coords(set, right, node.axis, |v| v >= value);
            count += check_subtree(set, right);
        }

        assert_eq!(node.weight as usize, count);
        count
    }

    /// The weight bound after a median rebuild. Provable for input whose
    /// in-order chain is sorted on every axis (such as diagonal points);
    /// arbitrary data may transiently exceed it between rebuilds.
    fn check_scapegoat_bound(set: &KdTreePointSet, idx: NodeIdx) {
        let node = &set.nodes[idx as usize];
        for child in [node.left, node.right].into_iter().flatten() {
            let child_weight = set.nodes[child as usize].weight;
            assert!(
                f64::from(child_weight) <= ALPHA * f64::from(node.weight),
                "scapegoat bound violated: child {child_weight} of parent {}",
                node.weight
            );
            check_scapegoat_bound(set, child);
        }
    }

    fn assert_subtree_coords<F: Fn(f64) -> bool + Copy>(
        set: &KdTreePointSet,
        idx: NodeIdx,
        axis: Axis,
        ok: F,
    ) {
        let node = &set.nodes[idx as usize];
        assert!(ok(axis.coord(node.point)));
        if let Some(left) = node.left {
            assert_subtree_coords(set, left, axis, ok);
        }
        if let Some(right) = node.right {
            assert_subtree_coords(set, right, axis, ok);
        }
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        // worst case for a plain k-d tree: every insert goes right
        let mut set = KdTreePointSet::new();
        for i in 0..256 {
            set.put(Point::new(i as f64, i as f64));
            check_invariants(&set);
            check_scapegoat_bound(&set, set.root.unwrap());
        }
        assert_eq!(set.len(), 256);
    }

    #[test]
    fn random_inserts_keep_all_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut set = KdTreePointSet::new();
        for i in 0..500 {
            set.put(Point::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)));
            assert_eq!(set.len(), i + 1);
        }
        check_invariants(&set);
    }

    #[test]
    fn duplicate_put_is_a_no_op() {
        let mut set = KdTreePointSet::new();
        set.put(Point::new(0.3, 0.7));
        set.put(Point::new(0.9, 0.1));
        set.put(Point::new(0.3, 0.7));
        assert_eq!(set.len(), 2);
        check_invariants(&set);
    }

    #[test]
    fn rebuild_recycles_arena_slots() {
        let mut set = KdTreePointSet::new();
        for i in 0..128 {
            set.put(Point::new(i as f64, 0.0));
        }
        // every live node occupies exactly one slot; rebuilds must not
        // have leaked any
        assert_eq!(set.nodes.len(), 128);
    }

    #[test]
    fn iteration_order_is_stable_across_rebuilds() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut set = KdTreePointSet::new();
        for _ in 0..200 {
            set.put(Point::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)));
        }
        let once: Vec<Point> = set.iter().collect();
        let twice: Vec<Point> = set.iter().collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 200);
    }
}
