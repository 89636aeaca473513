use crate::geom::Rect;
use crate::iter::ResultIter;
use crate::kdtree::{KdTreePointSet, NodeIdx};

impl KdTreePointSet {
    /// All stored points inside `rect`, borders included.
    ///
    /// The traversal compares the rectangle's extent on each node's
    /// discriminant axis with the node's co-ordinate and descends only
    /// into subtrees that can still intersect the rectangle. Matches are
    /// gathered into a result tree owned by the returned iterator, so the
    /// result is unaffected by later inserts into this set. A degenerate
    /// rectangle yields an empty result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kapok::{KdTreePointSet, Point, Rect};
    ///
    /// let set: KdTreePointSet = [(0.1, 0.4), (0.5, 0.5), (0.9, 0.2)]
    ///     .into_iter()
    ///     .map(|(x, y)| Point::new(x, y))
    ///     .collect();
    ///
    /// let inside: Vec<Point> = set
    ///     .range(Rect::new(Point::new(0.25, 0.25), Point::new(0.75, 0.75)))
    ///     .collect();
    /// assert_eq!(inside, vec![Point::new(0.5, 0.5)]);
    /// ```
    pub fn range(&self, rect: Rect) -> ResultIter {
        let mut results = KdTreePointSet::new();
        if let Some(root) = self.root {
            self.collect_in_rect(root, &rect, &mut results);
        }
        ResultIter::new(results)
    }

    fn collect_in_rect(&self, idx: NodeIdx, rect: &Rect, results: &mut KdTreePointSet) {
        let node = &self.nodes[idx as usize];
        let (point, axis, left, right) = (node.point, node.axis, node.left, node.right);

        if rect.contains(point) {
            results.put(point);
        }

        let value = axis.coord(point);
        let (lo, hi) = axis.span(rect);
        if value < lo {
            // everything left of this node is below the rectangle on this axis
            if let Some(right) = right {
                self.collect_in_rect(right, rect, results);
            }
        } else if value > hi {
            if let Some(left) = left {
                self.collect_in_rect(left, rect, results);
            }
        } else {
            if let Some(left) = left {
                self.collect_in_rect(left, rect, results);
            }
            if let Some(right) = right {
                self.collect_in_rect(right, rect, results);
            }
        }
    }
}
