use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::geom::Point;
use crate::iter::ResultIter;
use crate::kdtree::{KdTreePointSet, NodeIdx};

impl KdTreePointSet {
    /// The stored point closest to `p`, or `None` on an empty set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kapok::{KdTreePointSet, Point};
    ///
    /// let set: KdTreePointSet = [(0.0, 0.0), (1.0, 1.0), (0.5, 0.5)]
    ///     .into_iter()
    ///     .map(|(x, y)| Point::new(x, y))
    ///     .collect();
    ///
    /// assert_eq!(set.nearest(Point::new(0.4, 0.4)), Some(Point::new(0.5, 0.5)));
    /// assert_eq!(KdTreePointSet::new().nearest(Point::new(0.0, 0.0)), None);
    /// ```
    #[inline]
    pub fn nearest(&self, p: Point) -> Option<Point> {
        self.nearest_n(p, 1).next()
    }

    /// The `min(k, len)` stored points closest to `p`, as an iterator that
    /// owns its result.
    ///
    /// The traversal keeps a candidate map ordered by distance, capped at
    /// `k` entries with the farthest evicted first. At every node it
    /// descends into the side of the splitting plane nearer to `p`, and
    /// crosses to the far side only while the candidate map is not yet
    /// full or the gap to the splitting plane is smaller than the worst
    /// retained distance; a far subtree beyond that gap cannot improve
    /// the result. The selected points are then assembled, nearest first,
    /// into the result tree behind the returned iterator. When two
    /// candidates are at exactly the same distance, one of them stands
    /// for the tie.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kapok::{KdTreePointSet, Point};
    ///
    /// let set: KdTreePointSet = [(0.0, 0.0), (1.0, 1.0), (0.5, 0.5)]
    ///     .into_iter()
    ///     .map(|(x, y)| Point::new(x, y))
    ///     .collect();
    ///
    /// let two: Vec<Point> = set.nearest_n(Point::new(0.4, 0.4), 2).collect();
    /// assert_eq!(two.len(), 2);
    /// assert_eq!(set.nearest_n(Point::new(0.4, 0.4), 0).count(), 0);
    /// ```
    pub fn nearest_n(&self, p: Point, k: usize) -> ResultIter {
        let mut candidates = BTreeMap::new();
        if k > 0 {
            if let Some(root) = self.root {
                self.collect_nearest(root, p, k, &mut candidates);
            }
        }

        let mut results = KdTreePointSet::new();
        for point in candidates.into_values() {
            results.put(point);
        }
        ResultIter::new(results)
    }

    fn collect_nearest(
        &self,
        idx: NodeIdx,
        p: Point,
        k: usize,
        candidates: &mut BTreeMap<OrderedFloat<f64>, Point>,
    ) {
        let node = &self.nodes[idx as usize];
        let (point, axis, left, right) = (node.point, node.axis, node.left, node.right);

        let dist = p.distance(point);
        if candidates.len() == k {
            if let Some((&worst, _)) = candidates.last_key_value() {
                if worst.0 > dist {
                    candidates.pop_last();
                }
            }
        }
        if candidates.len() < k {
            candidates.entry(OrderedFloat(dist)).or_insert(point);
        }

        let delta = axis.coord(point) - axis.coord(p);
        let (near, far) = if delta < 0.0 { (right, left) } else { (left, right) };

        if let Some(near) = near {
            self.collect_nearest(near, p, k, candidates);
        }
        if let Some(far) = far {
            let cross = match candidates.last_key_value() {
                Some((&worst, _)) if candidates.len() == k => delta.abs() < worst.0,
                _ => true,
            };
            if cross {
                self.collect_nearest(far, p, k, candidates);
            }
        }
    }
}
