//! Scapegoat-balanced k-d tree point set.
//!
//! Nodes live in an arena `Vec` and refer to each other by `u32` index:
//! child links are owning in the sense that a node is reachable only
//! through its parent (or the root), while the `next` link (the in-order
//! successor used by iterators) is a plain relation that never keeps a
//! node alive. Slots vacated by a rebuild go on a free list and are reused
//! by later inserts, so rebuilding is allocation-neutral.
//!
//! The balancing discipline, the query traversals, and the iterator model
//! are described on [`KdTreePointSet`] and in the `construction` and
//! `query` submodules.

mod construction;
mod query;

use std::fmt;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};
use crate::iter::{ResultIter, TreeIter};
use crate::parse;
use crate::traits::PointSet;

/// Index of a node in the arena.
pub(crate) type NodeIdx = u32;

/// The co-ordinate a node discriminates on. Alternates with depth; the
/// root splits on x.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub(crate) fn flip(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// The co-ordinate of `p` on this axis.
    #[inline]
    pub(crate) fn coord(self, p: Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// The extent of `rect` on this axis.
    #[inline]
    pub(crate) fn span(self, rect: &Rect) -> (f64, f64) {
        match self {
            Axis::X => (rect.xmin(), rect.xmax()),
            Axis::Y => (rect.ymin(), rect.ymax()),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) point: Point,
    pub(crate) axis: Axis,
    pub(crate) left: Option<NodeIdx>,
    pub(crate) right: Option<NodeIdx>,
    /// In-order successor; `None` for the in-order maximum.
    pub(crate) next: Option<NodeIdx>,
    /// Subtree size, this node included.
    pub(crate) weight: u32,
}

impl Node {
    pub(crate) fn leaf(point: Point, axis: Axis, next: Option<NodeIdx>) -> Self {
        Node {
            point,
            axis,
            left: None,
            right: None,
            next,
            weight: 1,
        }
    }
}

/// A 2D point set backed by a scapegoat-balanced k-d tree.
///
/// Points are inserted one at a time; each insert descends by the node's
/// discriminant axis and re-balances on the way back up whenever a subtree
/// becomes weight-unbalanced (a child heavier than α = 0.7 of its parent),
/// flattening and rebuilding the offending subtree by median split.
/// Membership, [`range`](KdTreePointSet::range), and
/// [`nearest_n`](KdTreePointSet::nearest_n) queries prune whole branches
/// using the discriminant, giving sublinear expected time on balanced
/// input.
///
/// Queries never touch the tree's structure: `range` and `nearest_n`
/// assemble their results into a fresh tree owned by the returned
/// iterator, so queries can run concurrently from many threads while the
/// set is not being mutated, and their results survive later inserts.
///
/// # Examples
///
/// ```rust
/// use kapok::{KdTreePointSet, Point, Rect};
///
/// let mut set = KdTreePointSet::new();
/// set.put(Point::new(0.0, 0.0));
/// set.put(Point::new(1.0, 1.0));
/// set.put(Point::new(0.5, 0.5));
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.nearest(Point::new(0.4, 0.4)), Some(Point::new(0.5, 0.5)));
///
/// let hits: Vec<Point> = set
///     .range(Rect::new(Point::new(0.3, 0.3), Point::new(0.7, 0.7)))
///     .collect();
/// assert_eq!(hits, vec![Point::new(0.5, 0.5)]);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct KdTreePointSet {
    pub(crate) nodes: Vec<Node>,
    free: Vec<NodeIdx>,
    pub(crate) root: Option<NodeIdx>,
    /// Cached in-order minimum, where iteration starts.
    pub(crate) first: Option<NodeIdx>,
    len: usize,
}

impl KdTreePointSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` points before the
    /// arena reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        KdTreePointSet {
            nodes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Reads whitespace-delimited `x y` pairs from the file at `path`,
    /// inserting them in file order. An unreadable file yields an empty
    /// set; ingest stops silently at the first malformed token.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => parse::points(&text).collect(),
            Err(_) => Self::new(),
        }
    }

    /// Number of stored points.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether `p` is present, comparing with the epsilon tolerance of
    /// [`Point`] equality.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kapok::{KdTreePointSet, Point};
    ///
    /// let mut set = KdTreePointSet::new();
    /// set.put(Point::new(0.5, 0.5));
    /// assert!(set.contains(Point::new(0.5, 0.5)));
    /// assert!(!set.contains(Point::new(0.5, 0.0)));
    /// ```
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        let mut cur = self.root;
        while let Some(idx) = cur {
            let node = &self.nodes[idx as usize];
            if node.point == p {
                return true;
            }
            cur = if node.axis.coord(p) < node.axis.coord(node.point) {
                node.left
            } else {
                node.right
            };
        }
        false
    }

    /// Iterates over every stored point by following successor links from
    /// the in-order minimum. O(1) per step.
    #[inline]
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(&self.nodes, self.first)
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeIdx {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as NodeIdx
            }
        }
    }

    pub(crate) fn release(&mut self, idx: NodeIdx) {
        self.free.push(idx);
    }

    pub(crate) fn bump_len(&mut self) {
        self.len += 1;
    }
}

impl fmt::Display for KdTreePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for p in self.iter() {
            writeln!(f, "{p}")?;
        }
        write!(f, " }}")
    }
}

impl FromIterator<Point> for KdTreePointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Point> for KdTreePointSet {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        for p in iter {
            self.put(p);
        }
    }
}

impl<'a> IntoIterator for &'a KdTreePointSet {
    type Item = Point;
    type IntoIter = TreeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PointSet for KdTreePointSet {
    type Iter<'a>
        = TreeIter<'a>
    where
        Self: 'a;
    type Range<'a>
        = ResultIter
    where
        Self: 'a;
    type Nearest<'a>
        = ResultIter
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn put(&mut self, p: Point) {
        self.put(p);
    }

    fn contains(&self, p: Point) -> bool {
        self.contains(p)
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn range(&self, rect: Rect) -> Self::Range<'_> {
        self.range(rect)
    }

    fn nearest(&self, p: Point) -> Option<Point> {
        self.nearest(p)
    }

    fn nearest_n(&self, p: Point, k: usize) -> Self::Nearest<'_> {
        self.nearest_n(p, k)
    }
}

#[cfg(test)]
mod tests {
    use super::KdTreePointSet;
    use crate::geom::Point;

    #[test]
    fn contains_uses_epsilon_equality() {
        let mut set = KdTreePointSet::new();
        set.put(Point::new(0.25, 0.75));
        assert!(set.contains(Point::new(0.25, 0.75)));
        assert!(set.contains(Point::new(0.25 + f64::EPSILON / 4.0, 0.75)));
        assert!(!set.contains(Point::new(0.25, 0.75 + 1e-9)));
    }

    #[test]
    fn missing_file_yields_empty_set() {
        let set = KdTreePointSet::from_path("definitely/not/here.dat");
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn collects_from_iterator() {
        let set: KdTreePointSet = (0..8).map(|i| Point::new(i as f64, -(i as f64))).collect();
        assert_eq!(set.len(), 8);
        assert!(set.contains(Point::new(3.0, -3.0)));
    }

    #[test]
    fn display_lists_points_in_traversal_order() {
        let mut set = KdTreePointSet::new();
        set.put(Point::new(2.0, 0.0));
        set.put(Point::new(1.0, 0.0));
        set.put(Point::new(3.0, 0.0));
        assert_eq!(set.to_string(), "{ (1, 0)\n(2, 0)\n(3, 0)\n }");
    }
}
