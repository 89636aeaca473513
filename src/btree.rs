//! Ordered-set baseline implementation.
//!
//! Backed by a `BTreeSet` keyed on the exact lexicographic point order,
//! with linear-scan geometry. Simple enough to be obviously correct, it
//! defines the expected result sets for the k-d tree implementation; the
//! randomized agreement tests lean on that.

use std::cmp::Ordering;
use std::collections::{btree_set, BTreeSet};
use std::fmt;
use std::path::Path;

use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};
use crate::parse;
use crate::traits::PointSet;

/// Storage key: a point under the exact total order. The epsilon-tolerant
/// `Point` equality stays out of the container; membership goes through
/// the same ordering as placement.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug)]
struct PointKey(Point);

impl PartialEq for PointKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PointKey {}

impl PartialOrd for PointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A 2D point set backed by an ordered set, with brute-force queries.
///
/// `range` and `nearest_n` walk the container in ascending point order and
/// filter; `nearest` is a linear arg-min scan. All results match the k-d
/// tree implementation's, making this the reference the fast path is
/// tested against, and a perfectly serviceable set for small inputs.
///
/// # Examples
///
/// ```rust
/// use kapok::{BTreePointSet, Point, Rect};
///
/// let mut set = BTreePointSet::new();
/// set.put(Point::new(0.0, 0.0));
/// set.put(Point::new(1.0, 1.0));
/// set.put(Point::new(0.5, 0.5));
///
/// assert_eq!(set.nearest(Point::new(0.4, 0.4)), Some(Point::new(0.5, 0.5)));
/// let hits: Vec<Point> = set
///     .range(Rect::new(Point::new(0.3, 0.3), Point::new(0.7, 0.7)))
///     .collect();
/// assert_eq!(hits, vec![Point::new(0.5, 0.5)]);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BTreePointSet {
    points: BTreeSet<PointKey>,
}

impl BTreePointSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
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
        self.points.len()
    }

    /// Whether the set holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts `p` if absent.
    #[inline]
    pub fn put(&mut self, p: Point) {
        self.points.insert(PointKey(p));
    }

    /// Whether `p` is present.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.points.contains(&PointKey(p))
    }

    /// Iterates over every stored point in ascending point order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.points.iter())
    }

    /// All stored points inside `rect`, borders included, in ascending
    /// point order.
    pub fn range(&self, rect: Rect) -> RangeIter<'_> {
        RangeIter {
            inner: self.points.iter(),
            rect,
        }
    }

    /// The stored point closest to `p`, or `None` on an empty set. Exact
    /// distance ties go to the earliest point in ascending point order.
    pub fn nearest(&self, p: Point) -> Option<Point> {
        let mut best: Option<(f64, Point)> = None;
        for q in self.iter() {
            let d = p.distance(q);
            match best {
                Some((b, _)) if b <= d => {}
                _ => best = Some((d, q)),
            }
        }
        best.map(|(_, q)| q)
    }

    /// The `min(k, len)` stored points closest to `p`.
    ///
    /// Scans once to find the k-th smallest distance, then returns a
    /// filtering iterator over every point within that radius, capped at
    /// k yields so exact distance ties at the radius cannot widen the
    /// result.
    pub fn nearest_n(&self, p: Point, k: usize) -> NearestIter<'_> {
        let k = k.min(self.len());
        if k == 0 {
            return NearestIter {
                inner: self.points.iter(),
                center: p,
                radius: f64::MIN,
                remaining: 0,
            };
        }

        // k smallest distances, duplicates collapsed by the set
        let mut distances: BTreeSet<OrderedFloat<f64>> = BTreeSet::new();
        for q in self.iter() {
            let d = OrderedFloat(p.distance(q));
            if distances.len() == k {
                match distances.last() {
                    Some(&worst) if worst < d => continue,
                    _ => {
                        distances.pop_last();
                    }
                }
            }
            distances.insert(d);
        }
        let radius = distances.last().map_or(0.0, |d| d.0);

        NearestIter {
            inner: self.points.iter(),
            center: p,
            radius,
            remaining: k,
        }
    }
}

impl fmt::Display for BTreePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for p in self.iter() {
            writeln!(f, "{p}")?;
        }
        write!(f, " }}")
    }
}

impl FromIterator<Point> for BTreePointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Point> for BTreePointSet {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        for p in iter {
            self.put(p);
        }
    }
}

impl<'a> IntoIterator for &'a BTreePointSet {
    type Item = Point;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over every point of a [`BTreePointSet`].
#[derive(Clone, Debug)]
pub struct Iter<'a>(btree_set::Iter<'a, PointKey>);

impl Iterator for Iter<'_> {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        self.0.next().map(|key| key.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Filtering iterator behind [`BTreePointSet::range`]: advances through
/// the ordered container until the next contained point.
#[derive(Clone, Debug)]
pub struct RangeIter<'a> {
    inner: btree_set::Iter<'a, PointKey>,
    rect: Rect,
}

impl Iterator for RangeIter<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            let q = self.inner.next()?.0;
            if self.rect.contains(q) {
                return Some(q);
            }
        }
    }
}

/// Filtering iterator behind [`BTreePointSet::nearest_n`]: yields points
/// within the precomputed radius of the query, at most k of them.
#[derive(Clone, Debug)]
pub struct NearestIter<'a> {
    inner: btree_set::Iter<'a, PointKey>,
    center: Point,
    radius: f64,
    remaining: usize,
}

impl Iterator for NearestIter<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let q = self.inner.next()?.0;
            if self.center.distance(q) <= self.radius {
                self.remaining -= 1;
                return Some(q);
            }
        }
    }
}

impl PointSet for BTreePointSet {
    type Iter<'a>
        = Iter<'a>
    where
        Self: 'a;
    type Range<'a>
        = RangeIter<'a>
    where
        Self: 'a;
    type Nearest<'a>
        = NearestIter<'a>
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
    use super::BTreePointSet;
    use crate::geom::{Point, Rect};

    #[test]
    fn iterates_in_ascending_point_order() {
        let mut set = BTreePointSet::new();
        set.put(Point::new(0.9, 0.1));
        set.put(Point::new(0.1, 0.9));
        set.put(Point::new(0.1, 0.2));
        let order: Vec<Point> = set.iter().collect();
        assert_eq!(
            order,
            vec![
                Point::new(0.1, 0.2),
                Point::new(0.1, 0.9),
                Point::new(0.9, 0.1),
            ]
        );
    }

    #[test]
    fn duplicate_put_is_a_no_op() {
        let mut set = BTreePointSet::new();
        set.put(Point::new(0.4, 0.4));
        set.put(Point::new(0.4, 0.4));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn nearest_breaks_ties_toward_the_smaller_point() {
        let mut set = BTreePointSet::new();
        set.put(Point::new(0.0, 0.0));
        set.put(Point::new(2.0, 0.0));
        // both candidates are exactly 1.0 away
        assert_eq!(set.nearest(Point::new(1.0, 0.0)), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn nearest_n_returns_the_k_closest() {
        let set: BTreePointSet = (0..9).map(|i| Point::new(i as f64, 0.0)).collect();
        let three: Vec<Point> = set.nearest_n(Point::new(3.9, 0.0), 3).collect();
        assert_eq!(
            three,
            vec![
                Point::new(3.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(5.0, 0.0),
            ]
        );
    }

    #[test]
    fn zero_k_and_empty_set_yield_empty_results() {
        let set = BTreePointSet::new();
        assert_eq!(set.nearest(Point::new(0.0, 0.0)), None);
        assert_eq!(set.nearest_n(Point::new(0.0, 0.0), 5).count(), 0);

        let set: BTreePointSet = (0..4).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(set.nearest_n(Point::new(0.0, 0.0), 0).count(), 0);
    }

    #[test]
    fn range_filters_lazily_over_the_container() {
        let set: BTreePointSet = (0..10).map(|i| Point::new(i as f64, i as f64)).collect();
        let rect = Rect::new(Point::new(2.5, 0.0), Point::new(6.5, 10.0));
        let inside: Vec<Point> = set.range(rect).collect();
        assert_eq!(
            inside,
            vec![
                Point::new(3.0, 3.0),
                Point::new(4.0, 4.0),
                Point::new(5.0, 5.0),
                Point::new(6.0, 6.0),
            ]
        );
    }
}
