//! # kapok
//!
//! 2D point sets with three spatial queries (membership, axis-aligned
//! rectangular range, and k-nearest-neighbours) behind one [`PointSet`]
//! contract, with two interchangeable implementations:
//!
//! * [`KdTreePointSet`]: a k-d tree kept balanced by weight-based
//!   scapegoat rebuilding on insert, giving sublinear expected-time
//!   queries.
//! * [`BTreePointSet`]: an ordered-set baseline with linear-scan
//!   geometry, defining the reference semantics the k-d tree is tested
//!   against.
//!
//! Queries return iterators. For the k-d tree they own a private snapshot
//! of the result (a second tree built from the matches), so results stay
//! valid across later inserts and any number of queries may run
//! concurrently on a set that is not being mutated. Cloning a query
//! iterator replays the same sequence, which is the multipass story.
//!
//! ```rust
//! use kapok::{KdTreePointSet, Point, Rect};
//!
//! let mut set = KdTreePointSet::new();
//! set.put(Point::new(0.0, 0.0));
//! set.put(Point::new(1.0, 1.0));
//! set.put(Point::new(0.5, 0.5));
//!
//! assert_eq!(set.nearest(Point::new(0.4, 0.4)), Some(Point::new(0.5, 0.5)));
//!
//! let inside: Vec<Point> = set
//!     .range(Rect::new(Point::new(0.3, 0.3), Point::new(0.7, 0.7)))
//!     .collect();
//! assert_eq!(inside, vec![Point::new(0.5, 0.5)]);
//! ```
//!
//! ## Feature flags
//!
//! * `serde`: `Serialize`/`Deserialize` for points, rectangles, and both
//!   set types.
//! * `tracing`: trace-level events on scapegoat rebuilds.

pub mod btree;
pub mod geom;
pub mod iter;
pub mod kdtree;
mod parse;
mod traits;

pub use crate::btree::BTreePointSet;
pub use crate::geom::{Point, Rect};
pub use crate::kdtree::KdTreePointSet;
pub use crate::traits::PointSet;
