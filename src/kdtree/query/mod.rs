//! Branch-pruned query traversals. Each query assembles its matches into
//! a fresh result tree and hands it to a [`ResultIter`](crate::iter::ResultIter).

mod nearest_n;
mod range;
