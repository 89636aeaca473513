#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use kapok::Point;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// Bitwise key for exact set comparisons, immune to the epsilon-tolerant
/// `Point` equality.
pub fn bits(p: Point) -> (u64, u64) {
    (p.x.to_bits(), p.y.to_bits())
}

pub fn to_set<I: IntoIterator<Item = Point>>(points: I) -> BTreeSet<(u64, u64)> {
    points.into_iter().map(bits).collect()
}

pub fn to_vec<I: IntoIterator<Item = Point>>(points: I) -> Vec<(u64, u64)> {
    points.into_iter().map(bits).collect()
}
