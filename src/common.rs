//!
//! Common types and constants shared across the decoder.
//!
pub use petgraph::graph::{EdgeIndex, NodeIndex};

/// Score of a (partial) path. Larger is better.
pub type Score = f64;

/// Type of symbol sequence (lowercase DNA, `b"acgt"`)
pub type Sequence = Vec<u8>;

/// Position of a segment boundary on the symbol sequence
pub type Pos = i64;

///
/// Sentinel for "negative infinity".
///
/// A large finite negative number instead of `f64::NEG_INFINITY`, so that
/// adding two sentinels never produces NaN.
///
pub const NEG_INF: Score = -1e300;

///
/// Scores at or below this floor are treated as unobservable.
///
pub const UNOBSERVABLE: Score = -1e20;

/// check if the score is the "negative infinity" or unobservable one
#[inline]
pub fn is_impossible(score: Score) -> bool {
    score <= UNOBSERVABLE
}

/// Convert Sequence(Vec<u8>) into &str
/// useful in displaying
pub fn sequence_to_string(seq: &[u8]) -> &str {
    std::str::from_utf8(seq).unwrap_or("<non-utf8>")
}

/// short-hand of `NodeIndex::new`
pub fn ni(index: usize) -> NodeIndex {
    NodeIndex::new(index)
}

/// short-hand of `EdgeIndex::new`
pub fn ei(index: usize) -> EdgeIndex {
    EdgeIndex::new(index)
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_addable() {
        let s = NEG_INF + NEG_INF;
        assert!(s.is_finite());
        assert!(is_impossible(s));
        assert!(is_impossible(UNOBSERVABLE));
        assert!(!is_impossible(-1e19));
    }
}
