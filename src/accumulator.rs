//!
//! Incremental accumulators over a window `[left, end)` of the sequence.
//!
//! Both accumulators follow the same protocol: `reset(end)` starts an empty
//! window whose right edge is `end`, then `extend_left(left)` grows the
//! window leftwards. Positions already scanned are never scanned again until
//! the next reset, so a backward scan over `ts = t-1, t-2, ...` costs time
//! linear in the look-back length.
//!
//! * `SvmAccumulator`: sum of per-unique-word weights normalized by
//!   `sqrt(#unique words)`, per SVM output.
//! * `SegmentSumAccumulator`: plain per-state sum of position weights.
//!
pub mod segment;
pub mod svm;

pub use segment::SegmentSumAccumulator;
pub use svm::SvmAccumulator;

use crate::common::Pos;

///
/// Window accumulator with reset/extend protocol
///
pub trait WindowAccumulator {
    ///
    /// Clear the accumulated values and set the right edge of the window.
    ///
    fn reset(&mut self, end_pos: Pos);
    ///
    /// Move the left edge of the window to `new_left`, scanning only the
    /// positions not yet scanned since the last reset.
    ///
    /// Calling with a `new_left` right of the current left edge is a no-op.
    ///
    fn extend_left(&mut self, new_left: Pos);
    ///
    /// Leftmost raw position that has not been scanned yet (exclusive bound
    /// of the next scan).
    ///
    fn frontier(&self) -> Pos;
}

///
/// Clamp `[from, to)` into a valid index range of a buffer of length `len`.
///
pub(crate) fn clamp_range(from: Pos, to: Pos, len: usize) -> std::ops::Range<usize> {
    let len = len as Pos;
    let from = from.max(0).min(len);
    let to = to.max(from).min(len);
    (from as usize)..(to as usize)
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp() {
        assert_eq!(clamp_range(-3, 2, 10), 0..2);
        assert_eq!(clamp_range(4, 20, 10), 4..10);
        assert_eq!(clamp_range(5, 3, 10), 5..5);
        assert_eq!(clamp_range(-5, -1, 10), 0..0);
    }
}
