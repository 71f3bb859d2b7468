//!
//! Segment-sum accumulator
//!
//! Per-state sum of position weights `weights[[pos, state]]` over the window.
//!
use super::{clamp_range, WindowAccumulator};
use crate::common::Pos;
use ndarray::ArrayView2;

#[derive(Debug, Clone)]
pub struct SegmentSumAccumulator<'a> {
    /// `[n_positions, n_states]`
    weights: ArrayView2<'a, f64>,
    values: Vec<f64>,
    frontier: Pos,
}

impl<'a> SegmentSumAccumulator<'a> {
    pub fn new(weights: ArrayView2<'a, f64>) -> Self {
        let n_states = weights.ncols();
        SegmentSumAccumulator {
            weights,
            values: vec![0.0; n_states],
            frontier: 0,
        }
    }
    /// the number of states
    pub fn n_states(&self) -> usize {
        self.values.len()
    }
    /// accumulated sum of the state
    pub fn value(&self, state: usize) -> f64 {
        self.values[state]
    }
    /// accumulated sums of all states
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl<'a> WindowAccumulator for SegmentSumAccumulator<'a> {
    fn reset(&mut self, end_pos: Pos) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.frontier = end_pos;
    }
    fn extend_left(&mut self, new_left: Pos) {
        for p in clamp_range(new_left, self.frontier, self.weights.nrows()).rev() {
            for (v, w) in self.values.iter_mut().zip(self.weights.row(p).iter()) {
                *v += *w;
            }
        }
        self.frontier = self.frontier.min(new_left);
    }
    fn frontier(&self) -> Pos {
        self.frontier
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn weights() -> Array2<f64> {
        // 6 positions x 2 states
        Array2::from_shape_fn((6, 2), |(p, s)| (p as f64 + 1.0) * if s == 0 { 1.0 } else { -0.5 })
    }

    #[test]
    fn sums_each_position_once() {
        let w = weights();
        let mut acc = SegmentSumAccumulator::new(w.view());
        acc.reset(5);
        acc.extend_left(3);
        // positions 3,4 -> 4+5
        assert_abs_diff_eq!(acc.value(0), 9.0);
        assert_abs_diff_eq!(acc.value(1), -4.5);
        // moving right is a no-op
        acc.extend_left(4);
        assert_abs_diff_eq!(acc.value(0), 9.0);
        acc.extend_left(-2);
        assert_abs_diff_eq!(acc.value(0), 15.0);
        assert_eq!(acc.frontier(), -2);
    }

    #[test]
    fn reset_is_idempotent() {
        let w = weights();
        let mut acc = SegmentSumAccumulator::new(w.view());
        acc.reset(6);
        acc.extend_left(0);
        acc.reset(4);
        let once = acc.clone();
        acc.reset(4);
        assert_eq!(acc.values(), once.values());
        assert_eq!(acc.frontier(), once.frontier());
        assert_eq!(acc.values(), &[0.0, 0.0]);
    }

    #[test]
    fn window_past_the_end_is_clamped() {
        let w = weights();
        let mut acc = SegmentSumAccumulator::new(w.view());
        acc.reset(100);
        acc.extend_left(5);
        assert_abs_diff_eq!(acc.value(0), 6.0);
    }
}
