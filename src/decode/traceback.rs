//!
//! Termination and traceback
//!
use super::{Decoder, Decomposition};
use crate::common::{is_impossible, Pos, Score};
use crate::plif::Penalty;
use crate::select::{Candidate, TopK};
use crate::trellis::Trellis;
use itertools::Itertools;

///
/// A decoded path
///
/// `state_seq[i]` is the state at time step `pos_seq[i]`. Both start at
/// time step 0 and end at the last time step.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub score: Score,
    pub state_seq: Vec<usize>,
    pub pos_seq: Vec<usize>,
    pub decomposition: Option<Decomposition>,
}

impl Path {
    /// the number of segment boundaries in the path
    pub fn len(&self) -> usize {
        self.state_seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.state_seq.is_empty()
    }
    ///
    /// iterator of edges `((from_state, from_t), (to_state, to_t))`
    ///
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), (usize, usize))> + '_ {
        self.state_seq
            .iter()
            .copied()
            .zip(self.pos_seq.iter().copied())
            .tuple_windows()
    }
    ///
    /// positions on the sequence of each boundary
    ///
    pub fn positions(&self, positions: &[Pos]) -> Vec<Pos> {
        self.pos_seq.iter().map(|&t| positions[t]).collect()
    }
    ///
    /// State and time step sequences terminated by `-1`
    ///
    pub fn to_terminated(&self) -> (Vec<i64>, Vec<i64>) {
        let terminate = |xs: &[usize]| -> Vec<i64> {
            xs.iter()
                .map(|&x| x as i64)
                .chain(std::iter::once(-1))
                .collect()
        };
        (terminate(&self.state_seq), terminate(&self.pos_seq))
    }
}

impl<'a, P: Penalty> Decoder<'a, P> {
    ///
    /// The `nbest` best final cells, ranked by `delta + final score`.
    ///
    /// The pool is visited rank-major, so ties are resolved towards the
    /// better rank, then towards the smaller state index. Impossible cells
    /// are not candidates, so fewer than `nbest` may be returned.
    ///
    pub fn terminate<S: TopK>(&self, trellis: &Trellis) -> Vec<Candidate> {
        let seq_len = trellis.seq_len();
        let mut selector = S::new(self.nbest());
        if seq_len == 0 {
            return Vec::new();
        }
        let t = seq_len - 1;
        for diff in 0..self.nbest() {
            for i in 0..self.n_states() {
                let delta = trellis.delta(t, i, diff);
                if is_impossible(delta) {
                    continue;
                }
                let score = delta + self.model.final_state_score(i);
                selector.push(-score, trellis.encode(i, diff, t));
            }
        }
        let mut ends = Vec::with_capacity(self.nbest());
        selector.drain_sorted(&mut ends);
        ends
    }
    ///
    /// Follow the back-pointers from the best final cells.
    ///
    pub fn traceback<S: TopK>(&self, trellis: &Trellis) -> Vec<Path> {
        self.terminate::<S>(trellis)
            .into_iter()
            .map(|end| {
                let (mut state, mut k, mut t) = trellis.decode(end.payload);
                let mut state_seq = vec![state];
                let mut pos_seq = vec![t];
                while t > 0 {
                    let next = (
                        trellis.psi(t, state, k),
                        trellis.ktable(t, state, k),
                        trellis.ptable(t, state, k),
                    );
                    debug_assert!(next.2 < t);
                    state = next.0;
                    k = next.1;
                    t = next.2;
                    state_seq.push(state);
                    pos_seq.push(t);
                }
                state_seq.reverse();
                pos_seq.reverse();
                Path {
                    score: end.score(),
                    state_seq,
                    pos_seq,
                    decomposition: None,
                }
            })
            .collect()
    }
}

//
// tests
//
