//!
//! Trellis of the N-best decoding
//!
//! Four arrays indexed by `[t, j, k]` (time step, state, rank):
//!
//! * `delta`: score of the k-th best partial path ending in `j` at `t`
//! * `psi`: state of its predecessor
//! * `ktable`: rank of its predecessor
//! * `ptable`: time step of its predecessor (any earlier `t`)
//!
//! Row `t` is written once, from rows `< t` only.
//!
use crate::common::{Score, NEG_INF};
use crate::error::{DecodeError, Result};
use crate::select::Candidate;
use log::debug;
use ndarray::{Array3, ArrayView1, Axis};

/// bytes of one `(t, j, k)` cell over the four arrays
pub const CELL_BYTES: usize = std::mem::size_of::<Score>()
    + std::mem::size_of::<u32>()
    + std::mem::size_of::<u16>()
    + std::mem::size_of::<u32>();

///
/// Content of a trellis cell row `(t, j, *)`
///
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    ///
    /// The emission is unobservable: every rank holds the emission score
    /// alone, with no predecessor.
    Unobservable(Score),
    ///
    /// `nbest` ranked candidates (padded with `Candidate::SENTINEL`) whose
    /// costs are the negated scores before adding the emission.
    Ranked(Vec<Candidate>),
}

#[derive(Debug, Clone)]
pub struct Trellis {
    n_states: usize,
    nbest: usize,
    delta: Array3<Score>,
    psi: Array3<u32>,
    ktable: Array3<u16>,
    ptable: Array3<u32>,
}

///
/// allocate a vector of `n` copies of `value`, reporting failure as an error
///
fn try_filled<T: Clone>(n: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|source| DecodeError::Allocation { n_cells: n, source })?;
    v.resize(n, value);
    Ok(v)
}

/// estimated size of a trellis in MB (rounded up)
pub fn estimate_mb(seq_len: usize, n_states: usize, nbest: usize) -> usize {
    let bytes = seq_len
        .saturating_mul(n_states)
        .saturating_mul(nbest)
        .saturating_mul(CELL_BYTES);
    (bytes / 1_000_000).saturating_add(if bytes % 1_000_000 > 0 { 1 } else { 0 })
}

impl Trellis {
    ///
    /// Allocate the trellis for the whole sequence.
    ///
    /// Every `delta` is the sentinel and every back-pointer 0.
    ///
    pub fn new(
        seq_len: usize,
        n_states: usize,
        nbest: usize,
        limit_mb: Option<usize>,
    ) -> Result<Trellis> {
        let required_mb = estimate_mb(seq_len, n_states, nbest);
        debug!(
            "trellis seq_len={} n_states={} nbest={} ~{}MB",
            seq_len, n_states, nbest, required_mb
        );
        if let Some(limit_mb) = limit_mb {
            if required_mb > limit_mb {
                return Err(DecodeError::TooLarge {
                    required_mb,
                    limit_mb,
                });
            }
        }
        let shape = (seq_len, n_states, nbest);
        let n = seq_len.saturating_mul(n_states).saturating_mul(nbest);
        let delta = try_filled(n, NEG_INF)?;
        let psi = try_filled(n, 0)?;
        let ktable = try_filled(n, 0)?;
        let ptable = try_filled(n, 0)?;
        Ok(Trellis {
            n_states,
            nbest,
            delta: Array3::from_shape_vec(shape, delta).expect("trellis shape matches length"),
            psi: Array3::from_shape_vec(shape, psi).expect("trellis shape matches length"),
            ktable: Array3::from_shape_vec(shape, ktable).expect("trellis shape matches length"),
            ptable: Array3::from_shape_vec(shape, ptable).expect("trellis shape matches length"),
        })
    }
    pub fn seq_len(&self) -> usize {
        self.delta.len_of(Axis(0))
    }
    pub fn n_states(&self) -> usize {
        self.n_states
    }
    pub fn nbest(&self) -> usize {
        self.nbest
    }
    ///
    /// Pack a predecessor `(state, rank, time)` into
    /// `state + rank * N + time * N * nbest`.
    ///
    #[inline]
    pub fn encode(&self, state: usize, rank: usize, time: usize) -> usize {
        state + rank * self.n_states + time * self.n_states * self.nbest
    }
    ///
    /// Inverse of `encode`: `(state, rank, time)`.
    ///
    #[inline]
    pub fn decode(&self, payload: usize) -> (usize, usize, usize) {
        let n = self.n_states;
        let state = payload % n;
        let rank = (payload % (n * self.nbest)) / n;
        let time = payload / (n * self.nbest);
        (state, rank, time)
    }
    #[inline]
    pub fn delta(&self, t: usize, j: usize, k: usize) -> Score {
        self.delta[[t, j, k]]
    }
    #[inline]
    pub fn psi(&self, t: usize, j: usize, k: usize) -> usize {
        self.psi[[t, j, k]] as usize
    }
    #[inline]
    pub fn ktable(&self, t: usize, j: usize, k: usize) -> usize {
        self.ktable[[t, j, k]] as usize
    }
    #[inline]
    pub fn ptable(&self, t: usize, j: usize, k: usize) -> usize {
        self.ptable[[t, j, k]] as usize
    }
    /// scores of all ranks of `(t, j)`
    pub fn deltas(&self, t: usize, j: usize) -> ArrayView1<'_, Score> {
        self.delta.slice(ndarray::s![t, j, ..])
    }
    ///
    /// Initial cell: rank 0 gets `score`, other ranks stay the sentinel.
    ///
    pub fn set_initial(&mut self, j: usize, score: Score) {
        self.delta[[0, j, 0]] = score;
    }
    ///
    /// Write the cells `(t, j, *)`, adding `emission` to ranked candidates.
    ///
    pub fn set_cell(&mut self, t: usize, j: usize, cell: &Cell, emission: Score) {
        match cell {
            Cell::Unobservable(score) => {
                for k in 0..self.nbest {
                    self.delta[[t, j, k]] = *score;
                    self.psi[[t, j, k]] = 0;
                    self.ktable[[t, j, k]] = 0;
                    self.ptable[[t, j, k]] = 0;
                }
            }
            Cell::Ranked(candidates) => {
                debug_assert_eq!(candidates.len(), self.nbest);
                for (k, c) in candidates.iter().enumerate() {
                    if c.is_sentinel() {
                        self.delta[[t, j, k]] = NEG_INF;
                        self.psi[[t, j, k]] = 0;
                        self.ktable[[t, j, k]] = 0;
                        self.ptable[[t, j, k]] = 0;
                    } else {
                        let (state, rank, time) = self.decode(c.payload);
                        debug_assert!(time < t);
                        self.delta[[t, j, k]] = c.score() + emission;
                        self.psi[[t, j, k]] = state as u32;
                        self.ktable[[t, j, k]] = rank as u16;
                        self.ptable[[t, j, k]] = time as u32;
                    }
                }
            }
        }
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_encoding() {
        let tr = Trellis::new(10, 3, 4, None).unwrap();
        for &(s, k, t) in &[(0, 0, 0), (2, 3, 9), (1, 2, 5), (0, 3, 1)] {
            let p = tr.encode(s, k, t);
            assert_eq!(tr.decode(p), (s, k, t));
        }
        assert_eq!(tr.encode(1, 2, 3), 1 + 2 * 3 + 3 * 12);
    }

    #[test]
    fn initial_state() {
        let mut tr = Trellis::new(3, 2, 2, None).unwrap();
        tr.set_initial(1, -0.5);
        assert_eq!(tr.delta(0, 1, 0), -0.5);
        assert_eq!(tr.delta(0, 1, 1), NEG_INF);
        assert_eq!(tr.delta(0, 0, 0), NEG_INF);
        assert_eq!(tr.psi(2, 1, 1), 0);
    }

    #[test]
    fn write_cells() {
        let mut tr = Trellis::new(3, 2, 3, None).unwrap();
        let p = tr.encode(1, 0, 0);
        let cell = Cell::Ranked(vec![Candidate::new(2.0, p), Candidate::SENTINEL, Candidate::SENTINEL]);
        tr.set_cell(1, 0, &cell, -1.0);
        assert_eq!(tr.delta(1, 0, 0), -3.0);
        assert_eq!(tr.psi(1, 0, 0), 1);
        assert_eq!(tr.ptable(1, 0, 0), 0);
        assert_eq!(tr.delta(1, 0, 1), NEG_INF);

        tr.set_cell(2, 1, &Cell::Unobservable(-1e30), -1e30);
        for k in 0..3 {
            assert_eq!(tr.delta(2, 1, k), -1e30);
            assert_eq!(tr.psi(2, 1, k), 0);
            assert_eq!(tr.ktable(2, 1, k), 0);
            assert_eq!(tr.ptable(2, 1, k), 0);
        }
    }

    #[test]
    fn memory_limit() {
        assert_eq!(estimate_mb(1000, 100, 10), 18);
        match Trellis::new(1000, 100, 10, Some(10)) {
            Err(DecodeError::TooLarge {
                required_mb,
                limit_mb,
            }) => {
                assert_eq!(required_mb, 18);
                assert_eq!(limit_mb, 10);
            }
            r => panic!("unexpected {:?}", r.map(|_| ())),
        }
        assert!(Trellis::new(1000, 100, 10, Some(18)).is_ok());
    }

    #[test]
    fn allocation_failure_is_an_error() {
        let r = Trellis::new(usize::MAX / 2, 1 << 20, 1 << 10, None);
        assert!(matches!(r, Err(DecodeError::Allocation { .. })));
    }
}
