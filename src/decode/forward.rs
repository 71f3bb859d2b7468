//!
//! Forward recursion of the N-best decoding
//!
use super::{Decoder, Scratch};
use crate::accumulator::WindowAccumulator;
use crate::common::{is_impossible, Pos, Score};
use crate::error::{DecodeError, Result};
use crate::model::Predecessor;
use crate::orf::OrfCursor;
use crate::plif::Penalty;
use crate::select::TopK;
use crate::trellis::{Cell, Trellis};
use log::{debug, info};
use rayon::prelude::*;

/// inputs at least this long get progress logs
const PROGRESS_MIN_LEN: usize = 10_000;

impl<'a, P: Penalty> Decoder<'a, P> {
    ///
    /// Fill the whole trellis.
    ///
    /// Time steps are processed in order; the states of one time step are
    /// independent and are computed in parallel if `params.parallel`.
    ///
    pub fn forward<S: TopK>(&self) -> Result<Trellis> {
        let seq_len = self.input.seq_len();
        let n_states = self.n_states();
        let mut trellis = Trellis::new(seq_len, n_states, self.nbest(), self.params.max_trellis_mb)?;
        if seq_len == 0 {
            return Ok(trellis);
        }

        // initialization
        for i in 0..n_states {
            let score = self.model.initial_state_score(i) + self.input.emissions[[i, 0]];
            trellis.set_initial(i, score);
        }

        // recursion
        let mut scratch = self.scratch::<S>();
        let progress_step = 1 + seq_len / 10;
        for t in 1..seq_len {
            if self.is_cancelled() {
                debug!("cancelled at t={}", t);
                return Err(DecodeError::Cancelled { t });
            }
            if seq_len >= PROGRESS_MIN_LEN && t % progress_step == 0 {
                info!("forward {}/{}", t, seq_len);
            }

            let row: Vec<Cell> = if self.params.parallel {
                (0..n_states)
                    .into_par_iter()
                    .map_init(
                        || self.scratch::<S>(),
                        |scratch, j| self.compute_cell(&trellis, t, j, scratch),
                    )
                    .collect()
            } else {
                (0..n_states)
                    .map(|j| self.compute_cell(&trellis, t, j, &mut scratch))
                    .collect()
            };

            for (j, cell) in row.iter().enumerate() {
                trellis.set_cell(t, j, cell, self.input.emissions[[j, t]]);
            }
        }
        Ok(trellis)
    }
    ///
    /// Compute the cells `(t, j, *)` from the rows `< t` of the trellis.
    ///
    pub fn compute_cell<S: TopK>(
        &self,
        trellis: &Trellis,
        t: usize,
        j: usize,
        scratch: &mut Scratch<'_, S>,
    ) -> Cell {
        let emission = self.input.emissions[[j, t]];
        if is_impossible(emission) {
            return Cell::Unobservable(emission);
        }

        let positions = &self.input.positions;
        let pos_t = positions[t];
        let nbest = self.nbest();
        scratch.selector.clear();

        for plan in self.plans(j) {
            let pred = &plan.pred;
            let ii = pred.state;
            if let Some(svm) = scratch.svm.as_mut() {
                svm.reset(pos_t);
            }
            if let Some(segment) = scratch.segment.as_mut() {
                segment.reset(pos_t);
            }
            let mut orf = pred.orf.map(|phases| OrfCursor::new(phases, pos_t));

            for ts in (0..t).rev() {
                let pos_ts = positions[ts];
                let gap = pos_t - pos_ts;
                if gap > plan.look_back {
                    break;
                }
                if let Some(cursor) = orf.as_mut() {
                    if !cursor.phases().is_frame_consistent(gap) {
                        continue;
                    }
                    // every earlier start reads through the same stop codon
                    if let Some(stops) = self.stops() {
                        if !cursor.extend(stops, pos_ts, pos_t) {
                            break;
                        }
                    }
                }

                let penalty = transition_penalty(pred, j, pos_ts, gap, scratch);
                if is_impossible(penalty) {
                    continue;
                }
                let value = pred.weight + penalty;
                for diff in 0..nbest {
                    let prev = trellis.delta(ts, ii, diff);
                    // ranks are sorted, the rest is impossible too
                    if is_impossible(prev) {
                        break;
                    }
                    scratch
                        .selector
                        .push(-(value + prev), trellis.encode(ii, diff, ts));
                }
            }
        }
        Cell::Ranked(scratch.selector.drain_ranked())
    }
}

///
/// Sum of the penalty functions of the transition plus the segment sum of
/// the target state, for the window `[left, left + gap)`.
///
/// The accumulators of `scratch` must have been reset at `left + gap` and
/// only extended to positions `>= left` since.
///
fn transition_penalty<P: Penalty, S: TopK>(
    pred: &Predecessor<'_, P>,
    j: usize,
    left: Pos,
    gap: Pos,
    scratch: &mut Scratch<'_, S>,
) -> Score {
    if let Some(svm) = scratch.svm.as_mut() {
        svm.extend_left(left);
        svm.fill_values(&mut scratch.svm_values);
    }
    let mut penalty = 0.0;
    for p in pred.penalties.iter() {
        penalty += p.lookup(gap, &scratch.svm_values).0;
    }
    if let Some(segment) = scratch.segment.as_mut() {
        segment.extend_left(left);
        penalty += segment.value(j);
    }
    penalty
}
