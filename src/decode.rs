//!
//! N-best segmental Viterbi decoding
//!
//! 1. `forward`: fill the trellis time step by time step. A transition
//!    `ii -> j` into time step `t` may start at any earlier time step `ts`
//!    whose position is within the look-back bound of the transition.
//! 2. `traceback`: pick the `nbest` best final cells and follow the
//!    back-pointers.
//! 3. `decompose`: split the score of each path edge into the penalty
//!    function buckets.
//!
pub mod decompose;
pub mod forward;
pub mod traceback;

pub use decompose::Decomposition;
pub use traceback::Path;

use crate::accumulator::{SegmentSumAccumulator, SvmAccumulator};
use crate::common::{Pos, Score, NEG_INF};
use crate::error::Result;
use crate::input::DecodeInput;
use crate::kmer::WordStrings;
use crate::model::{Predecessor, SegmentModel};
use crate::orf::StopCodons;
use crate::params::DecodeParams;
use crate::plif::Penalty;
use crate::select::{FixedLenList, TopK};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

///
/// A transition into a state with its effective look-back bound
///
#[derive(Debug, Clone)]
pub struct EdgePlan<'a, P: Penalty> {
    pub pred: Predecessor<'a, P>,
    pub look_back: Pos,
}

///
/// Result of a decoding
///
#[derive(Debug, Clone)]
pub struct Decoded {
    /// best paths, best first. At most `nbest`.
    pub paths: Vec<Path>,
    /// `(id, name)` of the penalty functions of the model
    pub penalty_names: Vec<(usize, String)>,
}

impl Decoded {
    ///
    /// `nbest` scores padded with the sentinel
    ///
    pub fn scores(&self, nbest: usize) -> Vec<Score> {
        let mut scores: Vec<Score> = self.paths.iter().map(|p| p.score).collect();
        scores.resize(nbest, NEG_INF);
        scores
    }
}

///
/// Decoder of one input sequence
///
/// Holds the read-only tables shared by all time steps: the transitions of
/// each state, the encoded words and the stop codon table.
///
pub struct Decoder<'a, P: Penalty> {
    pub model: &'a SegmentModel<P>,
    pub input: &'a DecodeInput,
    pub params: &'a DecodeParams,
    /// transitions into each state
    plans: Vec<Vec<EdgePlan<'a, P>>>,
    words: Option<WordStrings>,
    stops: Option<StopCodons>,
    max_look_back: Pos,
    cancel: Option<Arc<AtomicBool>>,
}

///
/// Per-worker scratch space of the forward recursion
///
pub struct Scratch<'d, S: TopK> {
    pub selector: S,
    pub svm: Option<SvmAccumulator<'d>>,
    pub segment: Option<SegmentSumAccumulator<'d>>,
    pub svm_values: Vec<f64>,
}

impl<'a, P: Penalty> Decoder<'a, P> {
    ///
    /// # Panics
    ///
    /// Panics on malformed model or input:
    /// * `nbest` is 0 or not smaller than 32000
    /// * the emission matrix is not `n_states x seq_len`
    /// * positions are decreasing
    /// * segment weights do not have a column per state, or are shorter
    ///   than the last position
    /// * a penalty function reads an SVM output the input does not have
    /// * the model needs a symbol sequence (ORF or SVM) but none is given
    /// * ORF metadata on only one side of a transition
    ///
    pub fn new(model: &'a SegmentModel<P>, input: &'a DecodeInput, params: &'a DecodeParams) -> Self {
        params.validate();
        let n_states = model.n_states();
        let seq_len = input.seq_len();
        assert_eq!(
            input.emissions.nrows(),
            n_states,
            "emission matrix must have a row per state"
        );
        assert_eq!(
            input.emissions.ncols(),
            seq_len,
            "emission matrix must have a column per time step"
        );
        assert!(
            input.positions.windows(2).all(|w| w[0] <= w[1]),
            "positions must be non-decreasing"
        );
        if let Some(w) = &input.segment_weights {
            assert_eq!(w.ncols(), n_states, "segment weights must have a column per state");
            // windows end at a position exclusively
            let last = input.positions.last().copied().unwrap_or(0);
            assert!(
                w.nrows() as Pos >= last,
                "segment weights must have a row per position up to {}",
                last
            );
        }

        let seq = input.sequence_bytes();
        let genestr_len = match seq {
            Some(seq) => seq.len() as Pos,
            None => input.positions.last().map_or(0, |&p| p + 1),
        };

        // global look-back bound
        let mut max_look_back = params.default_look_back;
        if let Some(m) = model.max_penalty_len() {
            max_look_back = max_look_back.max(m);
        }
        max_look_back = max_look_back.min(genestr_len);

        let plans: Vec<Vec<EdgePlan<P>>> = (0..n_states)
            .map(|j| {
                model
                    .forward_adjacency(j)
                    .into_iter()
                    .map(|pred| {
                        let look_back = pred.look_back(max_look_back);
                        if look_back > max_look_back {
                            debug!(
                                "look-back of {} -> {} clipped from {} to {}",
                                pred.state, j, look_back, max_look_back
                            );
                        }
                        EdgePlan {
                            look_back: look_back.min(max_look_back),
                            pred,
                        }
                    })
                    .collect()
            })
            .collect();

        let has_orf = plans.iter().flatten().any(|e| e.pred.orf.is_some());
        let stops = if has_orf && params.use_orf {
            let seq = seq.unwrap_or_else(|| {
                panic!("ORF-constrained transitions require the symbol sequence")
            });
            Some(StopCodons::from_seq(seq))
        } else {
            None
        };

        let use_svm = model.uses_svm();
        let words = if use_svm {
            let seq = seq.unwrap_or_else(|| {
                panic!("SVM-based penalty functions require the symbol sequence")
            });
            for p in model.penalties.iter() {
                if let Some(svm) = p.svm_index() {
                    assert!(
                        svm < input.n_svms,
                        "penalty function {} reads SVM output {} of {}",
                        p.name(),
                        svm,
                        input.n_svms
                    );
                }
            }
            assert_eq!(
                input.dictionary.len(),
                input.n_svms * input.word_config.total_vocab(),
                "dictionary length must be n_svms * total_vocab"
            );
            Some(WordStrings::from_seq(seq, &input.word_config))
        } else {
            None
        };

        debug!(
            "decoder n_states={} seq_len={} nbest={} max_look_back={} use_svm={} orf={}",
            n_states,
            seq_len,
            params.nbest,
            max_look_back,
            use_svm,
            stops.is_some()
        );
        if has_orf && !params.use_orf {
            warn!("stop codon check is disabled; only reading frames are checked");
        }

        Decoder {
            model,
            input,
            params,
            plans,
            words,
            stops,
            max_look_back,
            cancel: None,
        }
    }
    ///
    /// Raise the flag to abort the decoding at the next time step.
    ///
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
    pub fn n_states(&self) -> usize {
        self.model.n_states()
    }
    pub fn nbest(&self) -> usize {
        self.params.nbest
    }
    pub fn max_look_back(&self) -> Pos {
        self.max_look_back
    }
    /// transitions into the state, in adjacency order
    pub fn plans(&self, j: usize) -> &[EdgePlan<'a, P>] {
        &self.plans[j]
    }
    pub fn stops(&self) -> Option<&StopCodons> {
        self.stops.as_ref()
    }
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |f| f.load(Ordering::Relaxed))
    }
    ///
    /// Fresh scratch space borrowing the tables of the decoder.
    ///
    pub fn scratch<S: TopK>(&self) -> Scratch<'_, S> {
        let (svm, segment) = self.accumulators();
        Scratch {
            selector: S::new(self.params.nbest),
            svm,
            segment,
            svm_values: vec![0.0; self.input.n_svms],
        }
    }
    ///
    /// Accumulators of the SVM outputs (if any penalty function uses them)
    /// and of the segment sums (if weights are given).
    ///
    pub fn accumulators(
        &self,
    ) -> (
        Option<SvmAccumulator<'_>>,
        Option<SegmentSumAccumulator<'_>>,
    ) {
        let svm = self
            .words
            .as_ref()
            .map(|w| SvmAccumulator::new(w, &self.input.dictionary, self.input.n_svms));
        let segment = self
            .input
            .segment_weights
            .as_ref()
            .map(|w| SegmentSumAccumulator::new(w.view()));
        (svm, segment)
    }
    ///
    /// Decode with the production selector.
    ///
    pub fn run(&self) -> Result<Decoded> {
        self.run_with::<FixedLenList>()
    }
    ///
    /// Decode with the selector `S`.
    ///
    pub fn run_with<S: TopK>(&self) -> Result<Decoded> {
        let trellis = self.forward::<S>()?;
        let mut paths = self.traceback::<S>(&trellis);
        if self.params.decompose {
            for path in paths.iter_mut() {
                path.decomposition = Some(self.decompose(path));
            }
        }
        Ok(Decoded {
            paths,
            penalty_names: self
                .model
                .penalty_names()
                .into_iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect(),
        })
    }
}

///
/// Decode `input` with `model` using the production selector.
///
pub fn decode<P: Penalty>(
    model: &SegmentModel<P>,
    input: &DecodeInput,
    params: &DecodeParams,
) -> Result<Decoded> {
    Decoder::new(model, input, params).run()
}

///
/// Decode `input` with `model` using the selector `S`.
///
pub fn decode_with<S: TopK, P: Penalty>(
    model: &SegmentModel<P>,
    input: &DecodeInput,
    params: &DecodeParams,
) -> Result<Decoded> {
    Decoder::new(model, input, params).run_with::<S>()
}
