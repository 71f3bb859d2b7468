//!
//! Per-sequence input of the decoding
//!
use crate::common::{Pos, Score};
use crate::kmer::WordConfig;
use crate::plif::Plif;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

///
/// Input of a single decode.
///
/// * `emissions[[state, t]]`: emission score of `state` at time `t`
/// * `positions[t]`: position of the t-th candidate boundary on `sequence`
/// * `sequence`: lowercase `acgt` symbols. Required by ORF-constrained
///   transitions and SVM-based penalty functions.
/// * `dictionary`: per-word SVM weights, `n_svms * total_vocab` values
/// * `segment_weights[[pos, state]]`: position weights summed over the span
///   of a transition into `state`
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeInput {
    pub emissions: Array2<Score>,
    pub positions: Vec<Pos>,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub word_config: WordConfig,
    #[serde(default)]
    pub n_svms: usize,
    #[serde(default)]
    pub dictionary: Vec<f64>,
    #[serde(default)]
    pub segment_weights: Option<Array2<f64>>,
}

impl DecodeInput {
    ///
    /// Input with emissions and positions only.
    ///
    pub fn new(emissions: Array2<Score>, positions: Vec<Pos>) -> Self {
        DecodeInput {
            emissions,
            positions,
            sequence: None,
            word_config: WordConfig::default(),
            n_svms: 0,
            dictionary: Vec::new(),
            segment_weights: None,
        }
    }
    pub fn with_sequence(mut self, sequence: &str) -> Self {
        self.sequence = Some(sequence.to_string());
        self
    }
    pub fn with_dictionary(mut self, word_config: WordConfig, n_svms: usize, dictionary: Vec<f64>) -> Self {
        self.word_config = word_config;
        self.n_svms = n_svms;
        self.dictionary = dictionary;
        self
    }
    pub fn with_segment_weights(mut self, weights: Array2<f64>) -> Self {
        self.segment_weights = Some(weights);
        self
    }
    /// the number of time steps
    pub fn seq_len(&self) -> usize {
        self.positions.len()
    }
    pub fn sequence_bytes(&self) -> Option<&[u8]> {
        self.sequence.as_ref().map(|s| s.as_bytes())
    }
    pub fn to_json_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

///
/// Emission scores from per-state signals.
///
/// `signals[[state, t, k]]` is the k-th signal of the state at `t`, and
/// `state_signals[state]` lists the penalty functions (indices into
/// `plifs`) applied to the signals in order; the score is their sum.
/// Signals are not checked against the length range of the functions.
/// A state without any function takes its first signal as it is.
/// Non-finite signals are kept as they are.
///
pub fn emissions_from_state_signals(
    signals: &Array3<f64>,
    plifs: &[Plif],
    state_signals: &[Vec<usize>],
) -> Array2<Score> {
    let (n_states, seq_len, n_signals) = signals.dim();
    assert_eq!(
        state_signals.len(),
        n_states,
        "signal penalty functions must be given for every state"
    );
    let mut emissions = Array2::zeros((n_states, seq_len));
    for i in 0..n_states {
        let fs = &state_signals[i];
        assert!(fs.len() <= n_signals, "more signal functions than signals");
        for t in 0..seq_len {
            if fs.is_empty() {
                emissions[[i, t]] = signals[[i, t, 0]];
                continue;
            }
            for (k, &f) in fs.iter().enumerate() {
                let x = signals[[i, t, k]];
                if x.is_finite() {
                    emissions[[i, t]] += plifs[f].lookup_signal(x);
                } else {
                    emissions[[i, t]] = x;
                }
            }
        }
    }
    emissions
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn state_signals() {
        let plifs = vec![
            Plif::new(0, "s0", vec![0.0, 1.0], vec![0.0, 10.0], 100),
            Plif::new(1, "s1", vec![0.0], vec![-1.0], 100),
        ];
        // 2 states, 2 time steps, 2 signals
        let mut signals = Array3::zeros((2, 2, 2));
        signals[[0, 0, 0]] = 0.5;
        signals[[0, 0, 1]] = 3.0;
        signals[[0, 1, 0]] = f64::NEG_INFINITY;
        signals[[1, 0, 0]] = 7.0;
        signals[[1, 1, 0]] = -2.0;
        let e = emissions_from_state_signals(&signals, &plifs, &[vec![0, 1], vec![]]);
        assert_abs_diff_eq!(e[[0, 0]], 5.0 - 1.0);
        assert!(e[[0, 1]] < -1e20);
        assert_abs_diff_eq!(e[[1, 0]], 7.0);
        assert_abs_diff_eq!(e[[1, 1]], -2.0);
    }

    #[test]
    fn json_round_trip() {
        let input = DecodeInput::new(array![[0.0, -1.0], [-2.0, 0.5]], vec![0, 3])
            .with_sequence("acgt")
            .with_segment_weights(Array2::zeros((4, 2)));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        input.to_json_file(&path).unwrap();
        assert_eq!(DecodeInput::from_json_file(&path).unwrap(), input);
    }
}
