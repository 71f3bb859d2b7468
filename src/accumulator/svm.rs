//!
//! Windowed SVM-score accumulator
//!
//! For each word order `j`, every *unique* word fully inside the window
//! contributes its dictionary weight once. The value of an SVM output is
//!
//! ```text
//! sum_j  unnormalized_j[svm] / sqrt(n_unique_j)
//! ```
//!
//! where orders with no word in the window contribute `0`.
//!
use super::{clamp_range, WindowAccumulator};
use crate::common::Pos;
use crate::kmer::WordStrings;
use fixedbitset::FixedBitSet;

/// Accumulated state of a single word order
#[derive(Debug, Clone)]
struct OrderState {
    order: usize,
    vocab: usize,
    /// offset of this order in the concatenated vocabulary
    offset: usize,
    used: FixedBitSet,
    unnormalized: Vec<f64>,
    n_unique: usize,
    frontier: Pos,
}

impl OrderState {
    fn reset(&mut self, end_pos: Pos) {
        self.used.clear();
        self.unnormalized.iter_mut().for_each(|v| *v = 0.0);
        self.n_unique = 0;
        self.frontier = end_pos - self.order as Pos + 1;
    }
}

///
/// SVM accumulator owned by a single decode.
///
/// `dict[w + svm * total_vocab + offset_j]` is the weight of word `w` of the
/// j-th order for the svm-th output.
///
#[derive(Debug, Clone)]
pub struct SvmAccumulator<'a> {
    words: &'a WordStrings,
    dict: &'a [f64],
    n_svms: usize,
    total_vocab: usize,
    orders: Vec<OrderState>,
}

impl<'a> SvmAccumulator<'a> {
    ///
    /// # Panics
    ///
    /// Panics if the dictionary length is not `n_svms * total_vocab`.
    ///
    pub fn new(words: &'a WordStrings, dict: &'a [f64], n_svms: usize) -> Self {
        let config = words.config();
        let total_vocab = config.total_vocab();
        assert_eq!(
            dict.len(),
            n_svms * total_vocab,
            "dictionary length must be n_svms * total_vocab"
        );
        let offsets = config.cum_offsets();
        let orders = (0..config.n_orders())
            .map(|j| OrderState {
                order: config.orders[j],
                vocab: config.vocab(j),
                offset: offsets[j],
                used: FixedBitSet::with_capacity(config.vocab(j)),
                unnormalized: vec![0.0; n_svms],
                n_unique: 0,
                frontier: 0,
            })
            .collect();
        SvmAccumulator {
            words,
            dict,
            n_svms,
            total_vocab,
            orders,
        }
    }
    /// the number of SVM outputs
    pub fn n_svms(&self) -> usize {
        self.n_svms
    }
    /// the number of unique words of the j-th order in the current window
    pub fn n_unique(&self, j: usize) -> usize {
        self.orders[j].n_unique
    }
    ///
    /// Normalized value of the svm-th output for the current window.
    ///
    pub fn value(&self, svm: usize) -> f64 {
        self.orders
            .iter()
            .filter(|o| o.n_unique > 0)
            .map(|o| o.unnormalized[svm] / (o.n_unique as f64).sqrt())
            .sum()
    }
    ///
    /// Normalized values of all outputs, written into `out`.
    ///
    pub fn fill_values(&self, out: &mut Vec<f64>) {
        out.clear();
        out.extend((0..self.n_svms).map(|s| self.value(s)));
    }
    /// Normalized values of all outputs.
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_svms);
        self.fill_values(&mut out);
        out
    }
}

impl<'a> WindowAccumulator for SvmAccumulator<'a> {
    fn reset(&mut self, end_pos: Pos) {
        for o in self.orders.iter_mut() {
            o.reset(end_pos);
        }
    }
    fn extend_left(&mut self, new_left: Pos) {
        let n_svms = self.n_svms;
        let total_vocab = self.total_vocab;
        for (j, o) in self.orders.iter_mut().enumerate() {
            let words = self.words.words(j);
            for p in clamp_range(new_left, o.frontier, words.len()).rev() {
                let w = words[p] as usize;
                assert!(
                    w < o.vocab,
                    "word index {} at {} is out of vocabulary {}",
                    w,
                    p,
                    o.vocab
                );
                if !o.used.put(w) {
                    for s in 0..n_svms {
                        o.unnormalized[s] += self.dict[w + s * total_vocab + o.offset];
                    }
                    o.n_unique += 1;
                }
            }
            o.frontier = o.frontier.min(new_left);
        }
    }
    fn frontier(&self) -> Pos {
        self.orders.iter().map(|o| o.frontier).max().unwrap_or(0)
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::WordConfig;
    use crate::random_seq;
    use approx::assert_abs_diff_eq;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn random_dict(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// recompute the window `[left, end)` from scratch
    fn brute_force(words: &WordStrings, dict: &[f64], n_svms: usize, left: Pos, end: Pos) -> Vec<f64> {
        let config = words.config();
        let offsets = config.cum_offsets();
        let total = config.total_vocab();
        let mut out = vec![0.0; n_svms];
        for j in 0..config.n_orders() {
            let order = config.orders[j] as Pos;
            let w = words.words(j);
            let mut seen = std::collections::BTreeSet::new();
            let mut p = left.max(0);
            while p < end - order + 1 && (p as usize) < w.len() {
                seen.insert(w[p as usize] as usize);
                p += 1;
            }
            if !seen.is_empty() {
                let norm = (seen.len() as f64).sqrt();
                for s in 0..n_svms {
                    let sum: f64 = seen.iter().map(|&x| dict[x + s * total + offsets[j]]).sum();
                    out[s] += sum / norm;
                }
            }
        }
        out
    }

    #[test]
    fn single_order_hand_computed() {
        let config = WordConfig::new(vec![2]);
        // "acac": words starting at 0,1,2 are ac, ca, ac
        let words = WordStrings::from_seq(b"acac", &config);
        let mut dict = vec![0.0; 16];
        dict[1] = 2.0; // ac
        dict[4] = 4.0; // ca
        let mut acc = SvmAccumulator::new(&words, &dict, 1);
        acc.reset(4);
        acc.extend_left(2);
        // only "ac" at 2
        assert_eq!(acc.n_unique(0), 1);
        assert_abs_diff_eq!(acc.value(0), 2.0);
        acc.extend_left(0);
        // ac, ca (ac counted once)
        assert_eq!(acc.n_unique(0), 2);
        assert_abs_diff_eq!(acc.value(0), 6.0 / 2f64.sqrt());
    }

    #[test]
    fn empty_window_is_zero() {
        let config = WordConfig::default();
        let words = WordStrings::from_seq(b"acgtacgtac", &config);
        let dict = random_dict(2 * config.total_vocab(), 1);
        let mut acc = SvmAccumulator::new(&words, &dict, 2);
        acc.reset(3);
        acc.extend_left(2);
        assert_eq!(acc.values(), vec![0.0, 0.0]);
        acc.reset(5);
        acc.extend_left(-10);
        // only order 3 has words inside [0, 5)
        assert_eq!(acc.n_unique(0), 3);
        assert_eq!(acc.n_unique(3), 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let config = WordConfig::default();
        let words = WordStrings::from_seq(&random_seq::generate(200, 3), &config);
        let dict = random_dict(3 * config.total_vocab(), 2);
        let mut acc = SvmAccumulator::new(&words, &dict, 3);
        acc.reset(150);
        acc.extend_left(20);
        acc.reset(120);
        let once = acc.clone();
        acc.reset(120);
        assert_eq!(acc.values(), once.values());
        assert_eq!(acc.frontier(), once.frontier());
        for j in 0..config.n_orders() {
            assert_eq!(acc.n_unique(j), 0);
        }
        acc.extend_left(60);
        let mut fresh = once;
        fresh.extend_left(60);
        assert_eq!(acc.values(), fresh.values());
    }

    #[test]
    fn incremental_equals_brute_force() {
        let config = WordConfig::default();
        let n_svms = 3;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        for seed in 0..5 {
            let seq = random_seq::generate(300, seed);
            let words = WordStrings::from_seq(&seq, &config);
            let dict = random_dict(n_svms * config.total_vocab(), seed + 100);
            let mut acc = SvmAccumulator::new(&words, &dict, n_svms);
            for _ in 0..20 {
                let end: Pos = rng.gen_range(0..=300);
                acc.reset(end);
                let mut left = end;
                for _ in 0..10 {
                    left -= rng.gen_range(0..40);
                    acc.extend_left(left);
                    let expected = brute_force(&words, &dict, n_svms, left, end);
                    for s in 0..n_svms {
                        assert_abs_diff_eq!(acc.value(s), expected[s], epsilon = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn dictionary_length_is_checked() {
        let config = WordConfig::default();
        let words = WordStrings::from_seq(b"acgt", &config);
        let dict = vec![0.0; 10];
        SvmAccumulator::new(&words, &dict, 1);
    }
}
