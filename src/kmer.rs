//!
//! Word (k-mer) encoding of the symbol sequence
//!
//! A word of order `k` is encoded as a base-4 number with `A=0, C=1, G=2, T=3`,
//! the oldest symbol being the most significant digit.
//!
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Encoded word
pub type Word = u32;

/// Maximum order that fits in `Word`
pub const MAX_ORDER: usize = 15;

///
/// Encode a lowercase base into 2 bits.
///
/// # Panics
///
/// Panics if the base is not one of `a,c,g,t`.
///
#[inline]
pub fn encode_base(base: u8) -> Word {
    match base {
        b'a' => 0,
        b'c' => 1,
        b'g' => 2,
        b't' => 3,
        _ => panic!("invalid symbol {:?} (expected one of a,c,g,t)", base as char),
    }
}

///
/// Encode each position `i` of the sequence into the word of `order` symbols
/// ending at `i`.
///
/// Positions `i < order - 1` hold the partial window, zero-padded on the left.
///
pub fn encode_words(seq: &[u8], order: usize) -> Vec<Word> {
    assert!(
        order >= 1 && order <= MAX_ORDER,
        "word order {} is out of range",
        order
    );
    let n = seq.len();
    let mut words = vec![0; n];
    if n == 0 {
        return words;
    }
    let top = 2 * (order - 1);

    // window ending at the last position
    let mut value: Word = 0;
    for i in (n.saturating_sub(order)..n).rev() {
        value = (value >> 2) | (encode_base(seq[i]) << top);
    }
    if n < order {
        value >>= 2 * (order - n);
    }
    let value = (0..n).rev().fold(value, |value, i| {
        words[i] = value;
        // slide the window one symbol to the left
        if i >= order {
            (value >> 2) | (encode_base(seq[i - order]) << top)
        } else {
            value >> 2
        }
    });
    debug_assert_eq!(value, 0);
    words
}

///
/// Word orders used for SVM feature accumulation, with the derived
/// vocabulary sizes and offsets into the dictionary.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordConfig {
    pub orders: Vec<usize>,
}

impl Default for WordConfig {
    fn default() -> Self {
        WordConfig {
            orders: vec![3, 4, 5, 6],
        }
    }
}

impl WordConfig {
    pub fn new(orders: Vec<usize>) -> Self {
        assert!(!orders.is_empty(), "at least one word order is required");
        assert!(orders.iter().all(|&k| k >= 1 && k <= MAX_ORDER));
        WordConfig { orders }
    }
    /// the number of orders
    pub fn n_orders(&self) -> usize {
        self.orders.len()
    }
    /// vocabulary size `4^k` of the j-th order
    pub fn vocab(&self, j: usize) -> usize {
        1 << (2 * self.orders[j])
    }
    ///
    /// offset of each order in the concatenated vocabulary.
    /// `cum_offsets()[n_orders]` is the total vocabulary.
    ///
    /// `[3,4,5,6]` gives `[0,64,320,1344,5440]`.
    ///
    pub fn cum_offsets(&self) -> Vec<usize> {
        std::iter::once(0)
            .chain((0..self.n_orders()).scan(0, |acc, j| {
                *acc += self.vocab(j);
                Some(*acc)
            }))
            .collect()
    }
    /// sum of vocabulary sizes over all orders
    pub fn total_vocab(&self) -> usize {
        (0..self.n_orders()).map(|j| self.vocab(j)).sum()
    }
    /// the largest order
    pub fn max_order(&self) -> usize {
        self.orders.iter().copied().max().unwrap_or(1)
    }
}

///
/// Encoded words of a sequence for every configured order.
///
/// `words(j)[p]` is the word of order `k_j` that starts at `p`. The last
/// `k_j - 1` entries have no full word starting there and keep the
/// (end-aligned) value of the encoder.
///
#[derive(Debug, Clone)]
pub struct WordStrings {
    config: WordConfig,
    words: Vec<Vec<Word>>,
}

impl WordStrings {
    pub fn from_seq(seq: &[u8], config: &WordConfig) -> Self {
        let words = config
            .orders
            .iter()
            .map(|&order| {
                let mut w = encode_words(seq, order);
                let start = order - 1;
                if start > 0 && start < w.len() {
                    w.copy_within(start.., 0);
                }
                w
            })
            .collect();
        WordStrings {
            config: config.clone(),
            words,
        }
    }
    pub fn config(&self) -> &WordConfig {
        &self.config
    }
    /// the length of the underlying sequence
    pub fn len(&self) -> usize {
        self.words.first().map_or(0, |w| w.len())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// start-aligned words of the j-th order
    pub fn words(&self, j: usize) -> &[Word] {
        &self.words[j]
    }
}

///
/// Convert an encoded word back into a lowercase string
///
pub fn decode_word(word: Word, order: usize) -> String {
    (0..order)
        .rev()
        .map(|i| match (word >> (2 * i)) & 0b11 {
            0 => 'a',
            1 => 'c',
            2 => 'g',
            _ => 't',
        })
        .join("")
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn encode_full_windows() {
        let w = encode_words(b"acgtt", 3);
        // acg = 0*16+1*4+2
        assert_eq!(w[2], 6);
        // cgt = 1*16+2*4+3
        assert_eq!(w[3], 27);
        // gtt = 2*16+3*4+3
        assert_eq!(w[4], 47);
        assert_eq!(decode_word(w[4], 3), "gtt");
    }

    #[test]
    fn encode_partial_windows() {
        let w = encode_words(b"tgca", 3);
        // "t" zero padded
        assert_eq!(w[0], 3);
        // "tg"
        assert_eq!(w[1], 3 * 4 + 2);
        assert_eq!(w[2], 3 * 16 + 2 * 4 + 1);
        assert_eq!(w[3], 2 * 16 + 1 * 4);
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"a" ; "single")]
    #[test_case(b"ac" ; "shorter than order")]
    #[test_case(b"gattacagattaca" ; "long")]
    fn encode_matches_naive(seq: &[u8]) {
        for order in 1..=6 {
            let w = encode_words(seq, order);
            assert_eq!(w.len(), seq.len());
            for i in 0..seq.len() {
                let from = (i + 1).saturating_sub(order);
                let naive = seq[from..=i]
                    .iter()
                    .fold(0, |acc, &b| (acc << 2) | encode_base(b));
                assert_eq!(w[i], naive, "order={} i={}", order, i);
            }
        }
    }

    #[test]
    #[should_panic]
    fn encode_uppercase_is_rejected() {
        encode_words(b"acGt", 2);
    }

    #[test]
    fn default_config_offsets() {
        let c = WordConfig::default();
        assert_eq!(c.cum_offsets(), vec![0, 64, 320, 1344, 5440]);
        assert_eq!(c.total_vocab(), 5440);
        assert_eq!(c.vocab(3), 4096);
        assert_eq!(c.max_order(), 6);
    }

    #[test]
    fn word_strings_are_start_aligned() {
        let seq = b"acgtacgt";
        let ws = WordStrings::from_seq(seq, &WordConfig::new(vec![2, 3]));
        assert_eq!(ws.len(), 8);
        // order 2: word starting at 1 is "cg"
        assert_eq!(decode_word(ws.words(0)[1], 2), "cg");
        // order 3: word starting at 5 is "cgt"
        assert_eq!(decode_word(ws.words(1)[5], 3), "cgt");
        for p in 0..=5 {
            assert_eq!(
                decode_word(ws.words(1)[p], 3).as_bytes(),
                &seq[p..p + 3]
            );
        }
    }
}
