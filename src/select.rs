//!
//! Bounded candidate selector (k-smallest)
//!
//! Keeps the `nbest` candidates with the smallest cost out of a stream,
//! sorted ascending. Ties are broken by insertion order (first-seen wins).
//!
//! * `FixedLenList`: sorted insertion buffer of capacity `nbest`. Used by the
//!   decoder.
//! * `SortAll`: collect everything, then stable sort.
//! * `HeapTopK`: bounded binary heap keyed by `(cost, insertion order)`.
//!
//! All of them produce the same output for the same input sequence.
//!
use crate::common::{Score, NEG_INF};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

///
/// Candidate of a trellis cell.
///
/// `cost` is the negated score, `payload` the encoded predecessor.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub cost: Score,
    pub payload: usize,
}

impl Candidate {
    ///
    /// Padding of missing ranks: score "negative infinity" and payload 0.
    ///
    pub const SENTINEL: Candidate = Candidate {
        cost: -NEG_INF,
        payload: 0,
    };
    pub fn new(cost: Score, payload: usize) -> Self {
        Candidate { cost, payload }
    }
    /// the score (= negated cost)
    pub fn score(&self) -> Score {
        -self.cost
    }
    pub fn is_sentinel(&self) -> bool {
        self.cost >= -NEG_INF
    }
}

///
/// k-smallest selector
///
pub trait TopK: Send {
    ///
    /// Create an empty selector keeping `nbest` candidates.
    ///
    fn new(nbest: usize) -> Self
    where
        Self: Sized;
    /// the number of candidates to keep
    fn nbest(&self) -> usize;
    /// remove all candidates
    fn clear(&mut self);
    /// feed a candidate
    fn push(&mut self, cost: Score, payload: usize);
    ///
    /// Move the kept candidates (at most `nbest`, ascending by cost) into
    /// `out`, and clear the selector.
    ///
    fn drain_sorted(&mut self, out: &mut Vec<Candidate>);
    ///
    /// Exactly `nbest` candidates ascending by cost, padded with
    /// `Candidate::SENTINEL`.
    ///
    fn drain_ranked(&mut self) -> Vec<Candidate> {
        let nbest = self.nbest();
        let mut out = Vec::with_capacity(nbest);
        self.drain_sorted(&mut out);
        out.resize(nbest, Candidate::SENTINEL);
        out
    }
}

/// sort key of costs. NaN compares as equal.
#[inline]
fn cmp_cost(a: Score, b: Score) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

//
// FixedLenList
//

///
/// Sorted insertion buffer of capacity `nbest`.
///
/// A new candidate is inserted only if the buffer is not full or it beats
/// the current worst; it is placed after the entries with an equal cost.
/// `O(nbest)` per push, no allocation after construction.
///
#[derive(Clone, Debug)]
pub struct FixedLenList {
    nbest: usize,
    list: Vec<Candidate>,
}

impl TopK for FixedLenList {
    fn new(nbest: usize) -> Self {
        FixedLenList {
            nbest,
            list: Vec::with_capacity(nbest + 1),
        }
    }
    fn nbest(&self) -> usize {
        self.nbest
    }
    fn clear(&mut self) {
        self.list.clear();
    }
    fn push(&mut self, cost: Score, payload: usize) {
        debug_assert!(!cost.is_nan());
        let len = self.list.len();
        if len < self.nbest || cost < self.list[len - 1].cost {
            let mut at = len;
            while at > 0 && cost < self.list[at - 1].cost {
                at -= 1;
            }
            if len == self.nbest {
                self.list.pop();
            }
            self.list.insert(at, Candidate::new(cost, payload));
        }
    }
    fn drain_sorted(&mut self, out: &mut Vec<Candidate>) {
        out.clear();
        out.extend(self.list.drain(..));
    }
}

//
// SortAll
//

///
/// Collect all candidates then stable-sort.
///
#[derive(Clone, Debug)]
pub struct SortAll {
    nbest: usize,
    all: Vec<Candidate>,
}

impl TopK for SortAll {
    fn new(nbest: usize) -> Self {
        SortAll {
            nbest,
            all: Vec::new(),
        }
    }
    fn nbest(&self) -> usize {
        self.nbest
    }
    fn clear(&mut self) {
        self.all.clear();
    }
    fn push(&mut self, cost: Score, payload: usize) {
        debug_assert!(!cost.is_nan());
        self.all.push(Candidate::new(cost, payload));
    }
    fn drain_sorted(&mut self, out: &mut Vec<Candidate>) {
        // sort_by is stable
        self.all.sort_by(|a, b| cmp_cost(a.cost, b.cost));
        self.all.truncate(self.nbest);
        out.clear();
        out.extend(self.all.drain(..));
    }
}

//
// HeapTopK
//

/// heap entry ordered by `(cost, seq)`, the worst on top of the max-heap
#[derive(Clone, Copy, Debug)]
struct HeapEntry {
    cost: Score,
    seq: usize,
    payload: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &HeapEntry) -> Ordering {
        cmp_cost(self.cost, other.cost).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &HeapEntry) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &HeapEntry) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

///
/// Bounded max-heap of the `nbest` best candidates.
///
#[derive(Clone, Debug)]
pub struct HeapTopK {
    nbest: usize,
    seq: usize,
    heap: BinaryHeap<HeapEntry>,
}

impl TopK for HeapTopK {
    fn new(nbest: usize) -> Self {
        HeapTopK {
            nbest,
            seq: 0,
            heap: BinaryHeap::with_capacity(nbest + 1),
        }
    }
    fn nbest(&self) -> usize {
        self.nbest
    }
    fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }
    fn push(&mut self, cost: Score, payload: usize) {
        debug_assert!(!cost.is_nan());
        let entry = HeapEntry {
            cost,
            seq: self.seq,
            payload,
        };
        self.seq += 1;
        if self.nbest == 0 {
            return;
        }
        if self.heap.len() < self.nbest {
            self.heap.push(entry);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if entry < *worst {
                *worst = entry;
            }
        }
    }
    fn drain_sorted(&mut self, out: &mut Vec<Candidate>) {
        let heap = std::mem::take(&mut self.heap);
        out.clear();
        out.extend(
            heap.into_sorted_vec()
                .into_iter()
                .map(|e| Candidate::new(e.cost, e.payload)),
        );
        self.seq = 0;
    }
}

///
/// Select the `nbest` smallest of `candidates` with the selector `S`.
///
pub fn select_with<S: TopK, I: IntoIterator<Item = (Score, usize)>>(
    nbest: usize,
    candidates: I,
) -> Vec<Candidate> {
    let mut s = S::new(nbest);
    for (cost, payload) in candidates {
        s.push(cost, payload);
    }
    s.drain_ranked()
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use test_case::test_case;

    fn all_strategies(nbest: usize, input: &[(Score, usize)]) -> Vec<Vec<Candidate>> {
        vec![
            select_with::<FixedLenList, _>(nbest, input.iter().copied()),
            select_with::<SortAll, _>(nbest, input.iter().copied()),
            select_with::<HeapTopK, _>(nbest, input.iter().copied()),
        ]
    }

    #[test]
    fn smallest_ascending() {
        let input = vec![(5.0, 0), (1.0, 1), (3.0, 2), (-2.0, 3), (4.0, 4)];
        for out in all_strategies(3, &input) {
            assert_eq!(
                out,
                vec![
                    Candidate::new(-2.0, 3),
                    Candidate::new(1.0, 1),
                    Candidate::new(3.0, 2)
                ]
            );
        }
    }

    #[test]
    fn padding_with_sentinel() {
        let input = vec![(2.0, 7)];
        for out in all_strategies(3, &input) {
            assert_eq!(out.len(), 3);
            assert_eq!(out[0], Candidate::new(2.0, 7));
            assert!(out[1].is_sentinel());
            assert!(out[2].is_sentinel());
            assert_eq!(out[1].payload, 0);
            assert_eq!(out[2].score(), NEG_INF);
        }
    }

    #[test]
    fn first_seen_wins_ties() {
        // three candidates with the same cost; only the first two survive
        let input = vec![(1.0, 10), (0.0, 11), (1.0, 12), (1.0, 13)];
        for out in all_strategies(3, &input) {
            let payloads: Vec<usize> = out.iter().map(|c| c.payload).collect();
            assert_eq!(payloads, vec![11, 10, 12]);
        }
        for out in all_strategies(1, &[(3.0, 1), (3.0, 2)]) {
            assert_eq!(out[0].payload, 1);
        }
    }

    #[test]
    fn signed_zeros_are_ties() {
        let input = vec![(-0.0, 1), (0.0, 2)];
        for out in all_strategies(1, &input) {
            assert_eq!(out[0].payload, 1);
        }
        let input = vec![(0.0, 1), (-0.0, 2)];
        for out in all_strategies(1, &input) {
            assert_eq!(out[0].payload, 1);
        }
    }

    #[test_case(1, 0 ; "nbest 1")]
    #[test_case(2, 1 ; "nbest 2")]
    #[test_case(5, 2 ; "nbest 5")]
    #[test_case(20, 3 ; "nbest 20")]
    fn strategies_agree_and_are_permutation_invariant(nbest: usize, seed: u64) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        // small integer costs to get many ties
        let mut input: Vec<(Score, usize)> = (0..200)
            .map(|i| (rng.gen_range(-20..20) as f64, i))
            .collect();
        let outs = all_strategies(nbest, &input);
        assert_eq!(outs[0], outs[1]);
        assert_eq!(outs[0], outs[2]);
        // ascending
        for w in outs[0].windows(2) {
            assert!(w[0].cost <= w[1].cost);
        }

        let costs = |out: &[Candidate]| out.iter().map(|c| c.cost).collect::<Vec<_>>();
        let expected = costs(&outs[0]);
        for _ in 0..5 {
            input.shuffle(&mut rng);
            for out in all_strategies(nbest, &input) {
                assert_eq!(costs(&out), expected);
            }
        }
    }

    #[test]
    fn reuse_after_drain() {
        let mut s = FixedLenList::new(2);
        s.push(1.0, 1);
        s.push(0.5, 2);
        let mut out = Vec::new();
        s.drain_sorted(&mut out);
        assert_eq!(out.len(), 2);
        s.push(9.0, 3);
        assert_eq!(
            s.drain_ranked(),
            vec![Candidate::new(9.0, 3), Candidate::SENTINEL]
        );
    }
}
