//!
//! Small models and inputs for tests and benchmarks
//!
use crate::common::{sequence_to_string, Pos, NEG_INF, UNOBSERVABLE};
use crate::input::DecodeInput;
use crate::kmer::WordConfig;
use crate::model::{SegmentModel, StateNode, TransEdge};
use crate::plif::Plif;
use crate::random_seq;
use ndarray::{array, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn state(name: &str, init_score: f64, final_score: f64) -> StateNode {
    StateNode::new(name.to_string(), init_score, final_score)
}

///
/// Three fully connected states `S0, S1, S2` on two time steps.
///
/// Only `S0` is observable at the first step. At the second step `S1` and
/// `S2` tie with score 0, so the best path is `S0 -> S1`.
///
pub fn mock_three_state() -> (SegmentModel, DecodeInput) {
    let mut model = SegmentModel::new(vec![]);
    let s0 = model.add_state(state("S0", 0.0, 0.0));
    let s1 = model.add_state(state("S1", -5.0, 0.0));
    let s2 = model.add_state(state("S2", -5.0, 0.0));
    for &i in &[s0, s1, s2] {
        for &j in &[s0, s1, s2] {
            model.add_transition(i, j, TransEdge::new(0.0, vec![]));
        }
    }
    let emissions = array![[0.0, -100.0], [-100.0, 0.0], [-100.0, 0.0]];
    (model, DecodeInput::new(emissions, vec![0, 1]))
}

///
/// Two states `A, B` on three time steps 10 apart. Every transition
/// carries a zero penalty function allowing only single steps.
///
/// The two best paths are `A B B` (score -1) and `A A B` (score -2).
///
pub fn mock_two_state_steps() -> (SegmentModel, DecodeInput) {
    let mut model = SegmentModel::new(vec![Plif::constant(0, "step", 0.0, 0, 10)]);
    let a = model.add_state(state("A", 0.0, 0.0));
    let b = model.add_state(state("B", -1.0, 0.0));
    model.add_transition(a, a, TransEdge::new(0.0, vec![0]));
    model.add_transition(a, b, TransEdge::new(-0.5, vec![0]));
    model.add_transition(b, a, TransEdge::new(-0.25, vec![0]));
    model.add_transition(b, b, TransEdge::new(0.0, vec![0]));
    let emissions = array![[0.0, -1.0, -2.0], [-1.0, 0.0, -0.5]];
    (model, DecodeInput::new(emissions, vec![0, 10, 20]))
}

///
/// Two states `A, B` on three time steps 10 apart, where `A -> B` is only
/// allowed as a jump over the middle step, with bonus 2.
///
/// The best path is `A(0) -> B(2)` with score 2.
///
pub fn mock_long_jump() -> (SegmentModel, DecodeInput) {
    let mut model = SegmentModel::new(vec![
        Plif::constant(0, "step", 0.0, 0, 10),
        Plif::constant(1, "jump", 2.0, 20, 20),
    ]);
    let a = model.add_state(state("A", 0.0, 0.0));
    let b = model.add_state(state("B", -1.0, 0.0));
    model.add_transition(a, a, TransEdge::new(0.0, vec![0]));
    model.add_transition(a, b, TransEdge::new(0.0, vec![1]));
    model.add_transition(b, b, TransEdge::new(0.0, vec![0]));
    let emissions = Array2::zeros((2, 3));
    (model, DecodeInput::new(emissions, vec![0, 10, 20]))
}

/// sequence of `mock_orf` with a single stop codon `taa` at 6
pub const ORF_SEQUENCE: &str = "cccaaataagggccc";

///
/// Intergenic `N`, exon start `S` and exon end `E` on two time steps at
/// positions `0` and `end`, over `ORF_SEQUENCE`.
///
/// `S -> E` is ORF-constrained; every other path costs -10.
///
pub fn mock_orf(end: Pos) -> (SegmentModel, DecodeInput) {
    let mut model = SegmentModel::new(vec![]);
    let n = model.add_state(state("N", -10.0, 0.0));
    let s = model.add_state(state("S", 0.0, 0.0).with_orf(Some(0), None));
    let e = model.add_state(state("E", -10.0, 0.0).with_orf(None, Some(0)));
    model.add_transition(n, n, TransEdge::new(0.0, vec![]));
    model.add_transition(n, s, TransEdge::new(0.0, vec![]));
    model.add_transition(s, e, TransEdge::new(0.0, vec![]));
    model.add_transition(e, n, TransEdge::new(0.0, vec![]));
    let emissions = array![[0.0, 0.0], [0.0, UNOBSERVABLE], [0.0, 0.0]];
    let input = DecodeInput::new(emissions, vec![0, end]).with_sequence(ORF_SEQUENCE);
    (model, input)
}

/// penalty ids of `mock_gene`
pub const GENE_PENALTIES: [&str; 4] = ["intergenic_len", "exon_len", "exon_svm", "short"];

///
/// Gene-like model on a random sequence of `len` bases with a time step on
/// every base.
///
/// * `inter` (0): intergenic, with a length penalty
/// * `start` (1): exon start, observable only on `atg`
/// * `stop` (2): exon end. `start -> stop` is ORF-constrained and scored by
///   the exon length and the first SVM output.
///
/// Emissions, segment weights and the SVM dictionary are random.
///
pub fn mock_gene(len: usize, seed: u64) -> (SegmentModel, DecodeInput) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let seq = random_seq::generate_with(len, &mut rng);

    let mut model = SegmentModel::new(vec![
        Plif::new(
            0,
            GENE_PENALTIES[0],
            vec![1.0, 10.0, 60.0],
            vec![-0.1, -0.5, -2.0],
            60,
        )
        .with_cache(),
        Plif::new(
            1,
            GENE_PENALTIES[1],
            vec![3.0, 30.0, 90.0],
            vec![-1.0, 0.0, -1.0],
            90,
        )
        .with_min_len(3)
        .with_cache(),
        Plif::new(2, GENE_PENALTIES[2], vec![-1.0, 1.0], vec![-1.0, 1.0], 90).with_svm(0),
        Plif::constant(3, GENE_PENALTIES[3], 0.0, 0, 3).with_cache(),
    ]);
    let inter = model.add_state(state("inter", 0.0, 0.0));
    let start = model.add_state(state("start", -5.0, NEG_INF).with_orf(Some(0), None));
    let stop = model.add_state(state("stop", NEG_INF, 0.0).with_orf(None, Some(0)));
    model.add_transition(inter, inter, TransEdge::new(0.0, vec![0]));
    model.add_transition(inter, start, TransEdge::new(-1.0, vec![3]));
    model.add_transition(start, stop, TransEdge::new(0.0, vec![1, 2]));
    model.add_transition(stop, inter, TransEdge::new(-0.5, vec![3]));

    let mut emissions = Array2::zeros((3, len));
    for t in 0..len {
        emissions[[inter.index(), t]] = rng.gen_range(-1.0..0.0);
        emissions[[start.index(), t]] = if seq[t..].starts_with(b"atg") {
            0.5
        } else {
            UNOBSERVABLE
        };
        emissions[[stop.index(), t]] = rng.gen_range(-1.0..0.5);
    }
    let segment_weights = Array2::from_shape_fn((len, 3), |_| rng.gen_range(-0.01..0.01));
    let word_config = WordConfig::default();
    let dictionary = (0..word_config.total_vocab())
        .map(|_| rng.gen_range(-0.1..0.1))
        .collect();

    let positions = (0..len as Pos).collect();
    let input = DecodeInput::new(emissions, positions)
        .with_sequence(sequence_to_string(&seq))
        .with_dictionary(word_config, 1, dictionary)
        .with_segment_weights(segment_weights);
    (model, input)
}

//
// tests
//
