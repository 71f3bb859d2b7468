//!
//! N-best segmental Viterbi decoding of segment models
//!
//! A segment model is a set of hidden states whose transitions may span
//! several time steps. The score of a transition is its weight plus the
//! values of piecewise-linear penalty functions of the span length (or of
//! word-based SVM outputs over the span). `decode` returns the `nbest`
//! highest-scoring paths through the candidate boundaries of a sequence.
//!
pub mod accumulator;
pub mod common;
pub mod decode;
pub mod error;
pub mod input;
pub mod kmer;
pub mod mocks;
pub mod model;
pub mod orf;
pub mod params;
pub mod plif;
pub mod random_seq;
pub mod select;
pub mod trellis;
pub mod utils;

pub use decode::{decode, decode_with, Decoded, Decoder, Path};
pub use error::DecodeError;
pub use input::DecodeInput;
pub use model::{ModelSpec, SegmentModel, StateNode, TransEdge};
pub use params::DecodeParams;
pub use plif::{Penalty, Plif};
