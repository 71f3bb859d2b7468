//!
//! Decomposition of path scores by penalty function
//!
//! For the i-th edge `(from_state, from_t) -> (to_state, to_t)` of a path,
//! bucket `id` holds the sum of the penalty functions with that id, and the
//! last bucket holds the emission of `to_state` at `to_t` plus its segment
//! sum. The input values of the penalty functions are kept in a parallel
//! table.
//!
use super::Decoder;
use super::Path;
use crate::accumulator::WindowAccumulator;
use crate::plif::Penalty;
use ndarray::Array2;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// `[edge, bucket]`
    pub values: Array2<f64>,
    /// `[edge, bucket]`
    pub input_values: Array2<f64>,
}

impl Decomposition {
    /// the number of buckets including the emission bucket
    pub fn n_buckets(&self) -> usize {
        self.values.ncols()
    }
    /// index of the bucket of emission and segment sum
    pub fn emission_bucket(&self) -> usize {
        self.n_buckets() - 1
    }
    /// the number of edges
    pub fn n_edges(&self) -> usize {
        self.values.nrows()
    }
    /// sum over the edges of the bucket
    pub fn bucket_total(&self, bucket: usize) -> f64 {
        self.values.column(bucket).sum()
    }
    /// sum over all edges and buckets
    pub fn total(&self) -> f64 {
        self.values.sum()
    }
}

impl<'a, P: Penalty> Decoder<'a, P> {
    ///
    /// Decompose the score of each edge of the path.
    ///
    /// Parallel transitions between the same pair of states are decomposed
    /// with the first one.
    ///
    pub fn decompose(&self, path: &Path) -> Decomposition {
        let n_ids = self.model.n_penalty_ids();
        let n_edges = path.len().saturating_sub(1);
        let mut values = Array2::zeros((n_edges, n_ids + 1));
        let mut input_values = Array2::zeros((n_edges, n_ids + 1));

        let (mut svm, mut segment) = self.accumulators();
        let mut svm_values = vec![0.0; self.input.n_svms];
        let positions = &self.input.positions;

        for (e, ((from_state, from_t), (to_state, to_t))) in path.edges().enumerate() {
            let left = positions[from_t];
            let end = positions[to_t];
            if let Some(svm) = svm.as_mut() {
                svm.reset(end);
                svm.extend_left(left);
                svm.fill_values(&mut svm_values);
            }
            let segment_sum = match segment.as_mut() {
                Some(segment) => {
                    segment.reset(end);
                    segment.extend_left(left);
                    segment.value(to_state)
                }
                None => 0.0,
            };
            values[[e, n_ids]] = self.input.emissions[[to_state, to_t]] + segment_sum;

            if let Some(edge) = self.model.transition(from_state, to_state) {
                for &index in edge.penalties.iter() {
                    let p = &self.model.penalties[index];
                    let (value, input) = p.lookup(end - left, &svm_values);
                    values[[e, p.id()]] += value;
                    input_values[[e, p.id()]] += input;
                }
            }
        }

        Decomposition {
            values,
            input_values,
        }
    }
}
