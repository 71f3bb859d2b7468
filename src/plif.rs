//!
//! Penalty functions of transitions
//!
//! `Penalty` is the interface the decoder consumes. `Plif` is a
//! piecewise-linear function of the gap length (or of one SVM output) with
//! an optional input transform.
//!
use crate::common::{Pos, Score, NEG_INF};
use serde::{Deserialize, Serialize};

///
/// Additive penalty term of a transition.
///
/// * `id`: diagnostic bucket of the score decomposition
/// * `max_len`: look-back bound in position units
/// * `uses_svm`: the input is an SVM output instead of the gap length
///
pub trait Penalty: std::fmt::Debug + Send + Sync {
    fn id(&self) -> usize;
    fn name(&self) -> &str;
    fn max_len(&self) -> Pos;
    /// index of the SVM output read by the function, if any
    fn svm_index(&self) -> Option<usize>;
    fn uses_svm(&self) -> bool {
        self.svm_index().is_some()
    }
    ///
    /// Returns `(penalty value, input value)` for a transition spanning
    /// `gap` positions whose window has SVM outputs `svm_values`.
    ///
    /// A transition the function forbids gets `NEG_INF`.
    ///
    fn lookup(&self, gap: Pos, svm_values: &[f64]) -> (Score, f64);
}

///
/// Transform applied to the input value before the piecewise-linear lookup
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "log(+1)")]
    LogPlus1,
    #[serde(rename = "log(+3)")]
    LogPlus3,
    #[serde(rename = "(+3)")]
    LinearPlus3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Linear
    }
}

impl Transform {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Transform::Linear => x,
            Transform::Log => x.ln(),
            Transform::LogPlus1 => (x + 1.0).ln(),
            Transform::LogPlus3 => (x + 3.0).ln(),
            Transform::LinearPlus3 => x + 3.0,
        }
    }
}

///
/// Piecewise-linear function
///
/// `limits` must be non-decreasing and of the same length as `penalties`.
/// The value is linearly interpolated between the limits and clamped to
/// the first/last penalty outside of them.
///
/// A length-based function (`use_svm == None`) forbids gaps outside of
/// `[min_len, max_len]`. An SVM-based one reads `svm_values[use_svm]`.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plif {
    pub id: usize,
    #[serde(default)]
    pub name: String,
    pub limits: Vec<f64>,
    pub penalties: Vec<f64>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub min_len: Pos,
    pub max_len: Pos,
    #[serde(default)]
    pub use_svm: Option<usize>,
    /// precomputed values of gaps `0..=max_len`
    #[serde(skip)]
    cache: Option<Vec<Score>>,
}

impl Plif {
    ///
    /// # Panics
    ///
    /// Panics if `limits` and `penalties` are empty or have different
    /// lengths, or if `limits` is not sorted.
    ///
    pub fn new(id: usize, name: &str, limits: Vec<f64>, penalties: Vec<f64>, max_len: Pos) -> Self {
        let plif = Plif {
            id,
            name: name.to_string(),
            limits,
            penalties,
            transform: Transform::Linear,
            min_len: 0,
            max_len,
            use_svm: None,
            cache: None,
        };
        plif.validate();
        plif
    }
    ///
    /// Constant function `value` over `[min_len, max_len]`
    ///
    pub fn constant(id: usize, name: &str, value: f64, min_len: Pos, max_len: Pos) -> Self {
        Plif::new(id, name, vec![0.0], vec![value], max_len).with_min_len(min_len)
    }
    pub fn with_min_len(mut self, min_len: Pos) -> Self {
        self.min_len = min_len;
        self.cache = None;
        self
    }
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self.cache = None;
        self
    }
    ///
    /// Use the `svm`-th SVM output as the input value.
    ///
    pub fn with_svm(mut self, svm: usize) -> Self {
        self.use_svm = Some(svm);
        self.cache = None;
        self
    }
    ///
    /// Precompute the values of all gaps in `0..=max_len`.
    /// SVM-based functions are not cached.
    ///
    pub fn with_cache(mut self) -> Self {
        self.init_cache();
        self
    }
    pub fn init_cache(&mut self) {
        self.cache = None;
        if self.use_svm.is_some() || self.max_len < 0 {
            return;
        }
        let cache = (0..=self.max_len)
            .map(|gap| {
                if gap < self.min_len {
                    NEG_INF
                } else {
                    self.interpolate(self.transform.apply(gap as f64))
                }
            })
            .collect();
        self.cache = Some(cache);
    }
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }
    ///
    /// # Panics
    ///
    /// Panics on malformed limits/penalties.
    ///
    pub fn validate(&self) {
        assert!(
            !self.limits.is_empty(),
            "penalty function {} has no limits",
            self.name
        );
        assert_eq!(
            self.limits.len(),
            self.penalties.len(),
            "penalty function {}: limits and penalties differ in length",
            self.name
        );
        assert!(
            self.limits.windows(2).all(|w| w[0] <= w[1]),
            "penalty function {}: limits are not sorted",
            self.name
        );
    }
    ///
    /// Value of a length-like real input `x`, forbidden (`NEG_INF`) outside
    /// of `[min_len, max_len]`.
    ///
    pub fn lookup_value(&self, x: f64) -> Score {
        if x < self.min_len as f64 || x > self.max_len as f64 {
            NEG_INF
        } else {
            self.interpolate(self.transform.apply(x))
        }
    }
    ///
    /// value at a signal or SVM output `x`, without the length range check
    ///
    pub fn lookup_signal(&self, x: f64) -> Score {
        self.interpolate(self.transform.apply(x))
    }
    ///
    /// piecewise-linear interpolation of the transformed value `x`
    ///
    pub fn interpolate(&self, x: f64) -> f64 {
        let len = self.limits.len();
        let idx = self.limits.iter().filter(|&&l| l <= x).count();
        if idx == 0 {
            self.penalties[0]
        } else if idx == len {
            self.penalties[len - 1]
        } else {
            let (l0, l1) = (self.limits[idx - 1], self.limits[idx]);
            let (p0, p1) = (self.penalties[idx - 1], self.penalties[idx]);
            (p1 * (x - l0) + p0 * (l1 - x)) / (l1 - l0)
        }
    }
}

impl Penalty for Plif {
    fn id(&self) -> usize {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn max_len(&self) -> Pos {
        self.max_len
    }
    fn svm_index(&self) -> Option<usize> {
        self.use_svm
    }
    fn lookup(&self, gap: Pos, svm_values: &[f64]) -> (Score, f64) {
        match self.use_svm {
            Some(svm) => {
                let input = svm_values[svm];
                (self.lookup_signal(input), input)
            }
            None => {
                let input = gap as f64;
                let value = match &self.cache {
                    Some(cache) if gap >= self.min_len.max(0) && gap <= self.max_len => {
                        cache[gap as usize]
                    }
                    _ => self.lookup_value(input),
                };
                (value, input)
            }
        }
    }
}

//
// tests
//
