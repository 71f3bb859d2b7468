//!
//! Parameters of the decoding
//!
use crate::common::Pos;
use serde::{Deserialize, Serialize};

/// `nbest` must be smaller than this to keep the predecessor encoding valid
pub const MAX_NBEST: usize = 32000;

/// lower bound of the global look-back bound
pub const DEFAULT_LOOK_BACK: Pos = 30000;

///
/// DecodeParams
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    ///
    /// number of paths kept per trellis cell and reported
    pub nbest: usize,
    ///
    /// scan for stop codons on ORF-constrained transitions.
    /// The frame-consistency check applies regardless of this flag.
    pub use_orf: bool,
    ///
    /// lower bound (in positions) of the global look-back bound, which is
    /// also the bound of transitions without penalty
    pub default_look_back: Pos,
    ///
    /// fill the states of each time step in parallel
    pub parallel: bool,
    ///
    /// refuse to allocate a trellis larger than this (in MB)
    pub max_trellis_mb: Option<usize>,
    ///
    /// compute the per-edge decomposition of the path scores
    pub decompose: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        DecodeParams {
            nbest: 1,
            use_orf: true,
            default_look_back: DEFAULT_LOOK_BACK,
            parallel: false,
            max_trellis_mb: None,
            decompose: true,
        }
    }
}

impl DecodeParams {
    pub fn new(nbest: usize) -> Self {
        DecodeParams {
            nbest,
            ..Default::default()
        }
    }
    ///
    /// # Panics
    ///
    /// Panics if `nbest` is 0 or not smaller than `MAX_NBEST`.
    ///
    pub fn validate(&self) {
        assert!(self.nbest > 0, "nbest must be positive");
        assert!(
            self.nbest < MAX_NBEST,
            "nbest={} is too large for the predecessor encoding (must be < {})",
            self.nbest,
            MAX_NBEST
        );
        assert!(self.default_look_back >= 0);
    }
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn with_use_orf(mut self, use_orf: bool) -> Self {
        self.use_orf = use_orf;
        self
    }
    pub fn with_default_look_back(mut self, look_back: Pos) -> Self {
        self.default_look_back = look_back;
        self
    }
    pub fn with_max_trellis_mb(mut self, mb: usize) -> Self {
        self.max_trellis_mb = Some(mb);
        self
    }
    pub fn to_json_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_with_defaults() {
        let p: DecodeParams = serde_json::from_str(r#"{"nbest": 3, "parallel": true}"#).unwrap();
        assert_eq!(p.nbest, 3);
        assert!(p.parallel);
        assert!(p.use_orf);
        assert_eq!(p.default_look_back, DEFAULT_LOOK_BACK);
        assert_eq!(p.max_trellis_mb, None);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let p = DecodeParams::new(5).with_max_trellis_mb(100).with_use_orf(false);
        p.to_json_file(&path).unwrap();
        assert_eq!(DecodeParams::from_json_file(&path).unwrap(), p);
    }

    #[test]
    #[should_panic]
    fn nbest_over_capacity() {
        DecodeParams::new(MAX_NBEST).validate();
    }

    #[test]
    #[should_panic]
    fn nbest_zero() {
        DecodeParams::new(0).validate();
    }
}
