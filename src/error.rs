//!
//! Recoverable errors of the decoding
//!
//! Malformed models (one-sided ORF metadata, out-of-vocabulary words,
//! `nbest` over capacity, shape mismatches) are not errors but panics.
//!
use std::collections::TryReserveError;
use std::fmt::{self, Debug, Display};

pub enum DecodeError {
    /// the trellis could not be allocated
    Allocation {
        n_cells: usize,
        source: TryReserveError,
    },
    /// the trellis would exceed the configured limit (in MB)
    TooLarge { required_mb: usize, limit_mb: usize },
    /// the cancellation flag was raised before time step `t`
    Cancelled { t: usize },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::Allocation { n_cells, source } => write!(
                f,
                "Failed to allocate trellis of {} cells: {}",
                n_cells, source
            ),
            DecodeError::TooLarge {
                required_mb,
                limit_mb,
            } => write!(
                f,
                "Trellis too large: requires {} MB, limit is {} MB",
                required_mb, limit_mb
            ),
            DecodeError::Cancelled { t } => write!(f, "Decoding cancelled at time step {}", t),
        }
    }
}

impl Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Allocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = DecodeError::TooLarge {
            required_mb: 120,
            limit_mb: 100,
        };
        assert_eq!(
            e.to_string(),
            "Trellis too large: requires 120 MB, limit is 100 MB"
        );
        let e = DecodeError::Cancelled { t: 3 };
        assert_eq!(format!("{:?}", e), "Decoding cancelled at time step 3");
    }

    #[test]
    fn allocation_error_has_source() {
        let mut v: Vec<u64> = Vec::new();
        let source = v.try_reserve_exact(usize::MAX).unwrap_err();
        let e = DecodeError::Allocation { n_cells: 1, source };
        assert!(std::error::Error::source(&e).is_some());
    }
}
