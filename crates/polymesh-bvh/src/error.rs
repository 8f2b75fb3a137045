//! Error types for spatial index construction and queries.

use polymesh_math::MeshIndexError;
use thiserror::Error;

/// Errors raised by malformed spatial queries or tree input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    /// A hierarchy needs at least one item.
    #[error("cannot build a hierarchy from zero items")]
    NoItems,

    /// Query region has non-finite coordinates or `min > max` on some axis.
    #[error("ill-formed query region: min {min:?}, max {max:?}")]
    InvalidRegion {
        /// Minimum corner as given.
        min: [f64; 3],
        /// Maximum corner as given.
        max: [f64; 3],
    },

    /// Touch tolerance is negative or not finite.
    #[error("invalid touch tolerance: {0}")]
    InvalidTolerance(f64),

    /// Query point has a non-finite coordinate.
    #[error("query point is not finite: {0:?}")]
    InvalidPoint([f64; 3]),

    /// Mesh face references a missing vertex.
    #[error(transparent)]
    InvalidFace(#[from] MeshIndexError),
}

/// Result type for spatial index operations.
pub type Result<T> = std::result::Result<T, BvhError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BvhError::InvalidTolerance(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = BvhError::from(MeshIndexError {
            face: 2,
            index: 9,
            vertex_count: 3,
        });
        assert!(err.to_string().starts_with("face 2"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BvhError>();
    }
}
