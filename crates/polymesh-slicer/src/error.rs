//! Error types for the slicer.

use polymesh_math::MeshIndexError;
use thiserror::Error;

/// Errors that can occur during slicing.
///
/// Degenerate faces and unmatched fragments are not errors; they are
/// counted in the slice statistics instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlicerError {
    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A face references a vertex that does not exist.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshIndexError),

    /// Plane normal or distance is not finite or the normal is zero.
    #[error("invalid plane: {0}")]
    InvalidPlane(String),

    /// Placement transform cannot be inverted.
    #[error("transform is not invertible")]
    NonInvertibleTransform,

    /// Mesh has no vertices to compute layer bounds from.
    #[error("mesh is empty")]
    EmptyMesh,
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
