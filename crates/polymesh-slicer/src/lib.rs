#![warn(missing_docs)]

//! Plane slicing and polygon stitching for triangle meshes.
//!
//! A mesh is cut by a plane face by face, producing unordered directed
//! segments in the plane's 2D frame. The stitcher rebuilds closed loops from
//! those segments, bridging small gaps left by non-manifold input.
//!
//! # Example
//!
//! ```
//! use polymesh_math::{Mesh, Plane};
//! use polymesh_slicer::{slice, SliceSettings};
//!
//! let settings = SliceSettings {
//!     min_perimeter: 1.0,
//!     ..Default::default()
//! };
//! let polygons = slice(&Mesh::unit_cube(), &Plane::horizontal(0.5), &settings).unwrap();
//! assert_eq!(polygons.len(), 1);
//! assert!((polygons[0].perimeter() - 4.0).abs() < 1e-9);
//! ```

pub mod cut;
pub mod error;
pub mod frame;
pub mod path;
pub mod slice;
pub mod stitch;

pub use cut::{
    cut_face, cut_faces, cut_mesh, CutResult, DegenerateFace, FaceCut, Segment, SkippedFaces,
};
pub use error::{Result, SlicerError};
pub use frame::SliceFrame;
pub use path::Polygon;
pub use slice::{
    cross_section, cross_section_indexed, generate_layer_heights, mesh_bounds,
    polygon_loops_at_z0, slice, slice_layers, slice_many, CrossSection, SliceLayer, SliceStats,
};
pub use stitch::{stitch, PointKey, StitchStats, Stitched};

use serde::{Deserialize, Serialize};

/// Distance within which a vertex counts as lying on the cutting plane.
pub const DEFAULT_PLANE_TOLERANCE: f64 = 1e-10;

/// Cell size of the grid endpoints are snapped to before matching.
pub const DEFAULT_GRID_RESOLUTION: f64 = 1e-6;

/// Closed loops shorter than this are discarded as stitching artifacts.
pub const DEFAULT_MIN_PERIMETER: f64 = 1000.0;

/// Slicing parameters, in mesh units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Vertices within this distance of the plane are on it.
    pub plane_tolerance: f64,
    /// Endpoint quantization grid.
    pub grid_resolution: f64,
    /// Minimum perimeter of an emitted loop.
    pub min_perimeter: f64,
    /// Largest gap the stitcher will bridge; `None` bridges any gap.
    pub max_gap: Option<f64>,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            plane_tolerance: DEFAULT_PLANE_TOLERANCE,
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            min_perimeter: DEFAULT_MIN_PERIMETER,
            max_gap: None,
        }
    }
}

impl SliceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.plane_tolerance.is_finite() || self.plane_tolerance < 0.0 {
            return Err(SlicerError::InvalidSettings(
                "plane_tolerance must be finite and non-negative".into(),
            ));
        }
        if !self.grid_resolution.is_finite() || self.grid_resolution <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "grid_resolution must be positive".into(),
            ));
        }
        if !self.min_perimeter.is_finite() || self.min_perimeter < 0.0 {
            return Err(SlicerError::InvalidSettings(
                "min_perimeter must be finite and non-negative".into(),
            ));
        }
        if let Some(gap) = self.max_gap {
            if gap.is_nan() || gap < 0.0 {
                return Err(SlicerError::InvalidSettings(
                    "max_gap must be non-negative".into(),
                ));
            }
        }
        Ok(())
    }
}
