#![warn(missing_docs)]

//! Bounding volume hierarchy for the polymesh kernel.
//!
//! Anything that can report bounds, area and a precise containment test can
//! implement [`BvhItem`] and be indexed. The tree answers plane crossing,
//! point proximity, region and containment queries; the slicer uses the
//! plane query to select candidate faces on large meshes.
//!
//! # Architecture
//!
//! - [`item`] - the [`BvhItem`] contract and [`AxisComparator`]
//! - [`primitives`] - triangle, box and sphere leaves
//! - [`proxy`] - transformed instances of shared items
//! - [`node`] - interior nodes
//! - [`build`] - median and SAH construction
//! - [`tree`] - the [`Bvh`] wrapper with validated queries
//!
//! # Example
//!
//! ```
//! use polymesh_bvh::{BuildStrategy, Bvh};
//! use polymesh_math::{Mesh, Plane};
//!
//! let bvh = Bvh::from_mesh(&Mesh::unit_cube(), BuildStrategy::Median).unwrap();
//! let faces = bvh.crossing(&Plane::horizontal(0.5));
//! assert_eq!(faces.len(), 8);
//! ```

pub mod build;
pub mod error;
pub mod item;
pub mod node;
pub mod primitives;
pub mod proxy;
pub mod tree;

pub use build::{BuildStrategy, MAX_LEAF_ITEMS};
pub use error::{BvhError, Result};
pub use item::{AsBvhItem, AxisComparator, BvhItem};
pub use node::BvhNode;
pub use primitives::{BoxItem, SphereItem, TriangleItem};
pub use proxy::TransformProxy;
pub use tree::{Bvh, BvhIter};
