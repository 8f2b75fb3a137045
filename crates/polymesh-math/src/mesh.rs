//! Indexed triangle meshes.
//!
//! The kernel only ever reads meshes; placement and editing happen in the
//! caller before a mesh is handed to the slicer or the spatial index.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Aabb3, Point3, Vec3};

/// A face refers to a vertex that does not exist.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
pub struct MeshIndexError {
    /// Offending face.
    pub face: usize,
    /// Out-of-range vertex index.
    pub index: usize,
    /// Number of vertices in the mesh.
    pub vertex_count: usize,
}

/// Triangle mesh: vertex positions plus faces as vertex index triples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangles as indices into `vertices`, wound counter-clockwise when
    /// seen from outside.
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Create a mesh from vertices and faces.
    pub fn new(vertices: Vec<Point3>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Vertex positions of a face, or `None` if the face or one of its
    /// vertices is out of range.
    pub fn triangle(&self, face: usize) -> Option<[Point3; 3]> {
        let [a, b, c] = *self.faces.get(face)?;
        Some([
            *self.vertices.get(a)?,
            *self.vertices.get(b)?,
            *self.vertices.get(c)?,
        ])
    }

    /// Check every face index against the vertex list.
    pub fn validate(&self) -> Result<(), MeshIndexError> {
        let vertex_count = self.vertices.len();
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshIndexError {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Bounds of all vertices, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb3> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(Aabb3::from_points(&self.vertices))
    }

    /// Append another mesh, re-indexing its faces.
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| f.map(|i| i + offset)));
    }

    /// Axis-aligned box with corner `min` and edge lengths `size`.
    pub fn cuboid(min: Point3, size: Vec3) -> Self {
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (min.x + size.x, min.y + size.y, min.z + size.z);
        let vertices = vec![
            Point3::new(x0, y0, z0),
            Point3::new(x1, y0, z0),
            Point3::new(x1, y1, z0),
            Point3::new(x0, y1, z0),
            Point3::new(x0, y0, z1),
            Point3::new(x1, y0, z1),
            Point3::new(x1, y1, z1),
            Point3::new(x0, y1, z1),
        ];
        let faces = vec![
            // Bottom
            [0, 2, 1],
            [0, 3, 2],
            // Top
            [4, 5, 6],
            [4, 6, 7],
            // Front
            [0, 1, 5],
            [0, 5, 4],
            // Back
            [2, 3, 7],
            [2, 7, 6],
            // Left
            [0, 4, 7],
            [0, 7, 3],
            // Right
            [1, 2, 6],
            [1, 6, 5],
        ];
        Self { vertices, faces }
    }

    /// Cube of edge `size` with its minimum corner at `min`.
    pub fn cube(min: Point3, size: f64) -> Self {
        Self::cuboid(min, Vec3::repeat(size))
    }

    /// The unit cube `[0, 1]^3`.
    pub fn unit_cube() -> Self {
        Self::cube(Point3::origin(), 1.0)
    }
}
