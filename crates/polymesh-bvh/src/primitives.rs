//! Leaf items: mesh triangles and solid primitives.

use polymesh_math::{Aabb3, Mesh, Point3, Vec3};

use crate::error::Result;
use crate::item::BvhItem;

/// One face of a triangle mesh.
#[derive(Debug, Clone)]
pub struct TriangleItem {
    face: usize,
    vertices: [Point3; 3],
    aabb: Aabb3,
    center: Point3,
}

impl TriangleItem {
    /// Leaf for face `face` with the given corner positions.
    pub fn new(face: usize, vertices: [Point3; 3]) -> Self {
        let aabb = Aabb3::from_points(vertices.iter());
        Self {
            face,
            vertices,
            aabb,
            center: aabb.center(),
        }
    }

    /// One leaf per mesh face, in face order.
    pub fn from_mesh(mesh: &Mesh) -> Result<Vec<Self>> {
        mesh.validate()?;
        Ok(mesh
            .faces
            .iter()
            .enumerate()
            .map(|(face, &[a, b, c])| {
                Self::new(face, [mesh.vertices[a], mesh.vertices[b], mesh.vertices[c]])
            })
            .collect())
    }

    /// Index of the face in its source mesh.
    pub fn face(&self) -> usize {
        self.face
    }

    /// Corner positions.
    pub fn vertices(&self) -> &[Point3; 3] {
        &self.vertices
    }
}

impl BvhItem for TriangleItem {
    fn bounding_box(&self) -> Aabb3 {
        self.aabb
    }

    fn surface_area(&self) -> f64 {
        let [a, b, c] = &self.vertices;
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    // A triangle encloses no volume.
    fn contains(&self, _point: &Point3) -> bool {
        false
    }

    fn center(&self) -> Point3 {
        self.center
    }
}

/// A solid axis-aligned box.
#[derive(Debug, Clone)]
pub struct BoxItem {
    aabb: Aabb3,
}

impl BoxItem {
    /// Solid box spanning `aabb`.
    pub fn new(aabb: Aabb3) -> Self {
        Self { aabb }
    }
}

impl BvhItem for BoxItem {
    fn bounding_box(&self) -> Aabb3 {
        self.aabb
    }

    fn surface_area(&self) -> f64 {
        self.aabb.surface_area()
    }

    fn contains(&self, point: &Point3) -> bool {
        self.aabb.contains_point(point)
    }
}

/// A solid sphere, described implicitly by center and radius.
#[derive(Debug, Clone)]
pub struct SphereItem {
    center: Point3,
    radius: f64,
}

impl SphereItem {
    /// Sphere of `radius` around `center`. Negative radii are clamped to zero.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl BvhItem for SphereItem {
    fn bounding_box(&self) -> Aabb3 {
        let r = Vec3::repeat(self.radius);
        Aabb3::new(self.center - r, self.center + r)
    }

    fn surface_area(&self) -> f64 {
        4.0 * std::f64::consts::PI * self.radius * self.radius
    }

    fn contains(&self, point: &Point3) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }

    fn center(&self) -> Point3 {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polymesh_math::{MeshIndexError, Plane};

    #[test]
    fn test_triangle_item() {
        let tri = TriangleItem::new(
            7,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 1.0),
            ],
        );
        assert_eq!(tri.face(), 7);
        assert_relative_eq!(tri.surface_area(), 0.5 * 2.0 * 5.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(tri.axis_center(2), 0.5);
        assert!(!tri.contains(&Point3::new(0.1, 0.1, 0.0)));
        assert_eq!(tri.crossing(&Plane::horizontal(0.5)).len(), 1);
    }

    #[test]
    fn test_triangles_from_mesh() {
        let mesh = Mesh::unit_cube();
        let items = TriangleItem::from_mesh(&mesh).unwrap();
        assert_eq!(items.len(), 12);
        let total: f64 = items.iter().map(BvhItem::surface_area).sum();
        assert_relative_eq!(total, 6.0, epsilon = 1e-12);

        let broken = Mesh::new(vec![Point3::origin()], vec![[0, 0, 1]]);
        let err = TriangleItem::from_mesh(&broken).unwrap_err();
        assert_eq!(
            err,
            crate::BvhError::InvalidFace(MeshIndexError {
                face: 0,
                index: 1,
                vertex_count: 1
            })
        );
    }

    #[test]
    fn test_box_item() {
        let item = BoxItem::new(Aabb3::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0)));
        assert!(item.contains(&Point3::new(2.0, 0.5, 0.5)));
        assert!(!item.contains(&Point3::new(2.1, 0.5, 0.5)));
        assert_relative_eq!(item.surface_area(), 10.0);
        assert_relative_eq!(item.center(), Point3::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn test_sphere_item() {
        let sphere = SphereItem::new(Point3::new(1.0, 1.0, 1.0), 2.0);
        assert!(sphere.contains(&Point3::new(2.0, 2.0, 1.0)));
        // Inside the bounds but outside the sphere
        assert!(!sphere.contains(&Point3::new(2.9, 2.9, 2.9)));
        assert!(sphere.bounding_box().contains_point(&Point3::new(2.9, 2.9, 2.9)));
        assert_relative_eq!(sphere.surface_area(), 16.0 * std::f64::consts::PI);
        assert_eq!(SphereItem::new(Point3::origin(), -1.0).radius(), 0.0);
    }
}
