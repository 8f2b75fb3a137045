//! Oriented planes in Hessian normal form.

use serde::{Deserialize, Serialize};

use crate::{Dir3, Point3, Transform, Vec3};

/// A plane given by a unit normal and its signed distance from the origin.
///
/// Points `p` on the plane satisfy `normal · p == distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: Dir3,
    /// Signed distance from the origin, measured along `normal`.
    pub distance: f64,
}

impl Plane {
    /// Create a plane from a (not necessarily normalized) normal and a distance.
    ///
    /// Returns `None` for a zero or non-finite normal, or a non-finite distance.
    pub fn new(normal: Vec3, distance: f64) -> Option<Self> {
        if !distance.is_finite() || !normal.iter().all(|c| c.is_finite()) {
            return None;
        }
        let normal = Dir3::try_new(normal, f64::EPSILON)?;
        Some(Self { normal, distance })
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: &Point3, normal: Vec3) -> Option<Self> {
        let unit = Dir3::try_new(normal, f64::EPSILON)?;
        Self::new(unit.into_inner(), unit.dot(&point.coords))
    }

    /// The horizontal plane `z = height`.
    pub fn horizontal(height: f64) -> Self {
        Self {
            normal: Vec3::z_axis(),
            distance: height,
        }
    }

    /// Signed distance from `point` to the plane (positive on the normal side).
    #[inline]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    /// The point of the plane closest to the origin.
    pub fn point_on_plane(&self) -> Point3 {
        Point3::from(self.normal.into_inner() * self.distance)
    }

    /// Map this plane through an affine transform.
    ///
    /// Returns `None` if the transform is singular.
    pub fn transformed(&self, transform: &Transform) -> Option<Self> {
        let normal = transform.apply_normal(&self.normal)?;
        let anchor = transform.apply_point(&self.point_on_plane());
        Self::from_point_normal(&anchor, normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_normalizes() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 2.0), 3.0).unwrap();
        assert_relative_eq!(plane.normal.into_inner(), Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&Point3::new(5.0, 5.0, 4.0)), 1.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Plane::new(Vec3::zeros(), 1.0).is_none());
        assert!(Plane::new(Vec3::z(), f64::NAN).is_none());
        assert!(Plane::new(Vec3::new(f64::INFINITY, 0.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_from_point_normal() {
        let plane = Plane::from_point_normal(&Point3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 0.0))
            .unwrap();
        assert_relative_eq!(plane.distance, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            plane.signed_distance(&Point3::new(1.0, 1.0, 9.0)),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_transformed_by_translation() {
        let plane = Plane::horizontal(1.0);
        let moved = plane.transformed(&Transform::translation(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(moved.distance, 3.0, epsilon = 1e-12);
        assert_relative_eq!(moved.normal.into_inner(), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_transformed_by_rotation() {
        // Rotating z=1 a quarter turn about X gives the plane y=-1 with normal -Y.
        let rot = Transform::rotation_x(std::f64::consts::FRAC_PI_2);
        let plane = Plane::horizontal(1.0).transformed(&rot).unwrap();
        assert_relative_eq!(plane.normal.into_inner(), -Vec3::y(), epsilon = 1e-12);
        assert_relative_eq!(plane.distance, 1.0, epsilon = 1e-12);
    }
}
