//! The 2D frame of a cutting plane.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use polymesh_math::{Plane, Point2, Point3, Vec3};

/// Rigid transform taking mesh space to a frame where the cutting plane is
/// `z = 0` and its normal is `+Z`.
///
/// For the plane `z = h` the frame is a pure translation, so slice
/// coordinates equal mesh XY coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceFrame {
    isometry: Isometry3<f64>,
}

impl SliceFrame {
    /// Frame for `plane`.
    pub fn new(plane: &Plane) -> Self {
        let rotation = UnitQuaternion::rotation_between(&plane.normal.into_inner(), &Vec3::z())
            // Only fails for a normal pointing down -Z
            .unwrap_or_else(|| {
                UnitQuaternion::from_axis_angle(&Vec3::x_axis(), std::f64::consts::PI)
            });
        let translation = Translation3::new(0.0, 0.0, -plane.distance);
        Self {
            isometry: Isometry3::from_parts(translation, rotation),
        }
    }

    /// The underlying mesh-to-frame isometry.
    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }

    /// Map a mesh-space point into the frame; `z` is its signed plane distance.
    pub fn to_frame(&self, p: &Point3) -> Point3 {
        self.isometry.transform_point(p)
    }

    /// Map a mesh-space point into the frame and drop `z`.
    pub fn project(&self, p: &Point3) -> Point2 {
        self.to_frame(p).xy()
    }

    /// Lift a slice point back into mesh space.
    pub fn to_world(&self, p: &Point2) -> Point3 {
        self.isometry
            .inverse_transform_point(&Point3::new(p.x, p.y, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_horizontal_plane_keeps_xy() {
        let frame = SliceFrame::new(&Plane::horizontal(2.0));
        let p = frame.to_frame(&Point3::new(3.0, 4.0, 2.5));
        assert_relative_eq!(p, Point3::new(3.0, 4.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_downward_plane() {
        let plane = Plane::new(-Vec3::z(), 1.0).unwrap(); // z = -1
        let frame = SliceFrame::new(&plane);
        let p = frame.to_frame(&Point3::new(1.0, 2.0, -1.0));
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
        let q = frame.to_frame(&Point3::new(0.0, 0.0, -3.0));
        assert_relative_eq!(q.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oblique_plane_round_trip() {
        let plane = Plane::new(Vec3::new(1.0, -2.0, 0.5), 3.0).unwrap();
        let frame = SliceFrame::new(&plane);
        let on_plane = plane.point_on_plane() + Vec3::new(2.0, 1.0, 0.0);
        assert_relative_eq!(plane.signed_distance(&on_plane), 0.0, epsilon = 1e-12);

        let flat = frame.to_frame(&on_plane);
        assert_relative_eq!(flat.z, 0.0, epsilon = 1e-12);
        let back = frame.to_world(&flat.xy());
        assert_relative_eq!(back, on_plane, epsilon = 1e-12);

        let above = on_plane + plane.normal.into_inner() * 1.5;
        assert_relative_eq!(frame.to_frame(&above).z, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_preserves_distances() {
        let plane = Plane::new(Vec3::new(0.3, 0.4, 0.8), -1.0).unwrap();
        let frame = SliceFrame::new(&plane);
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(-4.0, 0.5, 2.0);
        assert_relative_eq!(
            (frame.to_frame(&a) - frame.to_frame(&b)).norm(),
            (a - b).norm(),
            epsilon = 1e-12
        );
    }
}
