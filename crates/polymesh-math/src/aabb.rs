//! Axis-aligned bounding boxes.
//!
//! Shared by the spatial index (node bounds, pruning) and the slicer
//! (mesh bounds for layer heights).

use serde::{Deserialize, Serialize};

use crate::{Plane, Point3, Transform, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box enclosing all `points`; inverted if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// True when every coordinate is finite and `min <= max` on each axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| {
            self.min[i].is_finite() && self.max[i].is_finite() && self.min[i] <= self.max[i]
        })
    }

    /// Test if two AABBs overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Test whether `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point3) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min -= Vec3::repeat(tol);
        self.max += Vec3::repeat(tol);
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Center coordinate along `axis`, wrapped onto x/y/z.
    pub fn axis_center(&self, axis: usize) -> f64 {
        let axis = axis % 3;
        (self.min[axis] + self.max[axis]) * 0.5
    }

    /// Size along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area of the box.
    pub fn surface_area(&self) -> f64 {
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Squared distance from `p` to the box (zero inside).
    pub fn distance_squared_to_point(&self, p: &Point3) -> f64 {
        (0..3)
            .map(|i| {
                let d = (self.min[i] - p[i]).max(p[i] - self.max[i]).max(0.0);
                d * d
            })
            .sum()
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Range of signed distances from the box to a plane.
    ///
    /// Projects the center and half-extent onto the plane normal.
    pub fn plane_extent(&self, plane: &Plane) -> (f64, f64) {
        let center = plane.signed_distance(&self.center());
        let half = self.extent() * 0.5;
        let n = plane.normal.into_inner();
        let radius = half.x * n.x.abs() + half.y * n.y.abs() + half.z * n.z.abs();
        (center - radius, center + radius)
    }

    /// True when the box straddles or touches the plane.
    pub fn crosses_plane(&self, plane: &Plane) -> bool {
        let (lo, hi) = self.plane_extent(plane);
        lo <= 0.0 && hi >= 0.0
    }

    /// Bounds of this box after an affine transform.
    pub fn transformed(&self, transform: &Transform) -> Aabb3 {
        let corners = self.corners().map(|c| transform.apply_point(&c));
        Self::from_points(corners.iter())
    }
}
