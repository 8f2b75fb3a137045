//! Plane cutter: one directed segment per face that crosses the plane.
//!
//! No deduplication or topology happens here; segments are handed to the
//! stitcher unordered.

use polymesh_math::{Mesh, Plane, Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::frame::SliceFrame;

/// A directed segment in slice space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub start: Point2,
    /// End point.
    pub end: Point2,
}

impl Segment {
    /// Create a segment.
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }
}

/// Why a face touching the plane produced no segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateFace {
    /// The triangle has no area.
    ZeroArea,
    /// All three vertices lie on the plane.
    Coplanar,
    /// Only a single vertex touches the plane.
    VertexTouch,
    /// An edge lies in the plane and the face is above it.
    EdgeInPlane,
}

/// Outcome of cutting one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceCut {
    /// All vertices strictly on one side.
    Miss,
    /// Crossing segment in mesh space.
    Segment(Point3, Point3),
    /// Touches the plane without a usable crossing.
    Degenerate(DegenerateFace),
}

/// Counts of faces skipped as degenerate, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFaces {
    /// Zero-area triangles.
    pub zero_area: usize,
    /// Faces lying in the plane.
    pub coplanar: usize,
    /// Faces touching the plane at a single vertex.
    pub vertex_touch: usize,
    /// Faces with an in-plane edge that were not emitted.
    pub edge_in_plane: usize,
}

impl SkippedFaces {
    fn record(&mut self, kind: DegenerateFace) {
        match kind {
            DegenerateFace::ZeroArea => self.zero_area += 1,
            DegenerateFace::Coplanar => self.coplanar += 1,
            DegenerateFace::VertexTouch => self.vertex_touch += 1,
            DegenerateFace::EdgeInPlane => self.edge_in_plane += 1,
        }
    }

    /// All skipped faces.
    pub fn total(&self) -> usize {
        self.zero_area + self.coplanar + self.vertex_touch + self.edge_in_plane
    }
}

/// Segments cut from a mesh.
#[derive(Debug, Clone, Default)]
pub struct CutResult {
    /// One segment per crossing face, in face order.
    pub segments: Vec<Segment>,
    /// Faces examined.
    pub faces_tested: usize,
    /// Degenerate faces that were skipped.
    pub skipped: SkippedFaces,
}

/// Intersect one triangle with a plane.
///
/// Vertices within `tolerance` of the plane count as on it. The returned
/// segment runs along `plane_normal x face_normal`, so the loops of an
/// outward-wound closed mesh are counter-clockwise seen from the normal side.
pub fn cut_face(tri: &[Point3; 3], plane: &Plane, tolerance: f64) -> FaceCut {
    let d = tri.map(|v| plane.signed_distance(&v));
    let above = d.map(|x| x > tolerance);
    let below = d.map(|x| x < -tolerance);

    if above.iter().all(|&a| a) || below.iter().all(|&b| b) {
        return FaceCut::Miss;
    }

    let [a, b, c] = tri;
    let (ab, ac) = (b - a, c - a);
    let face_normal = ab.cross(&ac);
    if face_normal.norm() <= f64::EPSILON * ab.norm() * ac.norm() {
        return FaceCut::Degenerate(DegenerateFace::ZeroArea);
    }

    let on: Vec<usize> = (0..3).filter(|&i| !above[i] && !below[i]).collect();
    let (start, end) = match on.as_slice() {
        [] => {
            // Exactly two edges change sign
            let mut crossings = (0..3).filter_map(|i| {
                let j = (i + 1) % 3;
                (above[i] != above[j]).then(|| interpolate(&tri[i], &tri[j], d[i], d[j]))
            });
            match (crossings.next(), crossings.next()) {
                (Some(p), Some(q)) => (p, q),
                _ => return FaceCut::Miss,
            }
        }
        &[i] => {
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            if above[j] == above[k] {
                return FaceCut::Degenerate(DegenerateFace::VertexTouch);
            }
            (tri[i], interpolate(&tri[j], &tri[k], d[j], d[k]))
        }
        &[i, j] => {
            let k = 3 - i - j;
            if !below[k] {
                return FaceCut::Degenerate(DegenerateFace::EdgeInPlane);
            }
            (tri[i], tri[j])
        }
        _ => return FaceCut::Degenerate(DegenerateFace::Coplanar),
    };

    let direction = plane.normal.cross(&face_normal);
    if (end - start).dot(&direction) < 0.0 {
        FaceCut::Segment(end, start)
    } else {
        FaceCut::Segment(start, end)
    }
}

/// Point where the edge `p -> q` meets the plane, given signed distances of
/// opposite sign.
fn interpolate(p: &Point3, q: &Point3, dp: f64, dq: f64) -> Point3 {
    let t = dp / (dp - dq);
    p + (q - p) * t
}

/// Cut every face of `mesh`.
pub fn cut_mesh(mesh: &Mesh, plane: &Plane, frame: &SliceFrame, tolerance: f64) -> CutResult {
    cut_faces(mesh, 0..mesh.face_count(), plane, frame, tolerance)
}

/// Cut the listed faces of `mesh`, projecting segments into `frame`.
///
/// Face indices without a valid triangle are ignored.
pub fn cut_faces(
    mesh: &Mesh,
    faces: impl IntoIterator<Item = usize>,
    plane: &Plane,
    frame: &SliceFrame,
    tolerance: f64,
) -> CutResult {
    let triangles = faces
        .into_iter()
        .filter_map(|face| mesh.triangle(face).map(|tri| (face, tri)));
    cut_projected(triangles, plane, tolerance, |p| frame.project(p))
}

/// Cut `(face, triangle)` pairs, mapping segment endpoints to 2D with `project`.
pub(crate) fn cut_projected<F>(
    triangles: impl IntoIterator<Item = (usize, [Point3; 3])>,
    plane: &Plane,
    tolerance: f64,
    project: F,
) -> CutResult
where
    F: Fn(&Point3) -> Point2,
{
    let mut result = CutResult::default();

    for (face, tri) in triangles {
        result.faces_tested += 1;

        match cut_face(&tri, plane, tolerance) {
            FaceCut::Miss => {}
            FaceCut::Segment(start, end) => {
                result
                    .segments
                    .push(Segment::new(project(&start), project(&end)));
            }
            FaceCut::Degenerate(kind) => {
                trace!(face, ?kind, "Skipping degenerate face");
                result.skipped.record(kind);
            }
        }
    }

    result
}
