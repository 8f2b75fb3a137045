//! Slicing entry points: single planes, batches of planes and horizontal layers.

use polymesh_bvh::{Bvh, BvhItem, TriangleItem};
use polymesh_math::{Aabb3, Mesh, Plane, Transform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cut::{cut_faces, cut_mesh, cut_projected, CutResult, SkippedFaces};
use crate::error::{Result, SlicerError};
use crate::frame::SliceFrame;
use crate::path::Polygon;
use crate::stitch::{stitch, StitchStats};
use crate::SliceSettings;

/// Counters for one slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceStats {
    /// Faces handed to the cutter.
    pub faces_tested: usize,
    /// Faces that produced a segment.
    pub faces_crossing: usize,
    /// Degenerate faces skipped by the cutter.
    pub skipped: SkippedFaces,
    /// Stitcher counters.
    pub stitch: StitchStats,
}

/// Cross-section of a mesh by one plane.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Closed loops in slice-frame coordinates.
    pub polygons: Vec<Polygon>,
    /// Frame the polygons are expressed in; use [`SliceFrame::to_world`] to
    /// lift them back into mesh space.
    pub frame: SliceFrame,
    /// Counters.
    pub stats: SliceStats,
}

/// A single horizontal layer from [`slice_layers`].
#[derive(Debug, Clone)]
pub struct SliceLayer {
    /// Z height of this layer.
    pub z: f64,
    /// Layer index (0 = first layer).
    pub index: usize,
    /// Closed loops at this height, largest area first.
    /// Outer contours are CCW, holes are CW.
    pub polygons: Vec<Polygon>,
}

/// Slice `mesh` with `plane` and return the closed loops.
pub fn slice(mesh: &Mesh, plane: &Plane, settings: &SliceSettings) -> Result<Vec<Polygon>> {
    Ok(cross_section(mesh, plane, settings)?.polygons)
}

/// Slice `mesh` with `plane`, keeping the frame and statistics.
pub fn cross_section(mesh: &Mesh, plane: &Plane, settings: &SliceSettings) -> Result<CrossSection> {
    check_inputs(mesh, plane, settings)?;
    Ok(section_unchecked(mesh, plane, settings))
}

/// Like [`cross_section`], but only cuts the faces whose bounds come within
/// the plane tolerance of the plane according to `bvh`.
///
/// `bvh` must have been built over `mesh`, e.g. with [`Bvh::from_mesh`];
/// leaves that are not [`TriangleItem`]s are ignored.
pub fn cross_section_indexed(
    mesh: &Mesh,
    bvh: &Bvh,
    plane: &Plane,
    settings: &SliceSettings,
) -> Result<CrossSection> {
    check_inputs(mesh, plane, settings)?;

    let tolerance = settings.plane_tolerance;
    let near = |item: &dyn BvhItem| {
        let (lo, hi) = item.bounding_box().plane_extent(plane);
        lo <= tolerance && hi >= -tolerance
    };
    let mut faces: Vec<usize> = bvh
        .filter(move |item, _| near(item))
        .filter(|(_, item)| item.children().is_empty() && near(*item))
        .filter_map(|(_, item)| item.as_any().downcast_ref::<TriangleItem>())
        .map(TriangleItem::face)
        .collect();
    faces.sort_unstable();
    faces.dedup();

    let frame = SliceFrame::new(plane);
    let cut = cut_faces(mesh, faces, plane, &frame, settings.plane_tolerance);
    Ok(finish(cut, frame, settings))
}

/// Loops where the mesh, placed by `mesh_to_world`, crosses the world plane
/// `z = 0`. Points are world XY coordinates.
pub fn polygon_loops_at_z0(
    mesh: &Mesh,
    mesh_to_world: &Transform,
    settings: &SliceSettings,
) -> Result<Vec<Polygon>> {
    settings.validate()?;
    mesh.validate()?;

    let world_to_mesh = mesh_to_world
        .inverse()
        .ok_or(SlicerError::NonInvertibleTransform)?;
    let plane = Plane::horizontal(0.0)
        .transformed(&world_to_mesh)
        .ok_or(SlicerError::NonInvertibleTransform)?;

    let triangles =
        (0..mesh.face_count()).filter_map(|face| mesh.triangle(face).map(|t| (face, t)));
    let cut = cut_projected(triangles, &plane, settings.plane_tolerance, |p| {
        mesh_to_world.apply_point(p).xy()
    });
    Ok(stitch(&cut.segments, settings).polygons)
}

/// Slice one mesh with many planes in parallel. Results are in plane order.
pub fn slice_many(
    mesh: &Mesh,
    planes: &[Plane],
    settings: &SliceSettings,
) -> Result<Vec<CrossSection>> {
    settings.validate()?;
    mesh.validate()?;
    for plane in planes {
        check_plane(plane)?;
    }

    Ok(planes
        .par_iter()
        .map(|plane| section_unchecked(mesh, plane, settings))
        .collect())
}

/// Slice a mesh at multiple Z heights.
///
/// Returns layers in the order of `heights`.
pub fn slice_layers(
    mesh: &Mesh,
    heights: &[f64],
    settings: &SliceSettings,
) -> Result<Vec<SliceLayer>> {
    if mesh.vertices.is_empty() || mesh.is_empty() {
        return Err(SlicerError::EmptyMesh);
    }
    settings.validate()?;
    mesh.validate()?;
    if let Some(z) = heights.iter().find(|z| !z.is_finite()) {
        return Err(SlicerError::InvalidPlane(format!("layer height {z} is not finite")));
    }

    info!(layers = heights.len(), faces = mesh.face_count(), "Slicing layers");

    let layers = heights
        .par_iter()
        .enumerate()
        .map(|(index, &z)| {
            let mut polygons = section_unchecked(mesh, &Plane::horizontal(z), settings).polygons;
            polygons.sort_by(|a, b| b.signed_area().abs().total_cmp(&a.signed_area().abs()));
            SliceLayer { z, index, polygons }
        })
        .collect();

    Ok(layers)
}

/// Bounds of the vertices referenced by faces, or `None` if there are none.
pub fn mesh_bounds(mesh: &Mesh) -> Option<Aabb3> {
    let mut bounds = Aabb3::empty();
    for face in 0..mesh.face_count() {
        for p in mesh.triangle(face)? {
            bounds.include_point(&p);
        }
    }
    bounds.is_valid().then_some(bounds)
}

/// Generate layer heights between `z_min` and `z_max`.
///
/// Each height sits in the middle of its layer: the first layer is
/// `first_layer_height` thick, the rest `layer_height`. Heights above
/// `z_max` are not generated.
pub fn generate_layer_heights(
    z_min: f64,
    z_max: f64,
    first_layer_height: f64,
    layer_height: f64,
) -> Vec<f64> {
    let mut heights = Vec::new();

    let usable = z_max > z_min && first_layer_height > 0.0 && layer_height > 0.0;
    if !usable {
        return heights;
    }

    let first_z = z_min + first_layer_height / 2.0;
    if first_z <= z_max {
        heights.push(first_z);
    }

    let base = z_min + first_layer_height + layer_height / 2.0;
    heights.extend(
        (0_u64..)
            .map(|i| base + i as f64 * layer_height)
            .take_while(|&z| z <= z_max),
    );

    heights
}

fn check_inputs(mesh: &Mesh, plane: &Plane, settings: &SliceSettings) -> Result<()> {
    settings.validate()?;
    check_plane(plane)?;
    mesh.validate()?;
    Ok(())
}

fn check_plane(plane: &Plane) -> Result<()> {
    let normal = plane.normal.into_inner();
    if !plane.distance.is_finite() {
        return Err(SlicerError::InvalidPlane(format!(
            "distance {} is not finite",
            plane.distance
        )));
    }
    if !normal.iter().all(|c| c.is_finite()) || (normal.norm() - 1.0).abs() > 1e-9 {
        return Err(SlicerError::InvalidPlane(format!(
            "normal [{}, {}, {}] is not a unit vector",
            normal.x, normal.y, normal.z
        )));
    }
    Ok(())
}

fn section_unchecked(mesh: &Mesh, plane: &Plane, settings: &SliceSettings) -> CrossSection {
    let frame = SliceFrame::new(plane);
    let cut = cut_mesh(mesh, plane, &frame, settings.plane_tolerance);
    finish(cut, frame, settings)
}

fn finish(cut: CutResult, frame: SliceFrame, settings: &SliceSettings) -> CrossSection {
    let stitched = stitch(&cut.segments, settings);
    let stats = SliceStats {
        faces_tested: cut.faces_tested,
        faces_crossing: cut.segments.len(),
        skipped: cut.skipped,
        stitch: stitched.stats,
    };
    debug!(
        faces = stats.faces_tested,
        crossing = stats.faces_crossing,
        skipped = stats.skipped.total(),
        polygons = stitched.polygons.len(),
        "Cross-section complete"
    );
    CrossSection {
        polygons: stitched.polygons,
        frame,
        stats,
    }
}
