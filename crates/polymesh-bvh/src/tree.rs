//! The built hierarchy and its validated query surface.

use std::sync::Arc;

use polymesh_math::{Aabb3, Mesh, Plane, Point3};
use tracing::debug;

use crate::build::{build_tree, BuildStrategy};
use crate::error::{BvhError, Result};
use crate::item::BvhItem;
use crate::primitives::TriangleItem;

/// A bounding volume hierarchy over arbitrary [`BvhItem`]s.
///
/// Built once, then queried any number of times; queries take `&self` and the
/// tree is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Arc<dyn BvhItem>,
}

impl Bvh {
    /// Build a hierarchy over `items`.
    pub fn build(items: Vec<Arc<dyn BvhItem>>, strategy: BuildStrategy) -> Result<Self> {
        if items.is_empty() {
            return Err(BvhError::NoItems);
        }
        let count = items.len();
        let root = build_tree(items, strategy);
        debug!(items = count, ?strategy, "Built bounding volume hierarchy");
        Ok(Self { root })
    }

    /// Build a hierarchy with one [`TriangleItem`] per mesh face.
    pub fn from_mesh(mesh: &Mesh, strategy: BuildStrategy) -> Result<Self> {
        let items = TriangleItem::from_mesh(mesh)?
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn BvhItem>)
            .collect();
        Self::build(items, strategy)
    }

    /// Use an already assembled item as the root.
    pub fn from_root(root: Arc<dyn BvhItem>) -> Self {
        Self { root }
    }

    /// Root item.
    pub fn root(&self) -> &Arc<dyn BvhItem> {
        &self.root
    }

    /// Bounds of everything in the tree.
    pub fn bounding_box(&self) -> Aabb3 {
        self.root.bounding_box()
    }

    /// Leaves whose bounds straddle or touch `plane`.
    pub fn crossing(&self, plane: &Plane) -> Vec<&dyn BvhItem> {
        self.root.crossing(plane)
    }

    /// Leaves whose bounds lie within `tolerance` of `point`.
    pub fn touching(&self, point: &Point3, tolerance: f64) -> Result<Vec<&dyn BvhItem>> {
        check_point(point)?;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(BvhError::InvalidTolerance(tolerance));
        }
        Ok(self.root.touching(point, tolerance))
    }

    /// Leaves fully or partially inside `region`.
    pub fn contained(&self, region: &Aabb3) -> Result<Vec<&dyn BvhItem>> {
        if !region.is_valid() {
            return Err(BvhError::InvalidRegion {
                min: region.min.coords.into(),
                max: region.max.coords.into(),
            });
        }
        let mut results = Vec::new();
        self.root.contained(&mut results, region);
        Ok(results)
    }

    /// Precise containment against the solid leaves of the tree.
    pub fn contains(&self, point: &Point3) -> Result<bool> {
        check_point(point)?;
        Ok(self.root.contains(point))
    }

    /// Depth-first walk over every item, root first.
    pub fn iter(&self) -> BvhIter<'_> {
        BvhIter::new(self.root.as_ref(), None)
    }

    /// Depth-first walk that only descends into items accepted by `descend`.
    ///
    /// Rejected items are still yielded; their children are skipped.
    pub fn filter<'a, F>(&'a self, descend: F) -> BvhIter<'a>
    where
        F: Fn(&dyn BvhItem, usize) -> bool + 'a,
    {
        BvhIter::new(self.root.as_ref(), Some(Box::new(descend)))
    }
}

fn check_point(point: &Point3) -> Result<()> {
    if point.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(BvhError::InvalidPoint(point.coords.into()))
    }
}

type DescendFilter<'a> = Box<dyn Fn(&dyn BvhItem, usize) -> bool + 'a>;

/// Depth-first iterator yielding `(depth, item)` pairs.
pub struct BvhIter<'a> {
    stack: Vec<(usize, &'a dyn BvhItem)>,
    descend: Option<DescendFilter<'a>>,
}

impl<'a> BvhIter<'a> {
    fn new(root: &'a dyn BvhItem, descend: Option<DescendFilter<'a>>) -> Self {
        Self {
            stack: vec![(0, root)],
            descend,
        }
    }
}

impl<'a> Iterator for BvhIter<'a> {
    type Item = (usize, &'a dyn BvhItem);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, item) = self.stack.pop()?;
        let descend = self.descend.as_ref().map_or(true, |f| f(item, depth));
        if descend {
            // Reverse so the first child is visited first
            for child in item.children().iter().rev() {
                self.stack.push((depth + 1, child.as_ref()));
            }
        }
        Some((depth, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{BoxItem, SphereItem};
    use polymesh_math::Vec3;

    /// A 4x4x4 grid of unit boxes with unit gaps, min corners at even coordinates.
    fn box_grid() -> Vec<Arc<dyn BvhItem>> {
        let mut items: Vec<Arc<dyn BvhItem>> = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let min = Point3::new(i as f64 * 2.0, j as f64 * 2.0, k as f64 * 2.0);
                    items.push(Arc::new(BoxItem::new(Aabb3::new(
                        min,
                        min + Vec3::repeat(1.0),
                    ))));
                }
            }
        }
        items
    }

    fn both_strategies() -> [Bvh; 2] {
        [
            Bvh::build(box_grid(), BuildStrategy::Median).unwrap(),
            Bvh::build(box_grid(), BuildStrategy::SurfaceAreaHeuristic).unwrap(),
        ]
    }

    fn brute_force<F: Fn(&Aabb3) -> bool>(pred: F) -> usize {
        box_grid().iter().filter(|b| pred(&b.bounding_box())).count()
    }

    #[test]
    fn test_empty_build_fails() {
        assert_eq!(
            Bvh::build(Vec::new(), BuildStrategy::Median).unwrap_err(),
            BvhError::NoItems
        );
        assert_eq!(
            Bvh::from_mesh(&Mesh::default(), BuildStrategy::Median).unwrap_err(),
            BvhError::NoItems
        );
    }

    #[test]
    fn test_touching_zero_tolerance_matches_containing_boxes() {
        for bvh in both_strategies() {
            // Inside one box
            let p = Point3::new(2.5, 4.5, 6.5);
            let hits = bvh.touching(&p, 0.0).unwrap();
            assert_eq!(hits.len(), 1);
            assert!(hits[0].bounding_box().contains_point(&p));

            // In a gap
            assert!(bvh.touching(&Point3::new(1.5, 0.5, 0.5), 0.0).unwrap().is_empty());

            // Boxes never share faces, so a corner touches exactly one
            let corner = Point3::new(1.0, 1.0, 1.0);
            assert_eq!(bvh.touching(&corner, 0.0).unwrap().len(), 1);

            // A tolerance of 0.5 from the gap center reaches both neighbours
            assert_eq!(bvh.touching(&Point3::new(1.5, 0.5, 0.5), 0.5).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_crossing_matches_brute_force() {
        let planes = [
            Plane::horizontal(2.5),
            Plane::horizontal(1.5),
            Plane::horizontal(2.0),
            Plane::new(Vec3::x(), 6.2).unwrap(),
            Plane::new(Vec3::new(1.0, 1.0, 0.0), 4.0).unwrap(),
        ];
        for bvh in both_strategies() {
            for plane in &planes {
                let expected = brute_force(|b| {
                    let (lo, hi) = b.plane_extent(plane);
                    lo <= 0.0 && hi >= 0.0
                });
                assert_eq!(bvh.crossing(plane).len(), expected, "plane {plane:?}");
            }
        }
        // z = 2.5 cuts through one layer of 16 boxes, z = 1.5 through none
        let bvh = Bvh::build(box_grid(), BuildStrategy::Median).unwrap();
        assert_eq!(bvh.crossing(&Plane::horizontal(2.5)).len(), 16);
        assert!(bvh.crossing(&Plane::horizontal(1.5)).is_empty());
    }

    #[test]
    fn test_contained_matches_brute_force() {
        let region = Aabb3::new(Point3::new(0.5, 0.5, 0.5), Point3::new(3.0, 3.0, 3.0));
        for bvh in both_strategies() {
            let hits = bvh.contained(&region).unwrap();
            assert_eq!(hits.len(), brute_force(|b| b.overlaps(&region)));
            assert_eq!(hits.len(), 8);
        }
    }

    #[test]
    fn test_invalid_queries_fail_fast() {
        let bvh = Bvh::build(box_grid(), BuildStrategy::Median).unwrap();
        let inverted = Aabb3::new(Point3::new(1.0, 0.0, 0.0), Point3::origin());
        assert!(matches!(
            bvh.contained(&inverted),
            Err(BvhError::InvalidRegion { .. })
        ));
        assert!(matches!(
            bvh.contained(&Aabb3::empty()),
            Err(BvhError::InvalidRegion { .. })
        ));
        assert_eq!(
            bvh.touching(&Point3::origin(), -1.0).unwrap_err(),
            BvhError::InvalidTolerance(-1.0)
        );
        assert!(matches!(
            bvh.touching(&Point3::new(f64::NAN, 0.0, 0.0), 0.0),
            Err(BvhError::InvalidPoint(_))
        ));
        assert!(bvh.contains(&Point3::new(0.0, f64::INFINITY, 0.0)).is_err());
    }

    #[test]
    fn test_contains_is_precise() {
        let items: Vec<Arc<dyn BvhItem>> = vec![
            Arc::new(SphereItem::new(Point3::origin(), 1.0)),
            Arc::new(SphereItem::new(Point3::new(5.0, 0.0, 0.0), 1.0)),
        ];
        let bvh = Bvh::build(items, BuildStrategy::Median).unwrap();
        assert!(bvh.contains(&Point3::new(0.5, 0.5, 0.0)).unwrap());
        // Inside the first sphere's bounds, outside the sphere
        assert!(!bvh.contains(&Point3::new(0.9, 0.9, 0.9)).unwrap());
    }

    #[test]
    fn test_mesh_tree_crossing() {
        let bvh = Bvh::from_mesh(&Mesh::unit_cube(), BuildStrategy::SurfaceAreaHeuristic).unwrap();
        let hits = bvh.crossing(&Plane::horizontal(0.5));
        // The eight side triangles, not the top or bottom caps
        assert_eq!(hits.len(), 8);
        assert!(hits
            .iter()
            .all(|h| h.as_any().downcast_ref::<TriangleItem>().is_some()));
    }

    #[test]
    fn test_iter_and_filter() {
        let bvh = Bvh::build(box_grid(), BuildStrategy::Median).unwrap();
        let all: Vec<_> = bvh.iter().collect();
        let leaves = all.iter().filter(|(_, item)| item.children().is_empty()).count();
        assert_eq!(leaves, 64);
        assert_eq!(all[0].0, 0);

        // Never descend below the root
        let shallow: Vec<_> = bvh.filter(|_, depth| depth < 1).collect();
        assert_eq!(shallow.len(), 1 + bvh.root().children().len());
        assert!(shallow.iter().all(|(depth, _)| *depth <= 1));

        // Only descend into nodes whose bounds cross x = 0.5
        let plane = Plane::new(Vec3::x(), 0.5).unwrap();
        let pruned = bvh
            .filter(move |item, _| item.bounding_box().crosses_plane(&plane))
            .filter(|(_, item)| item.children().is_empty())
            .filter(|(_, item)| item.bounding_box().crosses_plane(&plane))
            .count();
        assert_eq!(pruned, 16);
    }
}
