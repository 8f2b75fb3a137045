//! The spatial item contract shared by leaves, aggregates and proxies.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use polymesh_math::{Aabb3, Plane, Point3};

/// Upcasts implemented for every sized [`BvhItem`].
///
/// Lets provided trait methods hand out `self` as a trait object, and lets
/// callers recover the concrete leaf type from query results.
pub trait AsBvhItem {
    /// `self` as a trait object.
    fn as_item(&self) -> &dyn BvhItem;
    /// `self` as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: BvhItem + 'static> AsBvhItem for T {
    fn as_item(&self) -> &dyn BvhItem {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything that can live in a bounding volume hierarchy.
///
/// Leaves report no children. Composites return their direct children and
/// bound all of them. Query methods only read the tree, so a built tree can
/// be shared across threads.
///
/// Query methods assume well-formed arguments; [`crate::Bvh`] validates them
/// before descending.
pub trait BvhItem: AsBvhItem + Debug + Send + Sync {
    /// Bounds of this item and all of its descendants.
    fn bounding_box(&self) -> Aabb3;

    /// Surface area, used by build heuristics.
    fn surface_area(&self) -> f64;

    /// Precise containment test. Only solid primitives can return `true`.
    fn contains(&self, point: &Point3) -> bool;

    /// Center of the item's bounds.
    fn center(&self) -> Point3 {
        self.bounding_box().center()
    }

    /// Center coordinate along `axis`, wrapped onto x/y/z.
    fn axis_center(&self, axis: usize) -> f64 {
        self.center()[axis % 3]
    }

    /// Direct children; empty for leaves.
    fn children(&self) -> &[Arc<dyn BvhItem>] {
        &[]
    }

    /// Append every leaf whose bounds straddle or touch `plane`.
    fn collect_crossing<'a>(&'a self, plane: &Plane, out: &mut Vec<&'a dyn BvhItem>) {
        if !self.bounding_box().crosses_plane(plane) {
            return;
        }
        let children = self.children();
        if children.is_empty() {
            out.push(self.as_item());
        } else {
            for child in children {
                child.collect_crossing(plane, out);
            }
        }
    }

    /// Append every leaf whose bounds lie within `tolerance` of `point`.
    fn collect_touching<'a>(
        &'a self,
        point: &Point3,
        tolerance: f64,
        out: &mut Vec<&'a dyn BvhItem>,
    ) {
        if self.bounding_box().distance_squared_to_point(point) > tolerance * tolerance {
            return;
        }
        let children = self.children();
        if children.is_empty() {
            out.push(self.as_item());
        } else {
            for child in children {
                child.collect_touching(point, tolerance, out);
            }
        }
    }

    /// Append every leaf fully or partially inside `region`.
    ///
    /// Returns whether anything was added.
    fn contained<'a>(&'a self, results: &mut Vec<&'a dyn BvhItem>, region: &Aabb3) -> bool {
        if !self.bounding_box().overlaps(region) {
            return false;
        }
        let children = self.children();
        if children.is_empty() {
            results.push(self.as_item());
            return true;
        }
        let mut added = false;
        for child in children {
            added |= child.contained(results, region);
        }
        added
    }

    /// Leaves crossing `plane`.
    fn crossing(&self, plane: &Plane) -> Vec<&dyn BvhItem> {
        let mut out = Vec::new();
        self.collect_crossing(plane, &mut out);
        out
    }

    /// Leaves within `tolerance` of `point`.
    fn touching(&self, point: &Point3, tolerance: f64) -> Vec<&dyn BvhItem> {
        let mut out = Vec::new();
        self.collect_touching(point, tolerance, &mut out);
        out
    }
}

/// Orders items by their center along one axis.
///
/// Used to sort a node's items on a rotating axis before a median split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisComparator {
    axis: usize,
}

impl AxisComparator {
    /// Comparator on `axis % 3`.
    pub fn new(axis: usize) -> Self {
        Self { axis: axis % 3 }
    }

    /// Current axis (0, 1 or 2).
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Switch to `axis % 3`.
    pub fn set_axis(&mut self, axis: usize) {
        self.axis = axis % 3;
    }

    /// Ascending by axis center; incomparable centers (NaN) are equal.
    pub fn compare(&self, a: &dyn BvhItem, b: &dyn BvhItem) -> Ordering {
        a.axis_center(self.axis)
            .partial_cmp(&b.axis_center(self.axis))
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::BoxItem;

    fn boxed(x: f64) -> BoxItem {
        BoxItem::new(Aabb3::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0)))
    }

    #[test]
    fn test_comparator_wraps_axis() {
        let mut cmp = AxisComparator::new(4);
        assert_eq!(cmp.axis(), 1);
        cmp.set_axis(3);
        assert_eq!(cmp.axis(), 0);
    }

    #[test]
    fn test_comparator_orders_by_center() {
        let cmp = AxisComparator::new(0);
        let (a, b) = (boxed(0.0), boxed(5.0));
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
        assert_eq!(cmp.compare(&b, &a), Ordering::Greater);
        assert_eq!(cmp.compare(&a, &a), Ordering::Equal);
        // Same center on y
        assert_eq!(AxisComparator::new(1).compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_leaf_reports_itself() {
        let item = boxed(0.0);
        assert_eq!(item.crossing(&Plane::horizontal(0.5)).len(), 1);
        assert!(item.crossing(&Plane::horizontal(2.0)).is_empty());
        assert_eq!(item.touching(&Point3::new(1.5, 0.5, 0.5), 0.5).len(), 1);
        assert!(item.touching(&Point3::new(1.5, 0.5, 0.5), 0.4).is_empty());

        let mut results = Vec::new();
        let region = Aabb3::new(Point3::new(0.9, 0.9, 0.9), Point3::new(2.0, 2.0, 2.0));
        assert!(item.contained(&mut results, &region));
        assert_eq!(results.len(), 1);
        assert!(results[0].as_any().downcast_ref::<BoxItem>().is_some());
    }
}
