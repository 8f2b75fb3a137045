//! Placed instances of shared geometry.

use std::sync::Arc;

use polymesh_math::{Aabb3, Point3, Transform};

use crate::item::BvhItem;

/// An item drawn through an affine transform.
///
/// The wrapped item stays in its own local frame and may be shared by many
/// proxies. Queries treat the proxy as a single leaf bounded by the
/// transformed local bounds.
#[derive(Debug, Clone)]
pub struct TransformProxy {
    item: Arc<dyn BvhItem>,
    axis_to_world: Transform,
    world_to_axis: Transform,
    aabb: Aabb3,
}

impl TransformProxy {
    /// Place `item` with `axis_to_world`. Returns `None` for a singular transform.
    pub fn new(item: Arc<dyn BvhItem>, axis_to_world: Transform) -> Option<Self> {
        let world_to_axis = axis_to_world.inverse()?;
        let aabb = item.bounding_box().transformed(&axis_to_world);
        Some(Self {
            item,
            axis_to_world,
            world_to_axis,
            aabb,
        })
    }

    /// The wrapped item.
    pub fn item(&self) -> &Arc<dyn BvhItem> {
        &self.item
    }

    /// Local-to-world placement.
    pub fn axis_to_world(&self) -> &Transform {
        &self.axis_to_world
    }
}

impl BvhItem for TransformProxy {
    fn bounding_box(&self) -> Aabb3 {
        self.aabb
    }

    fn surface_area(&self) -> f64 {
        self.aabb.surface_area()
    }

    fn contains(&self, point: &Point3) -> bool {
        self.item.contains(&self.world_to_axis.apply_point(point))
    }
}
