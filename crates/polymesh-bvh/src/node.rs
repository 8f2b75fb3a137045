//! Aggregate items.

use std::sync::Arc;

use polymesh_math::{Aabb3, Point3};

use crate::item::BvhItem;

/// An interior node owning its direct children.
#[derive(Debug, Clone)]
pub struct BvhNode {
    children: Vec<Arc<dyn BvhItem>>,
    aabb: Aabb3,
    center: Point3,
}

impl BvhNode {
    /// Group `children` under one node. Bounds and center are cached.
    pub fn new(children: Vec<Arc<dyn BvhItem>>) -> Self {
        let mut aabb = Aabb3::empty();
        for child in &children {
            aabb.include_aabb(&child.bounding_box());
        }
        Self {
            children,
            aabb,
            center: aabb.center(),
        }
    }
}

impl BvhItem for BvhNode {
    fn bounding_box(&self) -> Aabb3 {
        self.aabb
    }

    // Bounds area, not the sum of the children.
    fn surface_area(&self) -> f64 {
        self.aabb.surface_area()
    }

    fn contains(&self, point: &Point3) -> bool {
        self.aabb.contains_point(point) && self.children.iter().any(|c| c.contains(point))
    }

    fn center(&self) -> Point3 {
        self.center
    }

    fn children(&self) -> &[Arc<dyn BvhItem>] {
        &self.children
    }
}
