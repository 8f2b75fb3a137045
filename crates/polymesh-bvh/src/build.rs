//! Hierarchy construction.
//!
//! Two strategies: a median split on a rotating axis driven by
//! [`AxisComparator`], and a bucketed Surface Area Heuristic.

use std::sync::Arc;

use polymesh_math::{Aabb3, Point3};

use crate::item::{AxisComparator, BvhItem};
use crate::node::BvhNode;

/// Nodes with this many items or fewer become leaves' parents directly.
pub const MAX_LEAF_ITEMS: usize = 4;

/// Number of centroid buckets evaluated per axis by the SAH build.
const NUM_BUCKETS: usize = 12;

/// Relative cost of visiting an interior node in the SAH model.
const TRAVERSAL_COST: f64 = 0.125;

/// How to partition items while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Sort along x, y, z in turn and split at the median.
    #[default]
    Median,
    /// Pick the cheapest bucket boundary by surface area.
    SurfaceAreaHeuristic,
}

/// An item with its bounds and center captured once for the build.
struct BuildEntry {
    item: Arc<dyn BvhItem>,
    aabb: Aabb3,
    center: Point3,
}

/// Build a tree over `items`. Callers guarantee `items` is non-empty.
pub(crate) fn build_tree(
    items: Vec<Arc<dyn BvhItem>>,
    strategy: BuildStrategy,
) -> Arc<dyn BvhItem> {
    match strategy {
        BuildStrategy::Median => build_median(items, 0),
        BuildStrategy::SurfaceAreaHeuristic => {
            let entries = items
                .into_iter()
                .map(|item| {
                    let aabb = item.bounding_box();
                    let center = item.center();
                    BuildEntry { item, aabb, center }
                })
                .collect();
            build_sah(entries)
        }
    }
}

/// Wrap a small group; a lone item needs no parent.
fn make_group(mut items: Vec<Arc<dyn BvhItem>>) -> Arc<dyn BvhItem> {
    if items.len() == 1 {
        if let Some(item) = items.pop() {
            return item;
        }
    }
    Arc::new(BvhNode::new(items))
}

fn build_median(mut items: Vec<Arc<dyn BvhItem>>, axis: usize) -> Arc<dyn BvhItem> {
    if items.len() <= MAX_LEAF_ITEMS {
        return make_group(items);
    }

    let comparator = AxisComparator::new(axis);
    items.sort_by(|a, b| comparator.compare(a.as_ref(), b.as_ref()));
    let right = items.split_off(items.len() / 2);

    let left = build_median(items, axis + 1);
    let right = build_median(right, axis + 1);
    Arc::new(BvhNode::new(vec![left, right]))
}

fn build_sah(mut entries: Vec<BuildEntry>) -> Arc<dyn BvhItem> {
    if entries.len() <= MAX_LEAF_ITEMS {
        return make_group(entries.into_iter().map(|e| e.item).collect());
    }

    let mut bounds = Aabb3::empty();
    for entry in &entries {
        bounds.include_aabb(&entry.aabb);
    }

    let mid = find_best_split(&entries, &bounds)
        .map(|(axis, pos)| partition(&mut entries, axis, pos))
        .unwrap_or(0);

    // Fall back to a median split on the widest axis if the partition is empty
    let mid = if mid == 0 || mid == entries.len() {
        let extent = bounds.extent();
        let axis = extent.imax();
        let comparator = AxisComparator::new(axis);
        entries.sort_by(|a, b| comparator.compare(a.item.as_ref(), b.item.as_ref()));
        entries.len() / 2
    } else {
        mid
    };

    let right = entries.split_off(mid);
    let left = build_sah(entries);
    let right = build_sah(right);
    Arc::new(BvhNode::new(vec![left, right]))
}

/// Find the best split axis and position using SAH.
fn find_best_split(entries: &[BuildEntry], bounds: &Aabb3) -> Option<(usize, f64)> {
    let extent = bounds.extent();
    let total_area = bounds.surface_area();
    if total_area <= 0.0 {
        return None;
    }

    let mut best_cost = f64::INFINITY;
    let mut best = None;

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut bucket_counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [Aabb3::empty(); NUM_BUCKETS];

        for entry in entries {
            let b = ((entry.center[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(&entry.aabb);
        }

        for split in 1..NUM_BUCKETS {
            let (left_count, left_bounds) =
                merge_buckets(&bucket_counts[..split], &bucket_bounds[..split]);
            let (right_count, right_bounds) =
                merge_buckets(&bucket_counts[split..], &bucket_bounds[split..]);
            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = TRAVERSAL_COST
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds.surface_area() / total_area * right_count as f64;

            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent));
            }
        }
    }

    best
}

fn merge_buckets(counts: &[usize], bounds: &[Aabb3]) -> (usize, Aabb3) {
    let mut total = 0;
    let mut merged = Aabb3::empty();
    for (count, aabb) in counts.iter().zip(bounds) {
        if *count > 0 {
            total += count;
            merged.include_aabb(aabb);
        }
    }
    (total, merged)
}

/// Partition entries by center along an axis; returns the first right index.
fn partition(entries: &mut [BuildEntry], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = entries.len();

    while left < right {
        if entries[left].center[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            entries.swap(left, right);
        }
    }

    left
}
