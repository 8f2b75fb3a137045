//! Closed polygon loops produced by the stitcher.

use polymesh_math::Point2;
use serde::{Deserialize, Serialize};

/// A closed 2D polygon. The last point connects back to the first; the
/// closing point is not repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Edges as `(from, to)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (&Point2, &Point2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>() / 2.0
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Perimeter length, closing edge included.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Whether the perimeter reaches `minimum`, stopping as soon as it does.
    pub fn perimeter_at_least(&self, minimum: f64) -> bool {
        if minimum <= 0.0 {
            return true;
        }
        if self.points.len() < 2 {
            return false;
        }
        let mut length = 0.0;
        for (a, b) in self.edges() {
            length += (b - a).norm();
            if length >= minimum {
                return true;
            }
        }
        false
    }
}
