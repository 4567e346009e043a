#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Perpendicular distance from `point` to the infinite line through `a` and
/// `b`. Degenerates to plain point distance when the endpoints coincide.
#[must_use]
pub fn distance_to_line(point: Point, a: Point, b: Point) -> f64 {
    let denominator = ((b.y - a.y).powi(2) + (b.x - a.x).powi(2)).sqrt();
    if denominator <= f64::EPSILON {
        return distance(point, a);
    }
    let numerator = ((b.y - a.y) * point.x - (b.x - a.x) * point.y + b.x * a.y - b.y * a.x).abs();
    numerator / denominator
}

/// Area of the triangle spanned by three points.
#[must_use]
pub fn triangle_area(p1: Point, p2: Point, p3: Point) -> f64 {
    ((p2.x - p1.x) * (p3.y - p1.y) - (p3.x - p1.x) * (p2.y - p1.y)).abs() / 2.0
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounding box of `points`, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Elongation: the larger of width/height and height/width.
    /// Infinite for a degenerate (flat) box.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        let (w, h) = (self.width(), self.height());
        (w / h).max(h / w)
    }
}
