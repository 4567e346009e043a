//! Heuristic shape recognition for freehand strokes.
//!
//! DESIGN
//! ======
//! Each candidate family gets a comparative score in roughly [0, 2] and the
//! best-scoring family emits a canonical outline. Scores are comparative,
//! not absolute — there is no global confidence floor. Ties break by a
//! fixed priority (line, rectangle, circle, triangle): a later family must
//! strictly beat the running best to win.
//!
//! Point counts are small post-simplification, so the O(n²)/O(n³) searches
//! (furthest pair, max-area triple) stay cheap.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CIRCLE_STEP_DEGREES, RECT_MAX_ASPECT, SQUARE_ASPECT_BAND, STRAIGHT_RATIO_CEILING,
    STRAIGHT_SECTION_MIN_RUN, STRAIGHT_SECTION_TOLERANCE,
};
use crate::geom::{self, Bounds, Point};

// =============================================================================
// TYPES
// =============================================================================

/// Canonical shape family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Rectangle,
    Square,
    Circle,
    Triangle,
}

/// A recognized shape and its generated outline.
///
/// Ephemeral: computed once from a finalized stroke's points and, when
/// confident, used to replace the stroke's point list before commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeResult {
    pub kind: ShapeKind,
    pub points: Vec<Point>,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify a point sequence as a canonical shape.
///
/// Pure function of the input: no side effects, deterministic, and never
/// mutates `points`. Returns `None` for fewer than two points.
#[must_use]
pub fn classify(points: &[Point]) -> Option<ShapeResult> {
    if points.len() < 2 {
        return None;
    }
    let bounds = Bounds::from_points(points)?;

    // Fixed priority order; strictly-greater beats, so ties resolve to the
    // earlier family.
    let candidates = [
        (ShapeKind::Line, line_score(points)),
        (ShapeKind::Rectangle, rectangle_score(points, &bounds)),
        (ShapeKind::Circle, circle_score(points, &bounds)),
        (ShapeKind::Triangle, triangle_score(points)),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }

    Some(match best.0 {
        ShapeKind::Line => {
            let (start, end) = furthest_pair(points);
            ShapeResult { kind: ShapeKind::Line, points: vec![start, end] }
        }
        ShapeKind::Rectangle | ShapeKind::Square => rectangle_outline(&bounds),
        ShapeKind::Circle => circle_outline(&bounds),
        ShapeKind::Triangle => triangle_outline(points),
    })
}

// =============================================================================
// SCORES
// =============================================================================

/// Straightness of the whole stroke against its furthest endpoint pair,
/// with a bonus for longer lines so short noisy scribbles lose.
fn line_score(points: &[Point]) -> f64 {
    let (start, end) = furthest_pair(points);
    let line_length = geom::distance(start, end);

    let avg_distance = average(points.iter().map(|p| geom::distance_to_line(*p, start, end)));
    let straightness = 1.0 / (1.0 + avg_distance);
    let length_bonus = (line_length / 100.0).min(2.0);

    straightness * length_bonus * 2.0
}

/// Inverse of the average distance to the nearest bounding-box edge.
fn rectangle_score(points: &[Point], bounds: &Bounds) -> f64 {
    if bounds.aspect() > RECT_MAX_ASPECT {
        return 0.1;
    }

    let avg_edge_distance = average(points.iter().map(|p| {
        let dx = (p.x - bounds.min_x).abs().min((p.x - bounds.max_x).abs());
        let dy = (p.y - bounds.min_y).abs().min((p.y - bounds.max_y).abs());
        dx.min(dy)
    }));
    1.0 / (1.0 + avg_edge_distance)
}

/// Inverse of the average deviation from the bounding ellipse, collapsed
/// when the stroke contains long straight runs (true circles have none).
fn circle_score(points: &[Point], bounds: &Bounds) -> f64 {
    let radius_x = bounds.width() / 2.0;
    let radius_y = bounds.height() / 2.0;
    if radius_x <= f64::EPSILON || radius_y <= f64::EPSILON {
        return 0.0;
    }

    let straight_points = points_in_straight_sections(points);
    #[allow(clippy::cast_precision_loss)]
    let straight_ratio = straight_points as f64 / points.len() as f64;
    if straight_ratio > STRAIGHT_RATIO_CEILING {
        return 0.1;
    }

    let center = bounds.center();
    let avg_deviation = average(points.iter().map(|p| {
        let dx = (p.x - center.x) / radius_x;
        let dy = (p.y - center.y) / radius_y;
        ((dx * dx + dy * dy).sqrt() - 1.0).abs()
    }));

    let ratio_penalty = if bounds.aspect() > 2.0 { 0.5 } else { 1.0 };
    (1.0 / (1.0 + avg_deviation)) * ratio_penalty
}

/// Inverse of the average distance to the max-area triangle's edges, with
/// a penalty for thin/degenerate triangles.
fn triangle_score(points: &[Point]) -> f64 {
    let Some((vertices, area)) = max_area_triple(points) else {
        return 0.0;
    };

    let (start, end) = furthest_pair(points);
    let line_length = geom::distance(start, end);
    if area < line_length * 2.0 {
        return 0.1;
    }

    let avg_edge_distance = average(points.iter().map(|p| {
        (0..3)
            .map(|i| geom::distance_to_line(*p, vertices[i], vertices[(i + 1) % 3]))
            .fold(f64::INFINITY, f64::min)
    }));
    1.0 / (1.0 + avg_edge_distance)
}

/// Count points inside straight sections: contiguous runs where each point
/// sits within a small perpendicular tolerance of the line through its
/// neighbors. Only runs longer than the minimum count.
fn points_in_straight_sections(points: &[Point]) -> usize {
    let mut committed = 0;
    let mut run = 1;
    for i in 1..points.len().saturating_sub(1) {
        let d = geom::distance_to_line(points[i], points[i - 1], points[i + 1]);
        if d < STRAIGHT_SECTION_TOLERANCE {
            run += 1;
        } else {
            if run > STRAIGHT_SECTION_MIN_RUN {
                committed += run;
            }
            run = 1;
        }
    }
    if run > STRAIGHT_SECTION_MIN_RUN {
        committed += run;
    }
    committed
}

// =============================================================================
// SEARCHES
// =============================================================================

/// The two points that are mutually furthest apart. Callers guarantee at
/// least two points.
fn furthest_pair(points: &[Point]) -> (Point, Point) {
    let mut endpoints = (points[0], points[1]);
    let mut max_distance = 0.0;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d = geom::distance(points[i], points[j]);
            if d > max_distance {
                max_distance = d;
                endpoints = (points[i], points[j]);
            }
        }
    }
    endpoints
}

/// The maximum-area triangle over all point triples, brute force.
fn max_area_triple(points: &[Point]) -> Option<([Point; 3], f64)> {
    if points.len() < 3 {
        return None;
    }
    let mut vertices = [points[0], points[1], points[2]];
    let mut max_area = 0.0;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            for k in j + 1..points.len() {
                let area = geom::triangle_area(points[i], points[j], points[k]);
                if area > max_area {
                    max_area = area;
                    vertices = [points[i], points[j], points[k]];
                }
            }
        }
    }
    Some((vertices, max_area))
}

// =============================================================================
// CANONICAL OUTLINES
// =============================================================================

/// 36-gon at 10° steps, closed (37 points).
fn circle_outline(bounds: &Bounds) -> ShapeResult {
    let center = bounds.center();
    let radius = bounds.width().min(bounds.height()) / 2.0;

    let mut points = Vec::with_capacity(360 / CIRCLE_STEP_DEGREES + 1);
    for degrees in (0..=360_u32).step_by(CIRCLE_STEP_DEGREES) {
        let angle = f64::from(degrees).to_radians();
        points.push(Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()));
    }
    ShapeResult { kind: ShapeKind::Circle, points }
}

/// Closed 5-point quad; promoted to a square when the aspect ratio is
/// within 25% of 1:1.
fn rectangle_outline(bounds: &Bounds) -> ShapeResult {
    let width = bounds.width();
    let height = bounds.height();
    if (width / height - 1.0).abs() < SQUARE_ASPECT_BAND {
        let side = width.max(height);
        ShapeResult {
            kind: ShapeKind::Square,
            points: closed_quad(bounds.min_x, bounds.min_y, side, side),
        }
    } else {
        ShapeResult {
            kind: ShapeKind::Rectangle,
            points: closed_quad(bounds.min_x, bounds.min_y, width, height),
        }
    }
}

fn closed_quad(x: f64, y: f64, w: f64, h: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + w, y),
        Point::new(x + w, y + h),
        Point::new(x, y + h),
        Point::new(x, y),
    ]
}

/// The three max-area vertices plus a closing repeat of the first.
fn triangle_outline(points: &[Point]) -> ShapeResult {
    let Some((vertices, _)) = max_area_triple(points) else {
        // Fewer than three points cannot win the triangle score; fall back
        // to the degenerate two-point outline.
        let (start, end) = furthest_pair(points);
        return ShapeResult { kind: ShapeKind::Triangle, points: vec![start, end] };
    };
    ShapeResult {
        kind: ShapeKind::Triangle,
        points: vec![vertices[0], vertices[1], vertices[2], vertices[0]],
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0_u32;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    sum / f64::from(count)
}
