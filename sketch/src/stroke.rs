//! Stroke capture, the gesture distance gate, and finalization.
//!
//! DESIGN
//! ======
//! A stroke accumulates points between pen-down and pen-up. Manual input
//! (mouse/touch) appends unconditionally; gesture-tracked input passes a
//! distance gate that drops sub-deadzone wobble and implausible jumps, and
//! damps everything in between with a speed-adaptive step. On release the
//! buffer is compressed by a single left-to-right pass and, when shape
//! recognition is on, replaced by a recognized canonical outline. Finalized
//! strokes are immutable: replicas only ever append them to the shared log
//! or delete them — never edit in place.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    DEFAULT_DRAWING_DEADZONE, DEFAULT_MAX_JUMP, SIMPLIFY_ANGLE_TOLERANCE,
    SIMPLIFY_DISTANCE_TOLERANCE,
};
use crate::geom::{self, Point};
use crate::shape;

// =============================================================================
// TYPES
// =============================================================================

/// Pen style captured at stroke start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { color: "black".into(), width: 3.0 }
    }
}

/// A finalized, immutable stroke.
///
/// This is the single wire representation: one stroke, never array-wrapped.
/// `points` is non-empty for every stroke produced by
/// [`StrokeBuilder::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
    /// Opaque identifier of the originating client replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Tuning for the gesture-input distance gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureParams {
    /// Movements below this distance are ignored.
    pub drawing_deadzone: f64,
    /// Movements above this distance are treated as tracking glitches.
    pub max_jump: f64,
}

impl Default for GestureParams {
    fn default() -> Self {
        Self { drawing_deadzone: DEFAULT_DRAWING_DEADZONE, max_jump: DEFAULT_MAX_JUMP }
    }
}

/// How a finalized stroke's point list is post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalizeMode {
    /// Keep the simplified freehand polyline.
    #[default]
    Freehand,
    /// Replace the polyline with a canonical outline when a shape is
    /// confidently recognized.
    RecognizeShape,
}

// =============================================================================
// BUILDER
// =============================================================================

/// In-progress stroke buffer between pen-down and pen-up.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    id: Uuid,
    points: Vec<Point>,
    style: StrokeStyle,
    owner: Option<String>,
}

impl StrokeBuilder {
    /// Start a stroke. The buffer is seeded with exactly one point, so a
    /// tap without a drag still yields a degenerate one-point stroke.
    #[must_use]
    pub fn begin(point: Point, style: StrokeStyle, owner: Option<String>) -> Self {
        Self { id: Uuid::new_v4(), points: vec![point], style, owner }
    }

    /// The most recently accepted point.
    #[must_use]
    pub fn last_point(&self) -> Point {
        self.points.last().copied().unwrap_or(Point::new(0.0, 0.0))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a raw point unconditionally (mouse/touch input).
    pub fn append(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Append a gesture-tracked point through the distance gate.
    ///
    /// Returns the point actually recorded, or `None` when the candidate
    /// was rejected: closer than the deadzone (wobble) or further than the
    /// max jump (tracking glitch). Accepted candidates are damped by a
    /// speed-adaptive step — the buffer moves only `dist / max_jump` of the
    /// way toward the candidate, so slow motion is damped hard and fast
    /// motion is followed faithfully.
    pub fn append_gesture(&mut self, candidate: Point, params: &GestureParams) -> Option<Point> {
        let last = self.last_point();
        let dist = geom::distance(last, candidate);
        if dist < params.drawing_deadzone || dist > params.max_jump {
            return None;
        }

        let fraction = dist / params.max_jump;
        let stepped = Point::new(
            last.x + (candidate.x - last.x) * fraction,
            last.y + (candidate.y - last.y) * fraction,
        );
        self.points.push(stepped);
        Some(stepped)
    }

    /// Finalize the stroke: simplify, optionally shape-fit, and freeze.
    ///
    /// Returns `None` for an empty buffer — a stroke with zero points is
    /// never committed to the shared log.
    #[must_use]
    pub fn finalize(self, mode: FinalizeMode) -> Option<Stroke> {
        if self.points.is_empty() {
            return None;
        }

        let mut points = simplify(&self.points);
        if mode == FinalizeMode::RecognizeShape {
            if let Some(result) = shape::classify(&points) {
                points = result.points;
            }
        }

        Some(Stroke {
            id: self.id,
            points,
            color: self.style.color,
            width: self.style.width,
            owner: self.owner,
        })
    }
}

// =============================================================================
// SIMPLIFICATION
// =============================================================================

/// Single left-to-right polyline simplification pass.
///
/// The first and last point are always kept. An interior point survives
/// only if the direction change from the previous kept point to the next
/// point exceeds the angle tolerance, or the kept segment has grown past
/// the distance tolerance. One pass, no recursion, no iteration to
/// convergence.
#[must_use]
pub fn simplify(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut result = vec![points[0]];
    for i in 1..points.len() - 1 {
        let prev = result[result.len() - 1];
        let current = points[i];
        let next = points[i + 1];

        let dx1 = current.x - prev.x;
        let dy1 = current.y - prev.y;
        let dx2 = next.x - current.x;
        let dy2 = next.y - current.y;

        let angle_diff = (dy1.atan2(dx1) - dy2.atan2(dx2)).abs();
        let kept_segment = (dx1 * dx1 + dy1 * dy1).sqrt();

        if angle_diff > SIMPLIFY_ANGLE_TOLERANCE || kept_segment > SIMPLIFY_DISTANCE_TOLERANCE {
            result.push(current);
        }
    }
    result.push(points[points.len() - 1]);
    result
}
