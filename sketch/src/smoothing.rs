//! Cursor smoothing — sliding-window average with a per-axis deadzone.
//!
//! DESIGN
//! ======
//! Runs on every raw tracker sample to stabilize the displayed pointer and
//! presence position. This is a separate stage from the drawing deadzone in
//! [`crate::stroke`]: that gate only runs while committing points to an
//! in-progress stroke, and it operates on the post-smoothing position.
//!
//! State (the history window) is threaded explicitly by the caller; there
//! is no hidden global filter state.

#[cfg(test)]
#[path = "smoothing_test.rs"]
mod smoothing_test;

use crate::consts::{DEFAULT_CURSOR_DEADZONE, DEFAULT_CURSOR_HISTORY_SIZE};
use crate::geom::Point;

/// Tuning for the cursor filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorParams {
    /// Sliding-window length. Zero disables smoothing entirely.
    pub history_size: usize,
    /// Per-axis deviation below which the smoothed position snaps back to
    /// the previous value instead of drifting toward sub-threshold jitter.
    pub deadzone: f64,
}

impl Default for CursorParams {
    fn default() -> Self {
        Self { history_size: DEFAULT_CURSOR_HISTORY_SIZE, deadzone: DEFAULT_CURSOR_DEADZONE }
    }
}

/// Smooth one raw cursor sample against the caller-owned history window.
///
/// With `history_size < 1` this is an explicit no-op: the new point passes
/// straight through and `history` is left untouched. An empty history is
/// seeded with the new point. Otherwise the smoothed position is the mean
/// of the window plus the candidate, snapped per axis to the previous tail
/// when the deviation is below the deadzone, and appended to the window
/// (evicting the oldest entries first).
pub fn smooth(history: &mut Vec<Point>, new_point: Point, params: &CursorParams) -> Point {
    if params.history_size < 1 {
        return new_point;
    }
    let Some(&last) = history.last() else {
        history.push(new_point);
        return new_point;
    };

    let mut sum = new_point;
    for p in history.iter() {
        sum.x += p.x;
        sum.y += p.y;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = (history.len() + 1) as f64;
    let mut smoothed = Point::new(sum.x / count, sum.y / count);

    if (smoothed.x - last.x).abs() < params.deadzone {
        smoothed.x = last.x;
    }
    if (smoothed.y - last.y).abs() < params.deadzone {
        smoothed.y = last.y;
    }

    while history.len() >= params.history_size {
        history.remove(0);
    }
    history.push(smoothed);
    smoothed
}
