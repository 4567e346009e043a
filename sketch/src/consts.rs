//! Shared numeric constants for the sketch crate.

// ── Simplification ──────────────────────────────────────────────

/// Minimum turning angle (radians) for an interior point to survive
/// simplification.
pub const SIMPLIFY_ANGLE_TOLERANCE: f64 = 0.2;

/// Kept-segment length (pixels) above which an interior point survives
/// regardless of turning angle.
pub const SIMPLIFY_DISTANCE_TOLERANCE: f64 = 10.0;

// ── Gesture gate ────────────────────────────────────────────────

/// Default minimum movement (pixels) for a gesture sample to register while
/// drawing.
pub const DEFAULT_DRAWING_DEADZONE: f64 = 5.0;

/// Default maximum plausible single-sample movement; larger jumps are
/// treated as tracking glitches and dropped.
pub const DEFAULT_MAX_JUMP: f64 = 100.0;

// ── Cursor smoothing ────────────────────────────────────────────

/// Default sliding-window length for the cursor low-pass filter.
pub const DEFAULT_CURSOR_HISTORY_SIZE: usize = 5;

/// Default per-axis deadzone (pixels) below which the smoothed cursor snaps
/// back to its previous position.
pub const DEFAULT_CURSOR_DEADZONE: f64 = 2.0;

// ── Shape recognition ───────────────────────────────────────────

/// Perpendicular tolerance (pixels) for the three-point collinearity test
/// used by the straight-section scan.
pub const STRAIGHT_SECTION_TOLERANCE: f64 = 3.0;

/// A straight run must exceed this many points to count as a section.
pub const STRAIGHT_SECTION_MIN_RUN: usize = 3;

/// Fraction of points inside straight sections beyond which the circle
/// score collapses.
pub const STRAIGHT_RATIO_CEILING: f64 = 0.10;

/// Bounding-box aspect ratio beyond which a stroke is too elongated to be
/// a rectangle.
pub const RECT_MAX_ASPECT: f64 = 4.0;

/// Aspect-ratio band around 1:1 inside which a rectangle is promoted to a
/// square.
pub const SQUARE_ASPECT_BAND: f64 = 0.25;

/// Angular step (degrees) of the canonical circle outline — 37 points over
/// a closed 360° sweep.
pub const CIRCLE_STEP_DEGREES: usize = 10;
