//! Generative endpoints service — validation, raster, model orchestration.
//!
//! DESIGN
//! ======
//! Both endpoints rasterize the submitted strokes and forward the PNG plus
//! an instruction prompt to the external model. `/generate` asks for an
//! enhanced image; `/generate-strokes` asks the model to reply with stroke
//! JSON, which is validated against the wire stroke type before being
//! passed back to the client.
//!
//! ERROR HANDLING
//! ==============
//! Validation fails before any model call; upstream failures are caught at
//! the call site and surfaced as typed errors — the process never crashes
//! on a misbehaving model.

use tracing::info;

use crate::gemini::{GeminiError, GenerativeModel, ModelOutput};
use crate::raster::{self, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, RasterError};
use sketch::Stroke;

// =============================================================================
// PROMPTS
// =============================================================================

/// Fixed instruction sent with every `/generate` raster.
pub const IMAGE_PROMPT: &str = "\
You are a teacher who is trying to make a student's artwork look nicer to impress their parents. \
You have been given this drawing, and you must enhance, refine and complete this drawing while \
maintaining its core elements and shapes. Try your best to leave the student's original work \
there, but add to the scene to make an impressive drawing. You may also only use the following \
colors: red, green, blue, black, and white.

in other words:
- REPEAT the entire drawing.
- ENHANCE by adding additional lines, colors, fill, etc.
- COMPLETE by adding other features to the foreground and background

Remember to only use lines the same thickness that the student used.

but DO NOT
- modify the original drawing in any way

The image should be the same aspect ratio, and have ALL of the same original lines. Otherwise, \
the parent might suspect that the teacher did some of the work.";

/// Instruction for `/generate-strokes`: the model must answer with stroke
/// JSON only, constrained to the whiteboard palette and canvas bounds.
fn stroke_prompt(user_prompt: &str, width: u32, height: u32, strokes_json: &str) -> String {
    format!(
        "You are drawing on a shared {width}x{height} whiteboard. The attached image shows the \
         current canvas; the existing strokes are also listed below as JSON.\n\n\
         Existing strokes:\n{strokes_json}\n\n\
         The user asks: \"{user_prompt}\"\n\n\
         Reply with ONLY a JSON array of new strokes to add. Each stroke is an object \
         {{\"points\": [{{\"x\": number, \"y\": number}}, ...], \"color\": string, \"width\": number}}. \
         Use only the colors red, green, blue, black, and white. Keep every point inside the \
         canvas bounds. Do not repeat existing strokes. No prose, no markdown fences."
    )
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    Validation(String),
    #[error("AI generation not configured")]
    NotConfigured,
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("upstream error: {0}")]
    Upstream(#[from] GeminiError),
    #[error("model returned unusable stroke JSON: {0}")]
    BadModelStrokes(String),
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Reject malformed stroke payloads before any state or model call.
///
/// # Errors
///
/// Fails on a stroke with no points or a non-finite/non-positive width.
pub fn validate_strokes(strokes: &[Stroke]) -> Result<(), GenerateError> {
    for stroke in strokes {
        if stroke.points.is_empty() {
            return Err(GenerateError::Validation("stroke has no points".into()));
        }
        if !stroke.width.is_finite() || stroke.width <= 0.0 {
            return Err(GenerateError::Validation(format!("invalid stroke width: {}", stroke.width)));
        }
        for point in &stroke.points {
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(GenerateError::Validation("stroke contains non-finite coordinates".into()));
            }
        }
    }
    Ok(())
}

/// Resolve requested canvas dimensions against the defaults.
#[must_use]
pub fn canvas_dims(width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    (width.unwrap_or(DEFAULT_CANVAS_WIDTH), height.unwrap_or(DEFAULT_CANVAS_HEIGHT))
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// `/generate`: rasterize the canvas and ask the model for an enhanced
/// image.
///
/// # Errors
///
/// Validation, raster, or upstream failures; see [`GenerateError`].
pub async fn enhance_image(
    model: &dyn GenerativeModel,
    strokes: &[Stroke],
    width: Option<u32>,
    height: Option<u32>,
) -> Result<ModelOutput, GenerateError> {
    if strokes.is_empty() {
        return Err(GenerateError::Validation("no strokes to enhance".into()));
    }
    validate_strokes(strokes)?;

    let (width, height) = canvas_dims(width, height);
    let png = raster::render_png(strokes, width, height)?;
    info!(strokes = strokes.len(), width, height, png_bytes = png.len(), "forwarding canvas for image generation");

    let output = model.generate_image(&png, IMAGE_PROMPT).await?;
    Ok(output)
}

/// `/generate-strokes`: rasterize the canvas and ask the model for new
/// strokes as JSON. Returns the validated JSON string.
///
/// # Errors
///
/// Validation, raster, or upstream failures, plus
/// [`GenerateError::BadModelStrokes`] when the model's reply does not parse
/// as a stroke array.
pub async fn generate_strokes(
    model: &dyn GenerativeModel,
    strokes: &[Stroke],
    user_prompt: &str,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<String, GenerateError> {
    let user_prompt = user_prompt.trim();
    if user_prompt.is_empty() {
        return Err(GenerateError::Validation("prompt required".into()));
    }
    validate_strokes(strokes)?;

    let (width, height) = canvas_dims(width, height);
    let png = raster::render_png(strokes, width, height)?;
    let strokes_json = serde_json::to_string(strokes)
        .map_err(|e| GenerateError::Validation(format!("strokes not serializable: {e}")))?;

    let prompt = stroke_prompt(user_prompt, width, height, &strokes_json);
    info!(strokes = strokes.len(), prompt_len = user_prompt.len(), "forwarding canvas for stroke generation");

    let reply = model.generate_text(&png, &prompt).await?;
    let cleaned = strip_code_fences(&reply);

    let parsed: Vec<Stroke> = serde_json::from_str(cleaned)
        .map_err(|e| GenerateError::BadModelStrokes(e.to_string()))?;
    if parsed.iter().any(|s| s.points.is_empty()) {
        return Err(GenerateError::BadModelStrokes("stroke with no points".into()));
    }

    Ok(cleaned.to_owned())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Models habitually wrap JSON replies in markdown fences despite
/// instructions; strip one layer if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
