//! Generative HTTP endpoints — canvas enhancement and stroke generation.
//!
//! ERROR HANDLING
//! ==============
//! Every failure maps to a JSON `{error}` body: 400 for validation, 429
//! for the AI rate limit, 503 when no model is configured, 502 for
//! upstream failures. Upstream errors are logged and surfaced — they never
//! take the process down.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::source_addr;
use crate::raster::RasterError;
use crate::services::generate::{self, GenerateError};
use crate::state::AppState;
use sketch::Stroke;

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    strokes: Vec<Stroke>,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStrokesRequest {
    strokes: Vec<Stroke>,
    user_prompt: String,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /generate` — rasterize strokes, ask the model for an enhanced
/// image, reply with base64 image parts.
pub async fn generate_image(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let addr = source_addr(&headers, &peer);
    if state.limiters.ai.is_rate_limited(&addr) {
        return rate_limited();
    }
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let Some(model) = state.model.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "AI generation not configured");
    };

    match generate::enhance_image(
        model.as_ref(),
        &request.strokes,
        request.canvas_width,
        request.canvas_height,
    )
    .await
    {
        Ok(output) => {
            let images: Vec<serde_json::Value> = output
                .images
                .iter()
                .map(|img| json!({ "mimeType": img.mime_type, "data": img.data }))
                .collect();
            Json(json!({ "images": images, "text": output.text })).into_response()
        }
        Err(e) => generate_error_response(&e),
    }
}

/// `POST /generate-strokes` — rasterize strokes, ask the model for new
/// strokes as JSON, reply with the raw JSON string. Stricter per-address
/// rate limit than `/generate` payloads would suggest: this endpoint is
/// externally billed per call.
pub async fn generate_strokes(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<GenerateStrokesRequest>, JsonRejection>,
) -> Response {
    let addr = source_addr(&headers, &peer);
    if state.limiters.ai.is_rate_limited(&addr) {
        return rate_limited();
    }
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let Some(model) = state.model.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "AI generation not configured");
    };

    match generate::generate_strokes(
        model.as_ref(),
        &request.strokes,
        &request.user_prompt,
        request.canvas_width,
        request.canvas_height,
    )
    .await
    {
        Ok(new_strokes) => Json(json!({ "newStrokes": new_strokes })).into_response(),
        Err(e) => generate_error_response(&e),
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

fn generate_error_response(error: &GenerateError) -> Response {
    match error {
        GenerateError::Validation(message) => bad_request(message),
        GenerateError::Raster(RasterError::InvalidDimensions { .. }) => bad_request(&error.to_string()),
        GenerateError::NotConfigured => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &error.to_string())
        }
        GenerateError::Raster(_) => {
            error!(%error, "raster encoding failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
        }
        GenerateError::Upstream(_) | GenerateError::BadModelStrokes(_) => {
            error!(%error, "generation failed upstream");
            error_response(StatusCode::BAD_GATEWAY, &error.to_string())
        }
    }
}

fn bad_request(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

fn rate_limited() -> Response {
    error_response(StatusCode::TOO_MANY_REQUESTS, "Please wait between generations")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
