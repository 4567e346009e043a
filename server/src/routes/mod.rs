//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the HTTP room endpoints, the generative endpoints, and the
//! websocket relay under a single Axum router with permissive CORS — the
//! browser client is served from a different origin.

pub mod generate;
pub mod rooms;
pub mod ws;

use std::net::SocketAddr;

use axum::Router;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(rooms::root))
        .route("/health", get(rooms::health))
        .route("/create-room", get(rooms::create_room))
        .route("/check-room", get(rooms::check_room))
        .route("/generate", post(generate::generate_image))
        .route("/generate-strokes", post(generate::generate_strokes))
        .route("/ws", get(ws::handle_ws))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// TEST SUPPORT
// =============================================================================


/// Source address for rate limiting and the one-participant-per-address
/// rule: the first `X-Forwarded-For` hop when present (the deployed server
/// sits behind a proxy), otherwise the peer IP.
#[must_use]
pub fn source_addr(headers: &HeaderMap, peer: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
