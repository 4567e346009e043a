//! Room HTTP endpoints — health, create, and existence probe.

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::source_addr;
use crate::state::AppState;

/// Plain banner for load balancers and the curious.
pub async fn root() -> &'static str {
    "Whiteboard relay server is running\n"
}

/// `GET /health` — status plus live connection/room gauges.
pub async fn health(State(state): State<AppState>) -> Response {
    let active_connections = state.sessions.connection_count().await;
    let active_rooms = state.sessions.room_count().await;
    Json(json!({
        "status": "ok",
        "timestamp": now_ms(),
        "activeConnections": active_connections,
        "activeRooms": active_rooms,
    }))
    .into_response()
}

/// `GET /create-room` — generate a collision-checked code and eagerly
/// instantiate the backing document.
pub async fn create_room(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let addr = source_addr(&headers, &peer);
    if state.limiters.http.is_rate_limited(&addr) {
        return rate_limited();
    }

    let room_code = state.sessions.create_room().await;
    Json(json!({ "roomCode": room_code })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CheckRoomQuery {
    #[serde(rename = "roomCode")]
    room_code: Option<String>,
}

/// `GET /check-room?roomCode=` — read-only existence probe.
pub async fn check_room(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<CheckRoomQuery>,
) -> Response {
    let addr = source_addr(&headers, &peer);
    if state.limiters.http.is_rate_limited(&addr) {
        return rate_limited();
    }

    let Some(room_code) = query.room_code else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "roomCode required" }))).into_response();
    };

    let exists = state.sessions.check_room(&room_code).await;
    Json(json!({ "exists": exists })).into_response()
}

// =============================================================================
// HELPERS
// =============================================================================

fn rate_limited() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "rate limit exceeded" }))).into_response()
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
