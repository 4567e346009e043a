//! WebSocket relay — join, heartbeat, document forwarding.
//!
//! DESIGN
//! ======
//! The upgrade always completes; validation runs first thing inside the
//! socket task and a failed join closes with a policy-violation code
//! before any room or participant state is touched. On success the loop
//! selects over three sources:
//! - inbound socket messages → liveness touch + dispatch by `type`
//! - the participant's outbound channel → forward (or close on eviction)
//! - the heartbeat interval → `{type:"ping"}`
//!
//! Malformed or out-of-protocol inbound messages are logged and swallowed;
//! only transport errors and explicit closes deregister the participant.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → validate room code and connection rate limit
//! 2. Join → initial `sync` snapshot push, roster broadcast to the room
//! 3. Relay until close/evict
//! 4. Deregister → roster re-broadcast; last one out arms the room drain

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use tracing::{info, warn};
use uuid::Uuid;

use super::source_addr;
use crate::protocol::WireMessage;
use crate::services::room::{
    CLOSE_POLICY_VIOLATION, JoinError, JoinInfo, Outbound, outbound_channel,
};
use crate::state::AppState;

/// Query parameters carried on the connection URL.
#[derive(Debug, Clone)]
struct ConnectParams {
    room: Option<String>,
    username: String,
    color: String,
    /// `type=awareness` marks a connection that appears in the roster.
    awareness: bool,
    addr: String,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let params = ConnectParams {
        room: query.get("room").cloned(),
        username: query.get("username").cloned().unwrap_or_else(|| "anonymous".into()),
        color: query.get("color").cloned().unwrap_or_else(|| "#888888".into()),
        awareness: query.get("type").is_some_and(|t| t == "awareness"),
        addr: source_addr(&headers, &peer),
    };
    ws.on_upgrade(move |socket| run_ws(socket, state, params))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, params: ConnectParams) {
    // Validation precedes every state mutation: a refused join leaves no
    // trace in the room map or the participant set.
    let Some(room_code) = params.room.clone() else {
        refuse(socket, "room code required").await;
        return;
    };
    if state.limiters.ws.is_rate_limited(&params.addr) {
        refuse(socket, "connection rate limit exceeded").await;
        return;
    }

    let (tx, mut rx) = outbound_channel();
    let join = state
        .sessions
        .join(
            &room_code,
            JoinInfo {
                name: params.username.clone(),
                color: params.color.clone(),
                addr: params.addr.clone(),
                awareness: params.awareness,
            },
            tx,
        )
        .await;
    let accept = match join {
        Ok(accept) => accept,
        Err(JoinError::UnknownRoom(code)) => {
            warn!(%code, addr = %params.addr, "join refused: unknown room");
            refuse(socket, "unknown room").await;
            return;
        }
    };
    let participant_id = accept.participant_id;

    // Initial document sync.
    if send_message(&mut socket, &WireMessage::Sync { strokes: accept.snapshot })
        .await
        .is_err()
    {
        state.sessions.leave(&room_code, participant_id).await;
        return;
    }

    info!(room = %room_code, participant = %participant_id, addr = %params.addr, "ws: connected");

    let mut heartbeat = tokio::time::interval(state.config.ping_interval);
    heartbeat.tick().await; // the first tick completes immediately

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let Some(Ok(message)) = inbound else { break };
                match message {
                    Message::Text(text) => {
                        handle_inbound(&state, &room_code, participant_id, text.as_str()).await;
                    }
                    Message::Close(_) => break,
                    // Binary frames and transport pongs still count as liveness.
                    _ => state.sessions.touch(&room_code, participant_id).await,
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Some(Outbound::Message(message)) => {
                        if send_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close { code, reason }) => {
                        info!(room = %room_code, participant = %participant_id, code, reason, "ws: server-side close");
                        send_close(&mut socket, code, reason).await;
                        break;
                    }
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if send_message(&mut socket, &WireMessage::Ping).await.is_err() {
                    break;
                }
            }
        }
    }

    // No-op if this participant was already evicted (superseded or swept).
    state.sessions.leave(&room_code, participant_id).await;
    info!(room = %room_code, participant = %participant_id, "ws: disconnected");
}

// =============================================================================
// INBOUND DISPATCH
// =============================================================================

async fn handle_inbound(state: &AppState, room_code: &str, participant_id: Uuid, text: &str) {
    // Any inbound traffic refreshes liveness, parseable or not.
    state.sessions.touch(room_code, participant_id).await;

    let message: WireMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(room = %room_code, participant = %participant_id, error = %e, "ws: ignoring malformed message");
            return;
        }
    };

    match message {
        WireMessage::Pong => {}
        WireMessage::Stroke { stroke } => {
            if let Err(e) = state.sessions.append_stroke(room_code, participant_id, stroke).await {
                warn!(room = %room_code, participant = %participant_id, error = %e, "ws: rejected stroke append");
            }
        }
        WireMessage::Clear => state.sessions.clear_doc(room_code, participant_id).await,
        // Server-originated types echoed back by a confused client.
        WireMessage::Ping | WireMessage::Sync { .. } | WireMessage::ActiveUsers { .. } => {}
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, message: &WireMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

async fn refuse(mut socket: WebSocket, reason: &'static str) {
    warn!(reason, "ws: refusing connection");
    send_close(&mut socket, CLOSE_POLICY_VIOLATION, reason).await;
}

async fn send_close(socket: &mut WebSocket, code: u16, reason: &str) {
    let frame = CloseFrame { code, reason: reason.to_owned().into() };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
