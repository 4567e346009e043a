//! Wire messages for the room relay.
//!
//! DESIGN
//! ======
//! One tagged message type in both directions, JSON on the wire. The server
//! routes on `type` and never inspects stroke payloads beyond the
//! append-boundary validation in [`crate::doc`]. Unknown or malformed
//! messages are swallowed by the connection loop — a misbehaving client
//! must not tear down an otherwise-healthy session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ROSTER
// =============================================================================

/// One entry in an `active-users` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "clientID")]
    pub client_id: Uuid,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub color: String,
    #[serde(rename = "roomCode")]
    pub room_code: String,
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Every message exchanged over a room socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Server → clients: the room roster changed.
    #[serde(rename = "active-users")]
    ActiveUsers { users: Vec<RosterEntry> },
    /// Server → client: liveness probe on a fixed interval.
    #[serde(rename = "ping")]
    Ping,
    /// Client → server: liveness reply. Refreshes `last_active` only.
    #[serde(rename = "pong")]
    Pong,
    /// Server → joining client: full snapshot of the room's ordered log.
    #[serde(rename = "sync")]
    Sync { strokes: Vec<sketch::Stroke> },
    /// Document append: one finalized stroke, never array-wrapped.
    #[serde(rename = "stroke")]
    Stroke { stroke: sketch::Stroke },
    /// Document clear: empties the room's ordered log.
    #[serde(rename = "clear")]
    Clear,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
