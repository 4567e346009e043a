//! Room session management — codes, participants, broadcast, and cleanup.
//!
//! DESIGN
//! ======
//! `SessionManager` owns the room map and is injected into handlers via
//! `AppState`, so the lifecycle logic is unit-testable without a network
//! listener. Each room holds its ordered stroke log, its participants
//! (keyed by connection id, each with an outbound channel), and at most one
//! pending drain task.
//!
//! LIFECYCLE
//! =========
//! Absent → Active (first join) → Draining (last leave arms the drain
//! timer) → Absent (timer fires with still-zero participants), with
//! Draining → Active when a rejoin cancels the pending drain. Re-arming
//! always aborts the previous handle — never two live timers per room.
//!
//! ERROR HANDLING
//! ==============
//! Outbound sends are best-effort `try_send`: a client whose channel is
//! full is skipped, and transport errors surface in its own connection
//! loop. Evictions (superseded / idle) carry distinguishing close codes so
//! clients can tell policy from failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::doc::{DocError, StrokeLog};
use crate::protocol::{RosterEntry, WireMessage};

// =============================================================================
// CLOSE CODES
// =============================================================================

/// Refused join: missing/unknown room or rate limit.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// Evicted by the idle sweep.
pub const CLOSE_IDLE_TIMEOUT: u16 = 4000;
/// Evicted by a newer connection from the same source address.
pub const CLOSE_SUPERSEDED: u16 = 4001;

const ROOM_CODE_LEN: usize = 4;
/// Unambiguous uppercase alphanumerics (no I/L/O/0/1).
const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

const OUTBOUND_BUFFER: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("unknown room: {0}")]
    UnknownRoom(String),
}

/// Events pushed to a connection's socket loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(WireMessage),
    Close { code: u16, reason: &'static str },
}

/// Connection metadata supplied at join time.
#[derive(Debug, Clone)]
pub struct JoinInfo {
    pub name: String,
    pub color: String,
    pub addr: String,
    /// Whether this connection is tracked in the visible roster.
    pub awareness: bool,
}

/// Accepted join: the assigned participant id and the current document
/// snapshot for the initial sync push.
#[derive(Debug)]
pub struct JoinAccept {
    pub participant_id: Uuid,
    pub snapshot: Vec<sketch::Stroke>,
}

struct Participant {
    name: String,
    color: String,
    addr: String,
    awareness: bool,
    connected_at: Instant,
    last_active: Instant,
    tx: mpsc::Sender<Outbound>,
}

struct Room {
    doc: StrokeLog,
    participants: HashMap<Uuid, Participant>,
    /// Pending drain task, if the room is empty.
    drain: Option<JoinHandle<()>>,
}

impl Room {
    fn new() -> Self {
        Self { doc: StrokeLog::new(), participants: HashMap::new(), drain: None }
    }

    fn cancel_drain(&mut self) {
        if let Some(handle) = self.drain.take() {
            handle.abort();
        }
    }

    fn roster(&self, code: &str) -> Vec<RosterEntry> {
        let mut users: Vec<RosterEntry> = self
            .participants
            .iter()
            .filter(|(_, p)| p.awareness)
            .map(|(id, p)| RosterEntry {
                client_id: *id,
                user_name: p.name.clone(),
                color: p.color.clone(),
                room_code: code.to_owned(),
            })
            .collect();
        users.sort_by_key(|entry| entry.client_id);
        users
    }

    fn send_roster(&self, code: &str) {
        let message = WireMessage::ActiveUsers { users: self.roster(code) };
        for participant in self.participants.values() {
            let _ = participant.tx.try_send(Outbound::Message(message.clone()));
        }
    }
}

/// Session policy derived from the server config.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub auto_create_rooms: bool,
    pub participant_idle: Duration,
    pub room_drain_grace: Duration,
}

impl From<&ServerConfig> for SessionConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            auto_create_rooms: config.auto_create_rooms(),
            participant_idle: config.participant_idle,
            room_drain_grace: config.room_drain_grace,
        }
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

#[derive(Clone)]
pub struct SessionManager {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
    config: SessionConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), config }
    }

    // --- Room CRUD ---

    /// Create a room with a fresh collision-checked code. The backing
    /// document is instantiated eagerly, before any participant connects.
    pub async fn create_room(&self) -> String {
        let mut rooms = self.rooms.write().await;
        let code = loop {
            let candidate = generate_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        rooms.insert(code.clone(), Room::new());
        info!(%code, "room created");
        code
    }

    /// Existence probe. Read-only: never touches room lifecycle.
    pub async fn check_room(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(code)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .map(|room| room.participants.len())
            .sum()
    }

    // --- Join / leave ---

    /// Register a connection in a room.
    ///
    /// An awareness join evicts any prior awareness participant from the
    /// same source address first (a browser refresh leaves an orphaned
    /// socket that must yield to the new one), cancels a pending drain, and
    /// pushes the updated roster to the whole room.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::UnknownRoom`] when the code does not exist and
    /// the deployment mode does not auto-create rooms.
    pub async fn join(
        &self,
        code: &str,
        info: JoinInfo,
        tx: mpsc::Sender<Outbound>,
    ) -> Result<JoinAccept, JoinError> {
        let mut rooms = self.rooms.write().await;
        if !rooms.contains_key(code) {
            if !self.config.auto_create_rooms {
                return Err(JoinError::UnknownRoom(code.to_owned()));
            }
            rooms.insert(code.to_owned(), Room::new());
            info!(%code, "room auto-created on first join");
        }
        let Some(room) = rooms.get_mut(code) else {
            return Err(JoinError::UnknownRoom(code.to_owned()));
        };

        if info.awareness {
            let stale: Vec<Uuid> = room
                .participants
                .iter()
                .filter(|(_, p)| p.awareness && p.addr == info.addr)
                .map(|(id, _)| *id)
                .collect();
            for id in stale {
                if let Some(previous) = room.participants.remove(&id) {
                    let _ = previous.tx.try_send(Outbound::Close {
                        code: CLOSE_SUPERSEDED,
                        reason: "superseded by a newer connection",
                    });
                    warn!(%code, participant = %id, addr = %previous.addr, "evicted stale connection");
                }
            }
        }

        room.cancel_drain();

        let participant_id = Uuid::new_v4();
        let now = Instant::now();
        room.participants.insert(
            participant_id,
            Participant {
                name: info.name,
                color: info.color,
                addr: info.addr,
                awareness: info.awareness,
                connected_at: now,
                last_active: now,
                tx,
            },
        );
        info!(%code, participant = %participant_id, connected = room.participants.len(), "participant joined");

        room.send_roster(code);
        Ok(JoinAccept { participant_id, snapshot: room.doc.snapshot() })
    }

    /// Deregister a connection. A no-op if the participant was already
    /// evicted (superseded or idle-swept). The last participant leaving
    /// arms the drain timer.
    pub async fn leave(&self, code: &str, participant_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(code) else {
            return;
        };
        let Some(removed) = room.participants.remove(&participant_id) else {
            return;
        };
        info!(
            %code,
            participant = %participant_id,
            session_secs = removed.connected_at.elapsed().as_secs(),
            remaining = room.participants.len(),
            "participant left"
        );

        if room.participants.is_empty() {
            self.arm_drain(code, room);
        } else {
            room.send_roster(code);
        }
    }

    /// Refresh a participant's liveness. Called for every inbound message.
    pub async fn touch(&self, code: &str, participant_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(code) {
            if let Some(participant) = room.participants.get_mut(&participant_id) {
                participant.last_active = Instant::now();
            }
        }
    }

    // --- Document ---

    /// Append a stroke to the room's log and relay it to every other
    /// participant.
    ///
    /// # Errors
    ///
    /// Rejects an empty-point stroke at the append boundary; nothing is
    /// relayed and the log is unchanged.
    pub async fn append_stroke(
        &self,
        code: &str,
        sender: Uuid,
        stroke: sketch::Stroke,
    ) -> Result<(), DocError> {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(code) else {
            return Ok(());
        };
        room.doc.push(stroke.clone())?;
        relay(room, sender, &WireMessage::Stroke { stroke });
        Ok(())
    }

    /// Clear the room's log and relay the clear to every other participant.
    pub async fn clear_doc(&self, code: &str, sender: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(code) else {
            return;
        };
        room.doc.clear();
        relay(room, sender, &WireMessage::Clear);
    }

    pub async fn doc_len(&self, code: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(code)
            .map_or(0, |room| room.doc.len())
    }

    // --- Sweeps ---

    /// Evict every participant whose inactivity exceeds the configured
    /// threshold. Rooms left empty enter the drain state.
    pub async fn sweep_idle(&self) {
        let now = Instant::now();
        let threshold = self.config.participant_idle;
        let mut rooms = self.rooms.write().await;
        let codes: Vec<String> = rooms.keys().cloned().collect();

        for code in codes {
            let Some(room) = rooms.get_mut(&code) else {
                continue;
            };
            let idle: Vec<Uuid> = room
                .participants
                .iter()
                .filter(|(_, p)| now.duration_since(p.last_active) > threshold)
                .map(|(id, _)| *id)
                .collect();
            if idle.is_empty() {
                continue;
            }

            for id in &idle {
                if let Some(participant) = room.participants.remove(id) {
                    let _ = participant
                        .tx
                        .try_send(Outbound::Close { code: CLOSE_IDLE_TIMEOUT, reason: "idle timeout" });
                    warn!(%code, participant = %id, "evicted idle participant");
                }
            }

            if room.participants.is_empty() {
                self.arm_drain(&code, room);
            } else {
                room.send_roster(&code);
            }
        }
    }

    /// Spawn the periodic idle-participant sweep.
    pub fn spawn_idle_sweep(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                manager.sweep_idle().await;
            }
        })
    }

    /// Arm (or re-arm) the drain timer for an empty room. The previous
    /// pending task, if any, is aborted first.
    fn arm_drain(&self, code: &str, room: &mut Room) {
        room.cancel_drain();

        let manager = self.clone();
        let code = code.to_owned();
        let grace = self.config.room_drain_grace;
        let drain_code = code.clone();
        room.drain = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut rooms = manager.rooms.write().await;
            let still_empty = rooms
                .get(&drain_code)
                .is_some_and(|room| room.participants.is_empty());
            if still_empty {
                rooms.remove(&drain_code);
                info!(%drain_code, "drained idle room");
            }
        }));
        info!(%code, grace_secs = grace.as_secs(), "room drain armed");
    }

    // --- Shutdown ---

    /// Best-effort teardown: abort pending drain timers and ask every
    /// connection to close. In-memory state is not durable by design.
    pub async fn shutdown(&self) {
        let mut rooms = self.rooms.write().await;
        for (code, room) in rooms.iter_mut() {
            room.cancel_drain();
            for participant in room.participants.values() {
                let _ = participant
                    .tx
                    .try_send(Outbound::Close { code: 1001, reason: "server shutting down" });
            }
            info!(%code, "room closed on shutdown");
        }
        rooms.clear();
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Bounded outbound channel for one connection. Sends are best-effort
/// `try_send`; a full buffer drops the message rather than blocking the
/// room lock.
#[must_use]
pub fn outbound_channel() -> (mpsc::Sender<Outbound>, mpsc::Receiver<Outbound>) {
    mpsc::channel(OUTBOUND_BUFFER)
}

/// Forward a message to every participant except the sender.
fn relay(room: &Room, sender: Uuid, message: &WireMessage) {
    for (id, participant) in &room.participants {
        if *id == sender {
            continue;
        }
        let _ = participant.tx.try_send(Outbound::Message(message.clone()));
    }
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_CHARSET.len());
            ROOM_CODE_CHARSET[idx] as char
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
