//! Server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Typed config built once at startup and injected through `AppState` —
//! handlers never read the environment directly. Timer values are policy
//! knobs, not contract values; every one has an env override.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_HOST: &str = "0.0.0.0";

const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
const DEFAULT_PARTICIPANT_IDLE_SECS: u64 = 120;
const DEFAULT_ROOM_DRAIN_GRACE_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Deployment mode. Development allows joining a room code that was never
/// explicitly created (the room is instantiated on first join).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match std::env::var("ENVIRONMENT").unwrap_or_default().to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Heartbeat ping cadence per connection.
    pub ping_interval: Duration,
    /// Inactivity threshold before a participant is forcibly disconnected.
    pub participant_idle: Duration,
    /// Grace period an empty room survives before its document is disposed.
    pub room_drain_grace: Duration,
    /// Cadence of the idle-participant sweep and limiter prune tasks.
    pub sweep_interval: Duration,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.into()),
            port: env_parse("PORT", DEFAULT_PORT),
            environment: Environment::from_env(),
            ping_interval: Duration::from_secs(env_parse(
                "PING_INTERVAL_SECS",
                DEFAULT_PING_INTERVAL_SECS,
            )),
            participant_idle: Duration::from_secs(env_parse(
                "PARTICIPANT_IDLE_SECS",
                DEFAULT_PARTICIPANT_IDLE_SECS,
            )),
            room_drain_grace: Duration::from_secs(env_parse(
                "ROOM_DRAIN_GRACE_SECS",
                DEFAULT_ROOM_DRAIN_GRACE_SECS,
            )),
            sweep_interval: Duration::from_secs(env_parse(
                "SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
        }
    }

    /// Whether joining an unknown room code creates the room on the fly.
    #[must_use]
    pub fn auto_create_rooms(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            environment: Environment::Production,
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            participant_idle: Duration::from_secs(DEFAULT_PARTICIPANT_IDLE_SECS),
            room_drain_grace: Duration::from_secs(DEFAULT_ROOM_DRAIN_GRACE_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

/// Parse an env var, falling back to the default on absence or parse failure.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
