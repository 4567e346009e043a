//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! The session manager, limiter set, and optional model client are built
//! once at process start and passed in — no module-level globals — so the
//! whole surface is unit-testable without a network listener.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::gemini::GenerativeModel;
use crate::rate_limit::RateLimiters;
use crate::services::room::{SessionConfig, SessionManager};

/// Shared application state. Clone is required by Axum — all inner fields
/// are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: SessionManager,
    pub limiters: RateLimiters,
    /// Optional generative model client. `None` if `GOOGLE_API_KEY` is not
    /// configured; the generation endpoints answer 503 in that case.
    pub model: Option<Arc<dyn GenerativeModel>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        let sessions = SessionManager::new(SessionConfig::from(&config));
        Self {
            config: Arc::new(config),
            sessions,
            limiters: RateLimiters::from_env(),
            model,
        }
    }

    /// Spawn the idle-participant sweep and the limiter prune tasks.
    pub fn spawn_background_tasks(&self) {
        self.sessions.spawn_idle_sweep(self.config.sweep_interval);
        self.limiters.spawn_prune_tasks(self.config.sweep_interval);
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
