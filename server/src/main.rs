mod config;
mod doc;
mod gemini;
mod protocol;
mod rate_limit;
mod raster;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::gemini::{GeminiClient, GenerativeModel};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let server_config = config::ServerConfig::from_env();

    // Generative endpoints are optional: missing key disables them.
    let model: Option<Arc<dyn GenerativeModel>> = match GeminiClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "generative model configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "generative model not configured — generation endpoints disabled");
            None
        }
    };

    let state = state::AppState::new(server_config.clone(), model);
    state.spawn_background_tasks();

    let app = routes::app(state.clone());
    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, environment = ?server_config.environment, "whiteboard relay listening");

    let sessions = state.sessions.clone();
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down: closing rooms best-effort");
            sessions.shutdown().await;
        })
        .await
        .expect("server failed");
}
