//! HTTP serving layer.
//!
//! Exposes the chat UI and the two JSON endpoints: `POST /get_response` for
//! messages and `POST /upload_file` for attachments. State is loaded once at
//! startup; a missing or unreadable model artifact degrades the server to
//! AI-fallback-only instead of refusing to start, so a bad training run never
//! takes the chat offline.

pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use log::{error, info};

use crate::ai::GeminiClient;
use crate::error::Result;
use crate::model::ModelArtifact;

/// Minimum classifier confidence (exclusive) for a canned reply.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Everything the serve command needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `127.0.0.1:5000`.
    pub bind: String,
    /// Path of the trained model artifact.
    pub model_path: PathBuf,
    /// Directory for stored uploads.
    pub uploads_dir: PathBuf,
}

/// Shared state behind every handler.
#[derive(Debug)]
pub struct AppState {
    /// Trained model, or `None` when loading failed at startup.
    pub model: Option<ModelArtifact>,
    /// Remote fallback client.
    pub ai: GeminiClient,
    /// Directory uploads are written to.
    pub uploads_dir: PathBuf,
}

/// Load handler state from the configuration.
///
/// A model that fails to load is logged and dropped; every message is then
/// routed to the AI fallback.
pub fn load_state(config: &ServerConfig) -> AppState {
    let model = match ModelArtifact::load(&config.model_path) {
        Ok(artifact) => {
            info!(
                "loaded model {} ({} intents, {} responses)",
                config.model_path.display(),
                artifact.metadata.labels.len(),
                artifact.responses.len()
            );
            Some(artifact)
        }
        Err(e) => {
            error!(
                "could not load model {}: {e}; all messages go to the AI fallback",
                config.model_path.display()
            );
            None
        }
    };

    AppState {
        model,
        ai: GeminiClient::from_env(),
        uploads_dir: config.uploads_dir.clone(),
    }
}

/// Assemble the application router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/get_response", post(handlers::get_response))
        .route(
            "/upload_file",
            // The handler checks the 15 MB ceiling itself while it streams
            // the field, so every refusal carries the scripted message.
            post(handlers::upload_file).route_layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

/// Run the server until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = Arc::new(load_state(&config));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("listening on {}", config.bind);
    axum::serve(listener, router).await?;
    Ok(())
}
