//! Main HTTP server and routing.

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use idguard_core::RecordStore;
use idguard_workflow::Orchestrator;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::{health_api, records_api, upload, upload_page};

/// How uploads are accepted and whether they are kept on disk.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_bytes: usize,
    /// Directory to keep uploaded files in; `None` discards them after the run.
    pub keep_dir: Option<PathBuf>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024 * 1024,
            keep_dir: None,
        }
    }
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn RecordStore>,
    pub uploads: UploadSettings,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(orchestrator: Arc<Orchestrator>, uploads: UploadSettings) -> Self {
        let store = orchestrator.store();
        Self {
            orchestrator,
            store,
            uploads,
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.uploads.max_bytes;
    Router::new()
        .route("/", get(upload_page::index))
        .route("/upload", post(upload::upload_document))
        .route("/api/health", get(health_api::get_health))
        .route("/api/records", get(records_api::list_records))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
