//! Gateway Health API

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::server::GatewayState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub uptime_seconds: u64,
    /// Stored record count; absent when the store cannot be reached.
    pub records: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`. Answers 503 when the store is unreachable.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthReport>) {
    let (code, status, records) = match state.store.count().await {
        Ok(n) => (StatusCode::OK, "ok", Some(n)),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the record store");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", None)
        }
    };
    (
        code,
        Json(HealthReport {
            status: status.into(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            records,
            timestamp: Utc::now(),
        }),
    )
}
