//! Operator listing of stored records.
//!
//! Identity numbers leave the server masked; the full values are only
//! available through the local `idguard records` command.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use idguard_core::StoredRecord;
use idguard_logging::mask_id_number;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::server::GatewayState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecordsPage {
    pub total: usize,
    pub records: Vec<StoredRecord>,
}

fn masked(mut stored: StoredRecord) -> StoredRecord {
    stored.record.id_number = mask_id_number(&stored.record.id_number);
    stored
}

/// Handler for `GET /api/records?limit=N`, newest first.
pub async fn list_records(
    State(state): State<GatewayState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordsPage>, (StatusCode, Json<serde_json::Value>)> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let listed = async {
        let total = state.store.count().await?;
        let records = state
            .store
            .list(limit)
            .await?
            .into_iter()
            .map(masked)
            .collect();
        Ok::<_, idguard_core::StoreError>(RecordsPage { total, records })
    }
    .await;

    listed.map(Json).map_err(|e| {
        error!(error = %e, "Listing records failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string() })),
        )
    })
}
