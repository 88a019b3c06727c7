//! Workflow Event Logger
//!
//! Every state transition of a run is emitted as one structured line under
//! the `workflow_events` target, with identity numbers masked.

use chrono::{DateTime, Utc};
use idguard_core::{WorkflowEvent, WorkflowState};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
pub struct TransitionLogEntry {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub detail: String,
}

impl From<&WorkflowEvent> for TransitionLogEntry {
    fn from(event: &WorkflowEvent) -> Self {
        Self {
            run_id: event.run_id.to_string(),
            timestamp: event.timestamp,
            from: event.from,
            to: event.to,
            detail: redact_sensitive_data(&event.detail.to_string()),
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Log a transition, redacting its detail payload first.
    pub fn log_transition(event: &WorkflowEvent) -> TransitionLogEntry {
        let entry = TransitionLogEntry::from(event);
        info!(
            target: "workflow_events",
            run_id = %entry.run_id,
            from = %entry.from,
            to = %entry.to,
            detail = %entry.detail,
            "Workflow transition"
        );
        entry
    }
}
