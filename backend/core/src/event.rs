use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// States of the identity workflow.
///
/// `Start → Extracting → Checking → (Notifying | Persisting) → Done`, with
/// `Failed` reachable from any non-terminal state after `Start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Start,
    Extracting,
    Checking,
    Notifying,
    Persisting,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Start, Extracting)
                | (Extracting, Checking)
                | (Extracting, Failed)
                | (Checking, Notifying)
                | (Checking, Persisting)
                | (Checking, Failed)
                | (Notifying, Done)
                | (Persisting, Done)
                | (Persisting, Failed)
        )
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

/// A single recorded state transition within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub detail: serde_json::Value,
}

impl WorkflowEvent {
    pub fn new(
        run_id: Uuid,
        from: WorkflowState,
        to: WorkflowState,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            run_id,
            timestamp: Utc::now(),
            from,
            to,
            detail,
        }
    }
}
