//! Per-run state tracking.

use idguard_core::{GuardError, WorkflowEvent, WorkflowState};
use idguard_logging::EventLogger;
use serde_json::Value;
use uuid::Uuid;

/// Tracks where a single run is in the state machine.
///
/// Every accepted transition is checked against
/// [`WorkflowState::can_transition_to`], recorded, and written to the
/// `workflow_events` log target.
#[derive(Debug)]
pub struct RunTracker {
    run_id: Uuid,
    state: WorkflowState,
    visited: Vec<WorkflowState>,
    events: Vec<WorkflowEvent>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: WorkflowState::Start,
            visited: vec![WorkflowState::Start],
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn states(&self) -> &[WorkflowState] {
        &self.visited
    }

    pub fn events(&self) -> &[WorkflowEvent] {
        &self.events
    }

    /// Move to `to`, refusing any transition the machine does not allow.
    pub fn advance(&mut self, to: WorkflowState, detail: Value) -> Result<(), GuardError> {
        if !self.state.can_transition_to(to) {
            return Err(GuardError::IllegalTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.record(to, detail);
        Ok(())
    }

    /// Force the run into `Failed` from wherever it is.
    ///
    /// Used only when the machine itself has been driven wrongly; a run that
    /// is already terminal is left alone.
    pub fn abort(&mut self, detail: Value) {
        if self.state != WorkflowState::Failed {
            self.record(WorkflowState::Failed, detail);
        }
    }

    fn record(&mut self, to: WorkflowState, detail: Value) {
        let event = WorkflowEvent::new(self.run_id, self.state, to, detail);
        EventLogger::log_transition(&event);
        self.state = to;
        self.visited.push(to);
        self.events.push(event);
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
