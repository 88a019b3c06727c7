//! Assembly of the caller-facing `WorkflowResult`.
//!
//! One constructor per terminal outcome. Identity numbers are masked in every
//! message since messages end up in logs and HTTP responses.

use chrono::Utc;
use idguard_core::{
    ExtractionError, IdentityRecord, NotificationOutcome, WorkflowResult, WorkflowStatus,
};
use idguard_logging::{mask_id_number, redact_sensitive_data};

use crate::machine::RunTracker;

fn base(run: &RunTracker, status: WorkflowStatus, message: String) -> WorkflowResult {
    WorkflowResult {
        run_id: run.run_id(),
        status,
        record: None,
        matched: None,
        message,
        notification: None,
        states: run.states().to_vec(),
        completed_at: Utc::now(),
    }
}

pub fn legitimate(run: &RunTracker, record: IdentityRecord) -> WorkflowResult {
    let message = format!(
        "Identity {} verified and recorded as legitimate.",
        mask_id_number(&record.id_number)
    );
    WorkflowResult {
        record: Some(record),
        ..base(run, WorkflowStatus::Legitimate, message)
    }
}

pub fn fraud_suspected(
    run: &RunTracker,
    candidate: IdentityRecord,
    matched: IdentityRecord,
    notification: NotificationOutcome,
) -> WorkflowResult {
    let delivery = match &notification {
        NotificationOutcome::Delivered => "Security team alerted.".to_string(),
        NotificationOutcome::Failed { reason } => {
            format!("Alert delivery failed: {reason}.")
        }
    };
    let message = format!(
        "Identity number {} is already on record; fraud suspected. {}",
        mask_id_number(&candidate.id_number),
        delivery
    );
    WorkflowResult {
        record: Some(candidate),
        matched: Some(matched),
        notification: Some(notification),
        ..base(run, WorkflowStatus::FraudSuspected, message)
    }
}

/// The error text is scrubbed of keys and identity numbers, since the
/// message goes back to the uploader.
pub fn extraction_failed(run: &RunTracker, err: &ExtractionError) -> WorkflowResult {
    base(
        run,
        WorkflowStatus::ExtractionFailed,
        format!(
            "Extraction failed: could not read the document ({}).",
            redact_sensitive_data(&err.to_string())
        ),
    )
}

/// `phase` names what the run was doing, e.g. "checking for duplicates".
pub fn internal_error(
    run: &RunTracker,
    record: Option<IdentityRecord>,
    phase: &str,
    detail: &str,
) -> WorkflowResult {
    WorkflowResult {
        record,
        ..base(
            run,
            WorkflowStatus::InternalError,
            format!("Internal error while {phase}: {detail}"),
        )
    }
}
