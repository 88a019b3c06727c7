use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ExtractionError;
use crate::event::WorkflowState;

/// One processed identity, keyed by `id_number`.
///
/// Built once from a successful extraction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id_number: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    /// Any further fields read off the document (address, birth place, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl IdentityRecord {
    /// Build a record, rejecting blank required fields.
    pub fn new(
        id_number: impl Into<String>,
        full_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Result<Self, ExtractionError> {
        let id_number = id_number.into().trim().to_string();
        let full_name = full_name.into().trim().to_string();

        let mut missing = Vec::new();
        if id_number.is_empty() {
            missing.push("id_number".to_string());
        }
        if full_name.is_empty() {
            missing.push("full_name".to_string());
        }
        if !missing.is_empty() {
            return Err(ExtractionError::MissingFields(missing));
        }

        Ok(Self {
            id_number,
            full_name,
            birth_date,
            attributes: BTreeMap::new(),
        })
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True when name and birth date agree with `other` as well as the id number.
    pub fn same_identity(&self, other: &IdentityRecord) -> bool {
        self.id_number == other.id_number
            && self.full_name == other.full_name
            && self.birth_date == other.birth_date
    }
}

/// A record as held by the store, with the time it was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub record: IdentityRecord,
    pub recorded_at: DateTime<Utc>,
}

/// How a candidate is compared against an existing record with the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPolicy {
    /// Any existing record with the same `id_number` is a match.
    #[default]
    IdNumber,
    /// Only a record whose id number, name, and birth date all agree is a match.
    FullRecord,
}

impl MatchPolicy {
    pub fn matches(&self, candidate: &IdentityRecord, existing: &IdentityRecord) -> bool {
        match self {
            MatchPolicy::IdNumber => candidate.id_number == existing.id_number,
            MatchPolicy::FullRecord => candidate.same_identity(existing),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::IdNumber => write!(f, "idNumber"),
            MatchPolicy::FullRecord => write!(f, "fullRecord"),
        }
    }
}

/// Terminal outcome of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Legitimate,
    FraudSuspected,
    ExtractionFailed,
    InternalError,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Legitimate => "legitimate",
            WorkflowStatus::FraudSuspected => "fraud_suspected",
            WorkflowStatus::ExtractionFailed => "extraction_failed",
            WorkflowStatus::InternalError => "internal_error",
        }
    }

    /// Whether the run ended in `FAILED` rather than `DONE`.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::ExtractionFailed | WorkflowStatus::InternalError
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when the fraud alert was handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered,
    Failed { reason: String },
}

/// The structured result surfaced to the caller. Built once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    pub status: WorkflowStatus,
    /// The candidate record, when extraction succeeded.
    pub record: Option<IdentityRecord>,
    /// The pre-existing record that triggered a fraud determination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<IdentityRecord>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOutcome>,
    /// States visited, from `Start` to the terminal one.
    pub states: Vec<WorkflowState>,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowResult {
    pub fn final_state(&self) -> Option<WorkflowState> {
        self.states.last().copied()
    }
}
