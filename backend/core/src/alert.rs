use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::IdentityRecord;

/// Reason attached to alerts raised by the duplicate check.
pub const DUPLICATE_ID_REASON: &str = "Duplicate identity number found";

/// Payload handed to the notifier when a candidate collides with a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudAlert {
    pub run_id: Uuid,
    pub candidate: IdentityRecord,
    pub matched: IdentityRecord,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
}

impl FraudAlert {
    pub fn duplicate(run_id: Uuid, candidate: IdentityRecord, matched: IdentityRecord) -> Self {
        Self {
            run_id,
            candidate,
            matched,
            reason: DUPLICATE_ID_REASON.to_string(),
            detected_at: Utc::now(),
        }
    }

    pub fn id_number(&self) -> &str {
        &self.candidate.id_number
    }

    /// Names of the fields on which the two records disagree.
    pub fn differing_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.candidate.full_name != self.matched.full_name {
            fields.push("full_name");
        }
        if self.candidate.birth_date != self.matched.birth_date {
            fields.push("birth_date");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reports_fields_that_disagree() {
        let day = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let a = IdentityRecord::new("X123", "Jane Doe", day).unwrap();
        let b = IdentityRecord::new("X123", "Janet Doe", day).unwrap();
        let alert = FraudAlert::duplicate(Uuid::new_v4(), a, b);
        assert_eq!(alert.differing_fields(), vec!["full_name"]);
        assert_eq!(alert.id_number(), "X123");
        assert_eq!(alert.reason, DUPLICATE_ID_REASON);
    }
}
