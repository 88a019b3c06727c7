//! Duplicate-detection policy.

use idguard_core::{IdentityRecord, MatchPolicy, RecordStore, StoreError};
use tracing::debug;

/// Look for a stored record that the candidate collides with.
///
/// The lookup is keyed on `id_number`; `policy` then decides whether the
/// stored record counts as a match. Read-only: the store is never written here.
pub async fn is_duplicate(
    candidate: &IdentityRecord,
    store: &dyn RecordStore,
    policy: MatchPolicy,
) -> Result<Option<IdentityRecord>, StoreError> {
    let existing = store.find_by_id(&candidate.id_number).await?;
    let matched = existing.filter(|stored| policy.matches(candidate, stored));
    debug!(policy = %policy, matched = matched.is_some(), "Duplicate check finished");
    Ok(matched)
}
