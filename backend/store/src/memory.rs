use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use idguard_core::{IdentityRecord, RecordStore, StoreError, StoredRecord};

/// In-memory record store for tests and ephemeral runs.
///
/// The write lock covers the existence check and the insert together, so
/// the uniqueness check is atomic per `id_number`.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    entries: Arc<RwLock<HashMap<String, (u64, StoredRecord)>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_id(&self, id_number: &str) -> Result<Option<IdentityRecord>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(id_number).map(|(_, stored)| stored.record.clone()))
    }

    async fn insert(&self, record: &IdentityRecord) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if entries.contains_key(&record.id_number) {
            return Err(StoreError::DuplicateKey(record.id_number.clone()));
        }
        let seq = entries.len() as u64;
        entries.insert(
            record.id_number.clone(),
            (
                seq,
                StoredRecord {
                    record: record.clone(),
                    recorded_at: Utc::now(),
                },
            ),
        );
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredRecord>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let mut rows: Vec<&(u64, StoredRecord)> = entries.values().collect();
        // Newest first
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(_, stored)| stored.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.len())
    }
}
