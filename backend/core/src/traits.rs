use async_trait::async_trait;

use crate::alert::FraudAlert;
use crate::error::{ExtractionError, NotifyError, StoreError};
use crate::types::{IdentityRecord, StoredRecord};

/// Raw upload handed to the workflow.
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// Original file name, if the caller supplied one.
    pub filename: Option<String>,
    /// Declared content type, if the caller supplied one.
    pub content_type: Option<String>,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Turns a document image into an identity record.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Provider name for logging (e.g. "gemini").
    fn name(&self) -> &str;

    async fn extract(&self, image: &ImageInput) -> Result<IdentityRecord, ExtractionError>;
}

/// Durable set of accepted identity records, unique on `id_number`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up the record stored under `id_number`. Read-only.
    async fn find_by_id(&self, id_number: &str) -> Result<Option<IdentityRecord>, StoreError>;

    /// Insert a new record. Must fail with `DuplicateKey` when the id number
    /// is already present, independently of any earlier lookup.
    async fn insert(&self, record: &IdentityRecord) -> Result<(), StoreError>;

    /// Most recently accepted records first.
    async fn list(&self, limit: usize) -> Result<Vec<StoredRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Delivers fraud alerts to the configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send_alert(&self, alert: &FraudAlert) -> Result<(), NotifyError>;
}
