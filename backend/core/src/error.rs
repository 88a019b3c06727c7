use thiserror::Error;

/// Why the extraction service could not produce a usable identity record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The payload is not an image we can send to the vision model.
    #[error("unsupported image payload: {0}")]
    UnsupportedImage(String),

    /// The model refused the document (bad quality, failed layout checks).
    #[error("document rejected: {reason}")]
    Rejected { reason: String },

    /// One or more of the required fields were missing or empty.
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A field was present but could not be interpreted.
    #[error("invalid field {field}: {message}")]
    InvalidField { field: String, message: String },

    /// The model answered with something that is not the expected JSON.
    #[error("malformed extraction response: {0}")]
    Malformed(String),

    /// The provider call itself failed (transport, auth, quota).
    #[error("extraction provider error: {0}")]
    Provider(String),
}

/// Record store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// Insert hit the uniqueness constraint on `id_number`.
    #[error("duplicate key: identity number {0} already stored")]
    DuplicateKey(String),
}

/// Notifier failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

/// Top-level error type for the IdGuard runtime.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// The orchestrator attempted a transition its state machine forbids.
    #[error("illegal workflow transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
