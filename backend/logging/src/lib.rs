//! Telemetry and structured logging components for IdGuard.
//!
//! Handles subscriber setup with daily NDJSON rotation, PII and secret
//! redaction, and per-transition workflow event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, TransitionLogEntry};
pub use logger::{init_logger, LogGuard};
pub use redact::{mask_id_number, redact_sensitive_data};
