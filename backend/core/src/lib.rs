pub mod alert;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use alert::FraudAlert;
pub use error::{ExtractionError, GuardError, NotifyError, StoreError};
pub use event::{WorkflowEvent, WorkflowState};
pub use traits::{Extractor, ImageInput, Notifier, RecordStore};
pub use types::{
    IdentityRecord, MatchPolicy, NotificationOutcome, StoredRecord, WorkflowResult,
    WorkflowStatus,
};
