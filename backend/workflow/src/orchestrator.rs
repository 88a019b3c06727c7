//! The workflow runner.
//!
//! Drives one uploaded image through
//! `Start → Extracting → Checking → (Notifying | Persisting) → Done`, ending
//! in `Failed` when a step cannot complete. Collaborator errors and panics are
//! caught here and turned into a terminal `WorkflowResult`; nothing escapes
//! to the caller.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use idguard_core::{
    ExtractionError, Extractor, FraudAlert, GuardError, IdentityRecord, ImageInput, MatchPolicy,
    NotificationOutcome, Notifier, RecordStore, StoreError, WorkflowResult, WorkflowState,
};
use idguard_logging::{mask_id_number, redact_sensitive_data};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::duplicate::is_duplicate;
use crate::machine::RunTracker;
use crate::outcome;

/// Await a collaborator call, turning a panic into an `Err` with its message.
async fn guarded<F: Future>(fut: F) -> Result<F::Output, String> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Extractors are free to build records directly, so the required fields are
/// checked again before anything reaches the store.
fn validate_candidate(record: &IdentityRecord) -> Result<(), ExtractionError> {
    let mut missing = Vec::new();
    if record.id_number.trim().is_empty() {
        missing.push("id_number".to_string());
    }
    if record.full_name.trim().is_empty() {
        missing.push("full_name".to_string());
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExtractionError::MissingFields(missing))
    }
}

pub struct Orchestrator {
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    policy: MatchPolicy,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            extractor,
            store,
            notifier,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    /// Run the workflow for one image. Always returns a result.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty, bytes = image.bytes.len()))]
    pub async fn run(&self, image: ImageInput) -> WorkflowResult {
        let mut run = RunTracker::new();
        tracing::Span::current().record("run_id", tracing::field::display(run.run_id()));
        info!(
            extractor = self.extractor.name(),
            notifier = self.notifier.name(),
            policy = %self.policy,
            "Workflow started"
        );

        let result = match self.drive(&mut run, &image).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, state = %run.state(), "Workflow state machine misused");
                run.abort(json!({ "error": err.to_string() }));
                outcome::internal_error(&run, None, "running the workflow", "unexpected state")
            }
        };

        info!(status = %result.status, "Workflow finished");
        result
    }

    async fn drive(
        &self,
        run: &mut RunTracker,
        image: &ImageInput,
    ) -> Result<WorkflowResult, GuardError> {
        run.advance(
            WorkflowState::Extracting,
            json!({ "extractor": self.extractor.name(), "bytes": image.bytes.len() }),
        )?;

        let extracted = if image.bytes.is_empty() {
            Ok(Err(ExtractionError::UnsupportedImage("empty upload".to_string())))
        } else {
            guarded(self.extractor.extract(image)).await
        };
        let candidate = match extracted {
            Ok(Ok(record)) => match validate_candidate(&record) {
                Ok(()) => record,
                Err(err) => return self.extraction_failed(run, err),
            },
            Ok(Err(err)) => return self.extraction_failed(run, err),
            Err(panic) => {
                error!(panic = %panic, "Extractor panicked");
                run.advance(WorkflowState::Failed, json!({ "error": "extractor panicked" }))?;
                return Ok(outcome::internal_error(
                    run,
                    None,
                    "extracting the document",
                    "the extraction service failed unexpectedly",
                ));
            }
        };

        run.advance(
            WorkflowState::Checking,
            json!({ "id_number": mask_id_number(&candidate.id_number) }),
        )?;

        let matched = match guarded(is_duplicate(&candidate, self.store.as_ref(), self.policy)).await
        {
            Ok(Ok(matched)) => matched,
            Ok(Err(err)) => {
                error!(error = %err, "Duplicate lookup failed");
                run.advance(WorkflowState::Failed, json!({ "error": err.to_string() }))?;
                return Ok(outcome::internal_error(
                    run,
                    Some(candidate),
                    "checking for duplicates",
                    &err.to_string(),
                ));
            }
            Err(panic) => {
                error!(panic = %panic, "Record store panicked during lookup");
                run.advance(WorkflowState::Failed, json!({ "error": "record store panicked" }))?;
                return Ok(outcome::internal_error(
                    run,
                    Some(candidate),
                    "checking for duplicates",
                    "the record store failed unexpectedly",
                ));
            }
        };

        match matched {
            Some(existing) => self.notify(run, candidate, existing).await,
            None => self.persist(run, candidate).await,
        }
    }

    fn extraction_failed(
        &self,
        run: &mut RunTracker,
        err: ExtractionError,
    ) -> Result<WorkflowResult, GuardError> {
        let detail = redact_sensitive_data(&err.to_string());
        warn!(error = %detail, "Extraction failed");
        run.advance(WorkflowState::Failed, json!({ "error": detail }))?;
        Ok(outcome::extraction_failed(run, &err))
    }

    async fn notify(
        &self,
        run: &mut RunTracker,
        candidate: IdentityRecord,
        existing: IdentityRecord,
    ) -> Result<WorkflowResult, GuardError> {
        run.advance(
            WorkflowState::Notifying,
            json!({ "notifier": self.notifier.name() }),
        )?;
        warn!(
            id_number = %mask_id_number(&candidate.id_number),
            "Duplicate identity number detected"
        );

        let alert = FraudAlert::duplicate(run.run_id(), candidate.clone(), existing.clone());
        let notification = match guarded(self.notifier.send_alert(&alert)).await {
            Ok(Ok(())) => NotificationOutcome::Delivered,
            Ok(Err(err)) => {
                warn!(error = %err, "Fraud alert delivery failed");
                NotificationOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Err(panic) => {
                error!(panic = %panic, "Notifier panicked");
                NotificationOutcome::Failed {
                    reason: "notifier failed unexpectedly".to_string(),
                }
            }
        };

        run.advance(
            WorkflowState::Done,
            json!({ "notification": &notification }),
        )?;
        Ok(outcome::fraud_suspected(run, candidate, existing, notification))
    }

    async fn persist(
        &self,
        run: &mut RunTracker,
        candidate: IdentityRecord,
    ) -> Result<WorkflowResult, GuardError> {
        run.advance(WorkflowState::Persisting, json!({}))?;

        match guarded(self.store.insert(&candidate)).await {
            Ok(Ok(())) => {
                run.advance(WorkflowState::Done, json!({}))?;
                Ok(outcome::legitimate(run, candidate))
            }
            Ok(Err(err)) => {
                let detail = match (&err, self.policy) {
                    (StoreError::DuplicateKey(_), MatchPolicy::IdNumber) => {
                        warn!("Identity number was stored by a concurrent run");
                        "the identity number was recorded by a concurrent submission".to_string()
                    }
                    (StoreError::DuplicateKey(_), MatchPolicy::FullRecord) => {
                        warn!("Identity number is on file with different details");
                        "the identity number is already on file with different details".to_string()
                    }
                    (StoreError::Unavailable(_), _) => {
                        error!(error = %err, "Insert failed");
                        err.to_string()
                    }
                };
                let logged = redact_sensitive_data(&err.to_string());
                run.advance(WorkflowState::Failed, json!({ "error": logged }))?;
                Ok(outcome::internal_error(
                    run,
                    Some(candidate),
                    "recording the identity",
                    &detail,
                ))
            }
            Err(panic) => {
                error!(panic = %panic, "Record store panicked during insert");
                run.advance(WorkflowState::Failed, json!({ "error": "record store panicked" }))?;
                Ok(outcome::internal_error(
                    run,
                    Some(candidate),
                    "recording the identity",
                    "the record store failed unexpectedly",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use idguard_core::{NotifyError, StoredRecord, WorkflowStatus};
    use idguard_store::InMemoryRecordStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Barrier;
    use WorkflowState::*;

    fn record(id: &str, name: &str, year: i32) -> IdentityRecord {
        IdentityRecord::new(id, name, NaiveDate::from_ymd_opt(year, 1, 1).unwrap()).unwrap()
    }

    fn image() -> ImageInput {
        ImageInput::new(vec![0x89, b'P', b'N', b'G']).with_filename("card.png")
    }

    /// Returns a fixed outcome for every call.
    struct ScriptedExtractor {
        outcome: Result<IdentityRecord, ExtractionError>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn ok(record: IdentityRecord) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(record),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(err: ExtractionError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(err),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn extract(&self, _image: &ImageInput) -> Result<IdentityRecord, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct PanickingExtractor;

    #[async_trait]
    impl Extractor for PanickingExtractor {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn extract(&self, _image: &ImageInput) -> Result<IdentityRecord, ExtractionError> {
            panic!("vision client blew up")
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<FraudAlert>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<FraudAlert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_alert(&self, alert: &FraudAlert) -> Result<(), NotifyError> {
            self.alerts.lock().unwrap().push(alert.clone());
            if self.fail {
                Err(NotifyError::Delivery("relay refused connection".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Wraps a store, counting writes and optionally failing every call.
    struct InstrumentedStore {
        inner: InMemoryRecordStore,
        inserts: AtomicUsize,
        unavailable: bool,
        lookup_barrier: Option<Barrier>,
    }

    impl InstrumentedStore {
        fn new(inner: InMemoryRecordStore) -> Self {
            Self {
                inner,
                inserts: AtomicUsize::new(0),
                unavailable: false,
                lookup_barrier: None,
            }
        }
    }

    #[async_trait]
    impl RecordStore for InstrumentedStore {
        async fn find_by_id(&self, id_number: &str) -> Result<Option<IdentityRecord>, StoreError> {
            if self.unavailable {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            let found = self.inner.find_by_id(id_number).await;
            if let Some(barrier) = &self.lookup_barrier {
                barrier.wait().await;
            }
            found
        }

        async fn insert(&self, record: &IdentityRecord) -> Result<(), StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            self.inner.insert(record).await
        }

        async fn list(&self, limit: usize) -> Result<Vec<StoredRecord>, StoreError> {
            self.inner.list(limit).await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            self.inner.count().await
        }
    }

    fn orchestrator(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> Orchestrator {
        Orchestrator::new(extractor, store, notifier)
    }

    #[tokio::test]
    async fn new_identity_is_recorded_as_legitimate() {
        let store = Arc::new(InMemoryRecordStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let candidate = record("X123", "Jane Doe", 1990);
        let orch = orchestrator(
            ScriptedExtractor::ok(candidate.clone()),
            store.clone(),
            notifier.clone(),
        );

        let result = orch.run(image()).await;

        assert_eq!(result.status, WorkflowStatus::Legitimate);
        assert_eq!(result.record, Some(candidate.clone()));
        assert_eq!(result.states, vec![Start, Extracting, Checking, Persisting, Done]);
        assert_eq!(store.find_by_id("X123").await.unwrap(), Some(candidate));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn resubmission_is_flagged_and_store_unchanged() {
        let store = Arc::new(InMemoryRecordStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let candidate = record("X123", "Jane Doe", 1990);
        let orch = orchestrator(
            ScriptedExtractor::ok(candidate.clone()),
            store.clone(),
            notifier.clone(),
        );

        assert_eq!(orch.run(image()).await.status, WorkflowStatus::Legitimate);
        let second = orch.run(image()).await;

        assert_eq!(second.status, WorkflowStatus::FraudSuspected);
        assert_eq!(second.states, vec![Start, Extracting, Checking, Notifying, Done]);
        assert_eq!(second.notification, Some(NotificationOutcome::Delivered));
        assert_eq!(store.count().await.unwrap(), 1);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].candidate, candidate);
        assert_eq!(sent[0].matched, candidate);
    }

    #[tokio::test]
    async fn same_id_with_different_details_is_still_fraud() {
        let inner = InMemoryRecordStore::new();
        let original = record("X123", "Jane Doe", 1990);
        inner.insert(&original).await.unwrap();
        let store = Arc::new(inner);
        let notifier = Arc::new(RecordingNotifier::default());
        let impostor = record("X123", "John Roe", 1985);
        let orch = orchestrator(
            ScriptedExtractor::ok(impostor.clone()),
            store.clone(),
            notifier.clone(),
        );

        let result = orch.run(image()).await;

        assert_eq!(result.status, WorkflowStatus::FraudSuspected);
        assert_eq!(result.record, Some(impostor.clone()));
        assert_eq!(result.matched, Some(original.clone()));
        let sent = notifier.sent();
        assert_eq!(sent[0].matched, original);
        assert_eq!(sent[0].candidate, impostor);
        assert_eq!(store.find_by_id("X123").await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn extraction_failure_never_touches_the_store() {
        let store = Arc::new(InstrumentedStore::new(InMemoryRecordStore::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(
            ScriptedExtractor::err(ExtractionError::MissingFields(vec!["id_number".into()])),
            store.clone(),
            notifier.clone(),
        );

        let result = orch.run(image()).await;

        assert_eq!(result.status, WorkflowStatus::ExtractionFailed);
        assert_eq!(result.states, vec![Start, Extracting, Failed]);
        assert!(result.record.is_none());
        assert!(result.message.contains("could not read the document"));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_keeps_api_key_out_of_result() {
        let store = Arc::new(InMemoryRecordStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(
            ScriptedExtractor::err(ExtractionError::Provider(
                "error sending request for url (http://vision.local/v1?key=SECRET123)".into(),
            )),
            store,
            notifier,
        );

        let result = orch.run(image()).await;

        assert_eq!(result.status, WorkflowStatus::ExtractionFailed);
        assert!(!result.message.contains("SECRET123"));
    }

    #[tokio::test]
    async fn blank_fields_from_extractor_are_rejected() {
        let store = Arc::new(InMemoryRecordStore::new());
        let blank = IdentityRecord {
            id_number: "  ".into(),
            full_name: "Jane".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            attributes: Default::default(),
        };
        let orch = orchestrator(
            ScriptedExtractor::ok(blank),
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        let result = orch.run(image()).await;
        assert_eq!(result.status, WorkflowStatus::ExtractionFailed);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_upload_skips_the_extractor() {
        let extractor = ScriptedExtractor::ok(record("X1", "A", 1990));
        let orch = orchestrator(
            extractor.clone(),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(RecordingNotifier::default()),
        );

        let result = orch.run(ImageInput::new(Vec::new())).await;
        assert_eq!(result.status, WorkflowStatus::ExtractionFailed);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extractor_panic_is_an_internal_error() {
        let orch = orchestrator(
            Arc::new(PanickingExtractor),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(RecordingNotifier::default()),
        );

        let result = orch.run(image()).await;
        assert_eq!(result.status, WorkflowStatus::InternalError);
        assert_eq!(result.final_state(), Some(Failed));
        assert!(!result.message.contains("blew up"));
    }

    #[tokio::test]
    async fn unavailable_store_is_an_internal_error() {
        let mut store = InstrumentedStore::new(InMemoryRecordStore::new());
        store.unavailable = true;
        let store = Arc::new(store);
        let orch = orchestrator(
            ScriptedExtractor::ok(record("X123", "Jane", 1990)),
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        let result = orch.run(image()).await;
        assert_eq!(result.status, WorkflowStatus::InternalError);
        assert_eq!(result.states, vec![Start, Extracting, Checking, Failed]);
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_alert_delivery_keeps_fraud_status() {
        let inner = InMemoryRecordStore::new();
        inner.insert(&record("X123", "Jane", 1990)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::failing());
        let orch = orchestrator(
            ScriptedExtractor::ok(record("X123", "Jane", 1990)),
            Arc::new(inner),
            notifier.clone(),
        );

        let result = orch.run(image()).await;

        assert_eq!(result.status, WorkflowStatus::FraudSuspected);
        assert_eq!(result.final_state(), Some(Done));
        assert!(result.message.contains("relay refused connection"));
        assert!(matches!(
            result.notification,
            Some(NotificationOutcome::Failed { .. })
        ));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn racing_submissions_never_both_pass() {
        let mut store = InstrumentedStore::new(InMemoryRecordStore::new());
        // Both runs finish their lookup before either inserts.
        store.lookup_barrier = Some(Barrier::new(2));
        let store = Arc::new(store);
        let orch = Arc::new(orchestrator(
            ScriptedExtractor::ok(record("R1", "Racer", 1990)),
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        ));

        let (a, b) = tokio::join!(
            {
                let orch = Arc::clone(&orch);
                async move { orch.run(image()).await }
            },
            {
                let orch = Arc::clone(&orch);
                async move { orch.run(image()).await }
            }
        );

        let legitimate = [&a, &b]
            .iter()
            .filter(|r| r.status == WorkflowStatus::Legitimate)
            .count();
        assert_eq!(legitimate, 1);
        let loser = if a.status == WorkflowStatus::Legitimate { &b } else { &a };
        assert_eq!(loser.status, WorkflowStatus::InternalError);
        assert_eq!(loser.states, vec![Start, Extracting, Checking, Persisting, Failed]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lookup_has_no_side_effects() {
        let inner = InMemoryRecordStore::new();
        inner.insert(&record("X123", "Jane", 1990)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(
            ScriptedExtractor::ok(record("X123", "Jane", 1990)),
            Arc::new(inner),
            notifier.clone(),
        );

        for _ in 0..3 {
            assert_eq!(orch.run(image()).await.status, WorkflowStatus::FraudSuspected);
        }
        assert_eq!(orch.store().count().await.unwrap(), 1);
        assert_eq!(notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn full_record_policy_turns_conflicting_details_into_internal_error() {
        let inner = InMemoryRecordStore::new();
        inner.insert(&record("X123", "Jane", 1990)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(
            ScriptedExtractor::ok(record("X123", "John", 1970)),
            Arc::new(inner),
            notifier.clone(),
        )
        .with_policy(MatchPolicy::FullRecord);

        let result = orch.run(image()).await;
        assert_eq!(result.status, WorkflowStatus::InternalError);
        assert_eq!(result.final_state(), Some(Failed));
        assert!(result.message.contains("already on file with different details"));
        assert!(!result.message.contains("concurrent"));
        assert!(notifier.sent().is_empty());
        assert_eq!(orch.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn every_run_gets_its_own_id() {
        let orch = orchestrator(
            ScriptedExtractor::err(ExtractionError::Malformed("x".into())),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(RecordingNotifier::default()),
        );
        let a = orch.run(image()).await;
        let b = orch.run(image()).await;
        assert_ne!(a.run_id, b.run_id);
    }
}
