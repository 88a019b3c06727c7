/// Notifier that only writes the alert to the log.
///
/// Used when no transport is configured, so a fraud determination is never
/// silently dropped.
use async_trait::async_trait;
use idguard_core::{FraudAlert, NotifyError, Notifier};
use idguard_logging::mask_id_number;
use tracing::warn;

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_alert(&self, alert: &FraudAlert) -> Result<(), NotifyError> {
        warn!(
            target: "fraud_alerts",
            run_id = %alert.run_id,
            id_number = %mask_id_number(alert.id_number()),
            reason = %alert.reason,
            differing = ?alert.differing_fields(),
            "Fraud alert raised"
        );
        Ok(())
    }
}
