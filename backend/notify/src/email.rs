/// E-mail alerts through an HTTP mail relay.
///
/// The relay receives one JSON document per alert and owns SMTP delivery:
///
/// ```json
/// { "from": "...", "to": ["..."], "subject": "...", "html": "...", "text": "..." }
/// ```
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use idguard_core::{FraudAlert, NotifyError, Notifier};
use idguard_logging::mask_id_number;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::render::render_alert;

#[derive(Debug, Clone)]
pub struct EmailRelayConfig {
    /// Relay endpoint, e.g. `https://mail.example.com/v1/send`.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub sender: String,
    /// Fixed recipient of every alert.
    pub recipient: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

pub struct EmailRelayNotifier {
    config: EmailRelayConfig,
    http_client: Client,
}

impl EmailRelayNotifier {
    pub fn new(config: EmailRelayConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client for mail relay")?;
        Ok(Self { config, http_client })
    }
}

#[async_trait]
impl Notifier for EmailRelayNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send_alert(&self, alert: &FraudAlert) -> Result<(), NotifyError> {
        let rendered = render_alert(alert);
        let body = RelayMessage {
            from: format!("ID Check Security System <{}>", self.config.sender),
            to: [self.config.recipient.as_str()],
            subject: &rendered.subject,
            html: &rendered.html,
            text: &rendered.text,
        };

        let mut request = self.http_client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(|e| {
            error!("[Email] Relay request failed: {}", e);
            NotifyError::Delivery(e.to_string())
        })?;

        if !res.status().is_success() {
            let status = res.status();
            let err = res.text().await.unwrap_or_default();
            error!("[Email] Relay rejected alert ({}): {}", status, err);
            return Err(NotifyError::Delivery(format!("relay returned {status}: {err}")));
        }

        info!(
            "[Email] Fraud alert for {} sent to {}",
            mask_id_number(alert.id_number()),
            self.config.recipient
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use idguard_core::IdentityRecord;
    use uuid::Uuid;

    #[tokio::test]
    async fn unreachable_relay_is_delivery_error() {
        let notifier = EmailRelayNotifier::new(EmailRelayConfig {
            endpoint: "http://127.0.0.1:9/send".into(),
            api_key: None,
            sender: "alerts@example.com".into(),
            recipient: "security@example.com".into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let rec = IdentityRecord::new("X123", "Jane Doe", NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .unwrap();
        let alert = FraudAlert::duplicate(Uuid::new_v4(), rec.clone(), rec);

        let err = notifier.send_alert(&alert).await.unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
    }
}
