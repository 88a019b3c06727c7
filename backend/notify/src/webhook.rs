/// Chat-style incoming webhook notifier (Slack, Mattermost, Google Chat...).
///
/// Posts `{"text": "..."}` to the configured URL.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use idguard_core::{FraudAlert, NotifyError, Notifier};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::render::render_alert;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

pub struct WebhookNotifier {
    url: String,
    http_client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for webhook")?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send_alert(&self, alert: &FraudAlert) -> Result<(), NotifyError> {
        let rendered = render_alert(alert);
        let text = format!("*{}*\n{}", rendered.subject, rendered.text);

        let res = self
            .http_client
            .post(&self.url)
            .json(&WebhookPayload { text: &text })
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let err = res.text().await.unwrap_or_default();
            error!("[Webhook] Alert post failed ({}): {}", status, err);
            return Err(NotifyError::Delivery(format!("webhook returned {status}: {err}")));
        }
        info!("[Webhook] Fraud alert posted for run {}", alert.run_id);
        Ok(())
    }
}
