//! Wiring of runtime components from the loaded `IdGuardConfig`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use idguard_config::{IdGuardConfig, MatchPolicyKind, NotifyKind, VisionProviderKind};
use idguard_core::{MatchPolicy, Notifier};
use idguard_notify::{EmailRelayConfig, EmailRelayNotifier, LogNotifier, WebhookNotifier};
use idguard_store::SqliteRecordStore;
use idguard_understanding::{VisionExtractor, VisionProvider};
use idguard_workflow::Orchestrator;
use tracing::info;

pub fn match_policy(config: &IdGuardConfig) -> MatchPolicy {
    match config.match_policy() {
        MatchPolicyKind::IdNumber => MatchPolicy::IdNumber,
        MatchPolicyKind::FullRecord => MatchPolicy::FullRecord,
    }
}

pub fn open_store(config: &IdGuardConfig) -> Result<SqliteRecordStore> {
    let path = config.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    SqliteRecordStore::open(&path, config.busy_timeout())
}

pub fn build_extractor(config: &IdGuardConfig) -> Result<VisionExtractor> {
    let vision = config.vision.clone().unwrap_or_default();
    let Some(api_key) = vision.api_key.filter(|k| !k.trim().is_empty()) else {
        bail!(
            "No vision API key configured; set {} or vision.apiKey",
            match config.vision_provider() {
                VisionProviderKind::Gemini => "GOOGLE_API_KEY",
                VisionProviderKind::OpenAi => "OPENAI_API_KEY",
            }
        );
    };

    let mut provider = match config.vision_provider() {
        VisionProviderKind::Gemini => VisionProvider::gemini(api_key),
        VisionProviderKind::OpenAi => VisionProvider::openai(api_key),
    };
    if let Some(model) = vision.model {
        provider = provider.with_model(model);
    }
    if let Some(url) = vision.base_url {
        provider = provider.with_base_url(url);
    }
    if let Some(t) = vision.temperature {
        provider = provider.with_temperature(t);
    }
    info!(provider = provider.name(), "Vision extractor configured");
    VisionExtractor::new(provider, config.vision_timeout())
}

pub fn build_notifier(config: &IdGuardConfig) -> Result<Arc<dyn Notifier>> {
    let notify = config.notify.clone().unwrap_or_default();
    let endpoint = || {
        notify
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .context("notify.endpoint is required")
    };

    let notifier: Arc<dyn Notifier> = match config.notify_kind() {
        NotifyKind::Email => Arc::new(EmailRelayNotifier::new(EmailRelayConfig {
            endpoint: endpoint()?,
            api_key: notify.api_key.clone(),
            sender: notify.sender.clone().context("notify.sender is required")?,
            recipient: notify.recipient.clone().context("notify.recipient is required")?,
            timeout: config.notify_timeout(),
        })?),
        NotifyKind::Webhook => Arc::new(WebhookNotifier::new(endpoint()?, config.notify_timeout())?),
        NotifyKind::Log => Arc::new(LogNotifier::default()),
    };
    info!(notifier = notifier.name(), "Notifier configured");
    Ok(notifier)
}

pub fn build_orchestrator(config: &IdGuardConfig) -> Result<Orchestrator> {
    let extractor = build_extractor(config)?;
    let store = open_store(config)?;
    let notifier = build_notifier(config)?;
    Ok(
        Orchestrator::new(Arc::new(extractor), Arc::new(store), notifier)
            .with_policy(match_policy(config)),
    )
}
