//! IdGuard runtime configuration schema.
//!
//! Every section and field is optional in the file; `defaults` fills the
//! gaps and the accessors on [`IdGuardConfig`] read the resolved values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdGuardConfig {
    /// HTTP front end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Record store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    /// Extraction service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,

    /// Fraud alert delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Where uploads are kept when `keepUploads` is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_uploads: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionProviderKind {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<VisionProviderKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Override for self-hosted or proxied endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Email,
    Webhook,
    Log,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotifyKind>,
    /// Mail relay or webhook URL, depending on `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPolicyKind {
    IdNumber,
    FullRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<MatchPolicyKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the daily-rolling log file; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl IdGuardConfig {
    pub fn bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(
            self.server
                .as_ref()
                .and_then(|s| s.upload_dir.clone())
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
        )
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn keep_uploads(&self) -> bool {
        self.server.as_ref().and_then(|s| s.keep_uploads).unwrap_or(false)
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(
            self.database
                .as_ref()
                .and_then(|d| d.path.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
        )
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(
            self.database
                .as_ref()
                .and_then(|d| d.busy_timeout_ms)
                .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    pub fn vision_provider(&self) -> VisionProviderKind {
        self.vision
            .as_ref()
            .and_then(|v| v.provider)
            .unwrap_or(VisionProviderKind::Gemini)
    }

    pub fn vision_timeout(&self) -> Duration {
        Duration::from_secs(
            self.vision
                .as_ref()
                .and_then(|v| v.timeout_secs)
                .unwrap_or(DEFAULT_VISION_TIMEOUT_SECS),
        )
    }

    pub fn notify_kind(&self) -> NotifyKind {
        self.notify.as_ref().and_then(|n| n.kind).unwrap_or(NotifyKind::Log)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(
            self.notify
                .as_ref()
                .and_then(|n| n.timeout_secs)
                .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS),
        )
    }

    pub fn match_policy(&self) -> MatchPolicyKind {
        self.matching
            .as_ref()
            .and_then(|m| m.policy)
            .unwrap_or(MatchPolicyKind::IdNumber)
    }

    pub fn log_level(&self) -> String {
        self.logging
            .as_ref()
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_ref())
            .map(PathBuf::from)
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}
