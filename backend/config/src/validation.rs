//! Config validation with path-qualified messages.

use crate::schema::{IdGuardConfig, NotifyKind, VisionProviderKind};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return every error and warning found.
pub fn validate(config: &IdGuardConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_database(config, &mut report);
    validate_vision(config, &mut report);
    validate_notify(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_server(config: &IdGuardConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if let Some(port) = server.port {
        if port == 0 {
            report.error("server.port", "port must be > 0");
        } else if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if server.max_upload_bytes == Some(0) {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
    if server.keep_uploads == Some(true)
        && server.upload_dir.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        report.error("server.uploadDir", "uploadDir is required when keepUploads is on");
    }
}

fn validate_database(config: &IdGuardConfig, report: &mut ValidationReport) {
    let Some(db) = &config.database else { return };
    if let Some(path) = &db.path {
        if path.trim().is_empty() {
            report.error("database.path", "Database path cannot be empty");
        }
    }
}

fn validate_vision(config: &IdGuardConfig, report: &mut ValidationReport) {
    let Some(vision) = &config.vision else { return };
    if vision.api_key.as_deref().map(str::is_empty).unwrap_or(true) {
        let var = match vision.provider.unwrap_or(VisionProviderKind::Gemini) {
            VisionProviderKind::Gemini => "GOOGLE_API_KEY",
            VisionProviderKind::OpenAi => "OPENAI_API_KEY",
        };
        report.warn(
            "vision.apiKey",
            format!("No API key configured (set {var}); every extraction will fail"),
        );
    }
    if let Some(t) = vision.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("vision.temperature", "temperature must be between 0.0 and 2.0");
        }
    }
}

fn validate_notify(config: &IdGuardConfig, report: &mut ValidationReport) {
    let Some(notify) = &config.notify else { return };
    let endpoint_set = notify
        .endpoint
        .as_deref()
        .map(|e| !e.trim().is_empty())
        .unwrap_or(false);
    if let Some(endpoint) = notify.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            report.error("notify.endpoint", "endpoint must be an http(s) URL");
        }
    }

    match notify.kind.unwrap_or(NotifyKind::Log) {
        NotifyKind::Email => {
            if !endpoint_set {
                report.error("notify.endpoint", "Mail relay endpoint is required for email alerts");
            }
            if notify.recipient.as_deref().map(str::is_empty).unwrap_or(true) {
                report.error("notify.recipient", "Recipient is required for email alerts");
            }
            if notify.sender.as_deref().map(str::is_empty).unwrap_or(true) {
                report.error("notify.sender", "Sender is required for email alerts");
            }
        }
        NotifyKind::Webhook => {
            if !endpoint_set {
                report.error("notify.endpoint", "Webhook URL is required for webhook alerts");
            }
        }
        NotifyKind::Log => {
            report.warn("notify.kind", "Fraud alerts are only written to the log");
        }
    }
}

fn validate_logging(config: &IdGuardConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !matches!(
            level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            report.error(
                "logging.level",
                format!("Unknown level '{level}'. Use trace, debug, info, warn or error"),
            );
        }
    }
}
