//! Config defaults: fills unset fields of a freshly loaded config.

use crate::schema::{
    DatabaseConfig, IdGuardConfig, LoggingConfig, MatchingConfig, MatchPolicyKind, NotifyConfig,
    NotifyKind, ServerConfig, VisionConfig, VisionProviderKind,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const DEFAULT_DATABASE_PATH: &str = "identity_cards.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: IdGuardConfig) -> IdGuardConfig {
    let config = apply_server_defaults(config);
    let config = apply_database_defaults(config);
    let config = apply_vision_defaults(config);
    let config = apply_notify_defaults(config);
    let config = apply_matching_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.upload_dir.get_or_insert_with(|| DEFAULT_UPLOAD_DIR.to_string());
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    server.keep_uploads.get_or_insert(false);
    config
}

fn apply_database_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let database = config.database.get_or_insert_with(DatabaseConfig::default);
    database.path.get_or_insert_with(|| DEFAULT_DATABASE_PATH.to_string());
    database.busy_timeout_ms.get_or_insert(DEFAULT_BUSY_TIMEOUT_MS);
    config
}

/// The model default depends on the provider.
fn apply_vision_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let vision = config.vision.get_or_insert_with(VisionConfig::default);
    let provider = *vision.provider.get_or_insert(VisionProviderKind::Gemini);
    if vision.model.is_none() {
        vision.model = Some(
            match provider {
                VisionProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
                VisionProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
            }
            .to_string(),
        );
    }
    vision.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    vision.timeout_secs.get_or_insert(DEFAULT_VISION_TIMEOUT_SECS);
    config
}

fn apply_notify_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let notify = config.notify.get_or_insert_with(NotifyConfig::default);
    notify.kind.get_or_insert(NotifyKind::Log);
    notify.timeout_secs.get_or_insert(DEFAULT_NOTIFY_TIMEOUT_SECS);
    config
}

fn apply_matching_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let matching = config.matching.get_or_insert_with(MatchingConfig::default);
    matching.policy.get_or_insert(MatchPolicyKind::IdNumber);
    config
}

fn apply_logging_defaults(mut config: IdGuardConfig) -> IdGuardConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(IdGuardConfig::default());
        assert_eq!(cfg.server.unwrap().port, Some(DEFAULT_PORT));
        assert_eq!(cfg.database.unwrap().path.as_deref(), Some(DEFAULT_DATABASE_PATH));
        assert_eq!(cfg.notify.unwrap().kind, Some(NotifyKind::Log));
        assert_eq!(cfg.matching.unwrap().policy, Some(MatchPolicyKind::IdNumber));
    }

    #[test]
    fn model_default_follows_provider() {
        let mut cfg = IdGuardConfig::default();
        cfg.vision = Some(VisionConfig {
            provider: Some(VisionProviderKind::OpenAi),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.vision.unwrap().model.as_deref(), Some(DEFAULT_OPENAI_MODEL));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = IdGuardConfig::default();
        cfg.server = Some(ServerConfig {
            port: Some(8080),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.port(), 8080);
    }
}
