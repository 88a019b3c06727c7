//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` references inside string values are substituted
//!   (uppercase `[A-Z_][A-Z0-9_]*` names only; `$${VAR}` yields a literal
//!   `${VAR}`),
//! - well-known variables such as `IDGUARD_PORT` or `GOOGLE_API_KEY`
//!   override fields of the typed config.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{
    DatabaseConfig, IdGuardConfig, LoggingConfig, MatchingConfig, MatchPolicyKind, NotifyConfig,
    NotifyKind, ServerConfig, VisionConfig, VisionProviderKind,
};

/// Matches `${VAR}` and the escaped form `$${VAR}`.
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree from `env`.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let out = ENV_REF.replace_all(s, |caps: &regex::Captures| {
        let name = &caps[1];
        if caps[0].starts_with("$$") {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(out.into_owned())
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Apply the well-known override variables found in `env`.
///
/// Empty values are ignored. The vision API key variable is chosen by the
/// configured provider (`GOOGLE_API_KEY` for Gemini, `OPENAI_API_KEY` for
/// OpenAI) and only fills a key that the file leaves unset.
pub fn apply_env_overrides_with(
    mut config: IdGuardConfig,
    env: &HashMap<String, String>,
) -> Result<IdGuardConfig> {
    let get = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(bind) = get("IDGUARD_BIND") {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind);
    }
    if let Some(port) = get("IDGUARD_PORT") {
        let port: u16 = match port.trim().parse() {
            Ok(p) => p,
            Err(_) => bail!("IDGUARD_PORT must be a port number, got `{port}`"),
        };
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(dir) = get("IDGUARD_UPLOAD_DIR") {
        config.server.get_or_insert_with(ServerConfig::default).upload_dir = Some(dir);
    }
    if let Some(path) = get("IDGUARD_DB") {
        config.database.get_or_insert_with(DatabaseConfig::default).path = Some(path);
    }

    if let Some(provider) = get("IDGUARD_VISION_PROVIDER") {
        let kind = match provider.trim().to_ascii_lowercase().as_str() {
            "gemini" => VisionProviderKind::Gemini,
            "openai" => VisionProviderKind::OpenAi,
            other => bail!("IDGUARD_VISION_PROVIDER must be gemini or openai, got `{other}`"),
        };
        config.vision.get_or_insert_with(VisionConfig::default).provider = Some(kind);
    }
    let vision = config.vision.get_or_insert_with(VisionConfig::default);
    let key_var = match vision.provider.unwrap_or(VisionProviderKind::Gemini) {
        VisionProviderKind::Gemini => "GOOGLE_API_KEY",
        VisionProviderKind::OpenAi => "OPENAI_API_KEY",
    };
    if vision.api_key.as_deref().map(str::is_empty).unwrap_or(true) {
        if let Some(key) = get(key_var) {
            vision.api_key = Some(key);
        }
    }

    if let Some(kind) = get("IDGUARD_NOTIFY_KIND") {
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "email" => NotifyKind::Email,
            "webhook" => NotifyKind::Webhook,
            "log" => NotifyKind::Log,
            other => bail!("IDGUARD_NOTIFY_KIND must be email, webhook or log, got `{other}`"),
        };
        config.notify.get_or_insert_with(NotifyConfig::default).kind = Some(kind);
    }
    let notify = config.notify.get_or_insert_with(NotifyConfig::default);
    if let Some(endpoint) = get("IDGUARD_NOTIFY_ENDPOINT") {
        notify.endpoint = Some(endpoint);
    }
    if let Some(key) = get("EMAIL_RELAY_API_KEY") {
        notify.api_key = Some(key);
    }
    if let Some(sender) = get("EMAIL_USER") {
        notify.sender = Some(sender);
    }
    if let Some(recipient) = get("EMAIL_RECIPIENT") {
        notify.recipient = Some(recipient);
    }

    if let Some(policy) = get("IDGUARD_MATCH_POLICY") {
        let policy = match policy.trim() {
            "idNumber" | "id_number" => MatchPolicyKind::IdNumber,
            "fullRecord" | "full_record" => MatchPolicyKind::FullRecord,
            other => bail!("IDGUARD_MATCH_POLICY must be idNumber or fullRecord, got `{other}`"),
        };
        config.matching.get_or_insert_with(MatchingConfig::default).policy = Some(policy);
    }
    if let Some(level) = get("IDGUARD_LOG_LEVEL") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"vision": {"apiKey": "${GOOGLE_API_KEY}"}});
        let result = resolve_env_vars_with(&v, &env(&[("GOOGLE_API_KEY", "AIza-test")])).unwrap();
        assert_eq!(result["vision"]["apiKey"], "AIza-test");
    }

    #[test]
    fn missing_var_names_the_config_path() {
        let v = json!({"notify": {"apiKey": "${RELAY_KEY}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("RELAY_KEY"));
        assert!(err.contains("notify.apiKey"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"a": "cost $${HOME} and ${NAME}"});
        let result = resolve_env_vars_with(&v, &env(&[("NAME", "x")])).unwrap();
        assert_eq!(result["a"], "cost ${HOME} and x");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = IdGuardConfig::default();
        cfg.server = Some(ServerConfig {
            port: Some(5000),
            ..Default::default()
        });
        let cfg = apply_env_overrides_with(
            cfg,
            &env(&[
                ("IDGUARD_PORT", "8081"),
                ("IDGUARD_DB", "/tmp/ids.db"),
                ("EMAIL_RECIPIENT", "security@example.com"),
                ("IDGUARD_MATCH_POLICY", "fullRecord"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port(), 8081);
        assert_eq!(cfg.database_path(), std::path::PathBuf::from("/tmp/ids.db"));
        assert_eq!(
            cfg.notify.unwrap().recipient.as_deref(),
            Some("security@example.com")
        );
        assert_eq!(cfg.matching.unwrap().policy, Some(MatchPolicyKind::FullRecord));
    }

    #[test]
    fn api_key_follows_provider_and_never_replaces_file_key() {
        let cfg = apply_env_overrides_with(
            IdGuardConfig::default(),
            &env(&[("IDGUARD_VISION_PROVIDER", "openai"), ("OPENAI_API_KEY", "sk-1")]),
        )
        .unwrap();
        assert_eq!(cfg.vision.unwrap().api_key.as_deref(), Some("sk-1"));

        let mut cfg = IdGuardConfig::default();
        cfg.vision = Some(VisionConfig {
            api_key: Some("from-file".into()),
            ..Default::default()
        });
        let cfg = apply_env_overrides_with(cfg, &env(&[("GOOGLE_API_KEY", "from-env")])).unwrap();
        assert_eq!(cfg.vision.unwrap().api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = apply_env_overrides_with(IdGuardConfig::default(), &env(&[("IDGUARD_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("IDGUARD_PORT"));
    }
}
