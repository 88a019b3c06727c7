//! Config redaction for display: secrets and contact addresses are masked.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SECRET_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "token",
    "secret",
    "password",
];

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Webhook URLs carry their secret in the path.
static KEYED_URL_KEYS: &[&str] = &["endpoint"];

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Redact a config JSON value, replacing secrets with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn redact_string(s: &str, key: &str) -> Value {
    if s.is_empty() {
        return Value::String(String::new());
    }
    if is_secret_key(key) {
        let hint: String = s.chars().take(4).collect();
        return Value::String(if s.chars().count() > 8 {
            format!("{hint}***")
        } else {
            "***".to_string()
        });
    }
    if KEYED_URL_KEYS.contains(&key) {
        if let Some(idx) = s.find("://").and_then(|i| s[i + 3..].find('/').map(|j| i + 3 + j)) {
            return Value::String(format!("{}/***", &s[..idx]));
        }
    }
    if EMAIL_PATTERN.is_match(s) {
        let (local, domain) = s.split_once('@').unwrap_or((s, ""));
        let first: String = local.chars().take(1).collect();
        return Value::String(format!("{first}***@{domain}"));
    }
    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
