//! `idguard-config`: IdGuard runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, database, vision, notify, matching, logging)
//! - YAML loading
//! - `.env` loading, `${ENV_VAR}` substitution and env overrides
//! - Redaction for safe display
//! - Defaults and validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides_with, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_dotenv};
pub use redact::redact;
pub use schema::{
    DatabaseConfig, IdGuardConfig, LoggingConfig, MatchPolicyKind, MatchingConfig, NotifyConfig,
    NotifyKind, ServerConfig, VisionConfig, VisionProviderKind,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load `.env`, read the YAML file, substitute `${VAR}`s, apply env
/// overrides and defaults, then validate.
///
/// Validation errors fail the load; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<IdGuardConfig> {
    load_dotenv();
    let env: HashMap<String, String> = std::env::vars().collect();
    load_and_prepare_with(path, &env).await
}

/// [`load_and_prepare`] with an explicit environment and no `.env` loading.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<IdGuardConfig> {
    let value = io::load_config_value(path).await?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: IdGuardConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides_with(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let summary: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid configuration:\n  {}", summary.join("\n  "));
    }

    Ok(config)
}
