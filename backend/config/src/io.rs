//! Config file location and loading.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "idguard.yaml";

/// Resolve the directory holding `idguard.yaml`.
/// Priority: `IDGUARD_CONFIG_DIR` env > `./idguard.yaml` if present > `~/.idguard/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("IDGUARD_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if Path::new(CONFIG_FILE_NAME).exists() {
        return PathBuf::from(".");
    }
    match dirs::home_dir() {
        Some(home) => home.join(".idguard"),
        None => PathBuf::from(".idguard"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load variables from a `.env` file in the working directory, if any.
///
/// Variables already set in the process environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

/// Read the raw YAML document as a JSON value tree.
///
/// A missing file is not an error: first runs start from an empty document.
pub async fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}
