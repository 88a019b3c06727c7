//! `idguard config`: prints the effective configuration with secrets masked.

use anyhow::{Context, Result};
use idguard_config::{redact, IdGuardConfig};

pub fn render(config: &IdGuardConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")
}

pub fn run(config: &IdGuardConfig) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}
