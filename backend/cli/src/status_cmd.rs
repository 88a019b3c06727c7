//! `idguard status`: asks a running server for its health report.

use anyhow::Result;
use idguard_config::IdGuardConfig;
use std::time::Duration;

use crate::terminal_output::{note_error, note_success};

pub async fn run(config: &IdGuardConfig) -> Result<()> {
    let url = format!("http://127.0.0.1:{}/api/health", config.port());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client.get(&url).send().await {
        Ok(resp) => {
            let ok = resp.status().is_success();
            let body: serde_json::Value = resp.json().await?;
            if ok {
                note_success(&format!("IdGuard is running on port {}", config.port()));
            } else {
                note_error("IdGuard is running but degraded");
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            note_error(&format!("IdGuard is not running on port {}", config.port()));
        }
    }
    Ok(())
}
