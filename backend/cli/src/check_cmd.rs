//! `idguard check <image>`: one workflow run from a file on disk.

use std::path::Path;

use anyhow::{Context, Result};
use idguard_config::IdGuardConfig;
use idguard_core::{ImageInput, WorkflowStatus};

use crate::config::build_orchestrator;
use crate::terminal_output::{render_result, supports_color};

/// Process exit code for a finished check: 2 when the run could not reach a
/// verdict, 0 otherwise.
pub fn exit_code(status: WorkflowStatus) -> u8 {
    if status.is_failure() {
        2
    } else {
        0
    }
}

pub async fn run(config: &IdGuardConfig, image: &Path, json: bool) -> Result<WorkflowStatus> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let mut input = ImageInput::new(bytes);
    input.filename = image.file_name().map(|n| n.to_string_lossy().to_string());

    let orchestrator = build_orchestrator(config)?;
    let result = orchestrator.run(input).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(&result, supports_color()));
    }
    Ok(result.status)
}
