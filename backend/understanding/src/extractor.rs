//! `Extractor` implementation backed by a vision LLM.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use idguard_core::{ExtractionError, Extractor, IdentityRecord, ImageInput};
use idguard_logging::redact_sensitive_data;
use tracing::{debug, info, warn};

use crate::fields::record_from_fields;
use crate::mime::sniff_image_mime;
use crate::prompt::ID_CARD_PROMPT;
use crate::response::{parse_verdict, Verdict};
use crate::vision::{describe_image, VisionProvider};

#[derive(Debug)]
pub struct VisionExtractor {
    client: reqwest::Client,
    provider: VisionProvider,
}

impl VisionExtractor {
    pub fn new(provider: VisionProvider, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for vision provider")?;
        Ok(Self {
            client,
            provider,
        })
    }

    /// Turn the model's raw text answer into a record.
    pub fn interpret(raw: &str) -> Result<IdentityRecord, ExtractionError> {
        match parse_verdict(raw)? {
            Verdict::Success(fields) => record_from_fields(&fields),
            Verdict::Rejected { status, reason } => {
                warn!(status = %status, reason = %reason, "[Vision] Document rejected by model");
                Err(ExtractionError::Rejected { reason })
            }
        }
    }
}

#[async_trait]
impl Extractor for VisionExtractor {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn extract(&self, image: &ImageInput) -> Result<IdentityRecord, ExtractionError> {
        let mime = sniff_image_mime(&image.bytes).ok_or_else(|| {
            ExtractionError::UnsupportedImage(
                image
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "unknown content type".to_string()),
            )
        })?;
        info!(mime, size = image.bytes.len(), "[Vision] Extracting identity fields");

        let raw = describe_image(&self.client, &self.provider, &image.bytes, mime, ID_CARD_PROMPT)
            .await
            .map_err(|e| ExtractionError::Provider(redact_sensitive_data(&format!("{e:#}"))))?;
        debug!(chars = raw.len(), "[Vision] Received model response");

        Self::interpret(&raw)
    }
}
