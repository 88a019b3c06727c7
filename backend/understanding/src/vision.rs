/// Vision understanding: send an image plus instructions to a vision LLM
/// and return its raw text answer.
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::info;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Supported vision providers.
#[derive(Debug, Clone)]
pub enum VisionProvider {
    OpenAI {
        api_key: String,
        model: String,
        base_url: String,
        temperature: f32,
    },
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
        temperature: f32,
    },
}

impl VisionProvider {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            temperature: 0.2,
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::Gemini {
            api_key: api_key.into(),
            model: "gemini-2.0-flash".to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            temperature: 0.2,
        }
    }

    pub fn with_model(mut self, new_model: impl Into<String>) -> Self {
        match &mut self {
            Self::OpenAI { model, .. } | Self::Gemini { model, .. } => *model = new_model.into(),
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        match &mut self {
            Self::OpenAI { base_url, .. } | Self::Gemini { base_url, .. } => {
                *base_url = url.into().trim_end_matches('/').to_string()
            }
        }
        self
    }

    pub fn with_temperature(mut self, value: f32) -> Self {
        match &mut self {
            Self::OpenAI { temperature, .. } | Self::Gemini { temperature, .. } => {
                *temperature = value
            }
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "openai",
            Self::Gemini { .. } => "gemini",
        }
    }
}

/// Describe an image from raw bytes using a vision LLM.
pub async fn describe_image(
    client: &reqwest::Client,
    provider: &VisionProvider,
    image_bytes: &[u8],
    mime_type: &str,
    prompt: &str,
) -> Result<String> {
    let b64 = STANDARD.encode(image_bytes);
    match provider {
        VisionProvider::OpenAI { api_key, model, base_url, temperature } => {
            describe_via_openai(client, api_key, model, base_url, *temperature, &b64, mime_type, prompt).await
        }
        VisionProvider::Gemini { api_key, model, base_url, temperature } => {
            describe_via_gemini(client, api_key, model, base_url, *temperature, &b64, mime_type, prompt).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn describe_via_openai(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    base_url: &str,
    temperature: f32,
    b64: &str,
    mime_type: &str,
    prompt: &str,
) -> Result<String> {
    info!("[Vision] Analysing document via OpenAI {}", model);
    let body = serde_json::json!({
        "model": model,
        "temperature": temperature,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url",
                  "image_url": { "url": format!("data:{};base64,{}", mime_type, b64) } }
            ]
        }],
        "max_tokens": 1024
    });
    let resp = client
        .post(format!("{}/chat/completions", base_url))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(reqwest::Error::without_url)
        .context("OpenAI vision request failed")?;
    if !resp.status().is_success() {
        bail!("OpenAI vision error: {}", resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await.map_err(reqwest::Error::without_url)?;
    Ok(json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

#[allow(clippy::too_many_arguments)]
async fn describe_via_gemini(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    base_url: &str,
    temperature: f32,
    b64: &str,
    mime_type: &str,
    prompt: &str,
) -> Result<String> {
    info!("[Vision] Analysing document via Gemini {}", model);
    let url = format!("{}/models/{}:generateContent", base_url, model);
    let body = serde_json::json!({
        "contents": [{ "parts": [
            { "text": prompt },
            { "inlineData": { "mimeType": mime_type, "data": b64 } }
        ]}],
        "generationConfig": { "temperature": temperature }
    });
    let resp = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .json(&body)
        .send()
        .await
        .map_err(reqwest::Error::without_url)
        .context("Gemini vision request failed")?;
    if !resp.status().is_success() {
        bail!("Gemini vision error: {}", resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await.map_err(reqwest::Error::without_url)?;
    Ok(json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string())
}
