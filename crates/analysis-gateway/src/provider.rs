//! Client for the multimodal inference provider

use ananse_common::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::models::MediaAttachment;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Inline bytes carried in a request or reply part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl From<&MediaAttachment> for InlineData {
    fn from(media: &MediaAttachment) -> Self {
        Self {
            mime_type: media.mime_type.clone(),
            data: media.data.clone(),
        }
    }
}

impl InlineData {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One piece of content: text or inline media
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,

    /// Set on reasoning parts that are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn media(media: &MediaAttachment) -> Self {
        Self {
            inline_data: Some(media.into()),
            ..Default::default()
        }
    }

    fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

/// Generation settings, including the declared response schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

impl GenerationConfig {
    /// JSON output constrained by `schema`
    pub fn json(schema: Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            ..Default::default()
        }
    }
}

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub parts: Vec<Part>,
    pub config: GenerationConfig,
}

/// What the provider produced, with reasoning parts removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReply {
    /// Concatenated text parts, `None` when there were none
    pub text: Option<String>,
    pub inline_data: Vec<InlineData>,
}

impl ProviderReply {
    fn from_parts(parts: Vec<Part>) -> Self {
        let mut text: Option<String> = None;
        let mut inline_data = Vec::new();

        for part in parts.into_iter().filter(|p| !p.is_thought()) {
            if let Some(t) = part.text {
                text.get_or_insert_with(String::new).push_str(&t);
            }
            if let Some(data) = part.inline_data {
                inline_data.push(data);
            }
        }

        Self { text, inline_data }
    }
}

/// Seam between the gateway and whatever answers its requests
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderReply>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentBody {
    fn from_request(request: &GenerateRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: request.parts.clone(),
            }],
            system_instruction: request.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part::text(text.clone())],
            }),
            generation_config: request.config.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Client for the Generative Language REST API
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client with a per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl InferenceProvider for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderReply> {
        let url = self.endpoint(&request.model);

        debug!("Calling provider: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentBody::from_request(request))
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request to {} failed: {}", request.model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "{} returned {}: {}",
                request.model, status, detail
            )));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse provider envelope: {}", e)))?;

        let parts = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .unwrap_or_default()
            .parts;

        Ok(ProviderReply::from_parts(parts))
    }
}
