//! Gemini `generateContent` client.
//!
//! DESIGN
//! ======
//! Thin HTTP wrapper behind the [`GenerativeModel`] trait so routes can be
//! exercised with a mock. Pure parsing in `parse_response` for
//! testability. The model is an opaque collaborator: it receives a PNG of
//! the current canvas plus an instruction prompt and returns inline image
//! parts and/or text.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("GOOGLE_API_KEY not set")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
    #[error("API request failed: {0}")]
    ApiRequest(String),
    #[error("API returned status {status}: {body}")]
    ApiResponse { status: u16, body: String },
    #[error("failed to parse API response: {0}")]
    ApiParse(String),
    #[error("response contained no usable parts")]
    EmptyResponse,
}

// =============================================================================
// TRAIT SEAM
// =============================================================================

/// Inline image part as returned by the model: mime type plus base64 data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Everything usable from one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub images: Vec<InlineImage>,
    pub text: Option<String>,
}

/// The external generative model, kept behind a trait so handlers are
/// testable without network access.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Canvas in, images out (plus any commentary text).
    async fn generate_image(&self, png: &[u8], prompt: &str) -> Result<ModelOutput, GeminiError>;

    /// Canvas in, text out. Used when the model is asked to emit stroke
    /// JSON instead of an image.
    async fn generate_text(&self, png: &[u8], prompt: &str) -> Result<String, GeminiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Build a client from `GOOGLE_API_KEY` (required) and `GEMINI_MODEL`
    /// (optional).
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails
    /// to build.
    pub fn from_env() -> Result<Self, GeminiError> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| GeminiError::MissingApiKey)?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(api_key, model)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(api_key: String, model: String) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeminiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, model })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        png: &[u8],
        prompt: &str,
        want_images: bool,
    ) -> Result<ModelOutput, GeminiError> {
        let body = ApiRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".into(),
                            data: BASE64.encode(png),
                        }),
                    },
                    Part { text: Some(prompt.to_owned()), inline_data: None },
                ],
            }],
            generation_config: want_images.then(|| GenerationConfig {
                response_modalities: vec!["TEXT".into(), "IMAGE".into()],
            }),
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiError::ApiRequest(e.to_string()))?;

        if status != 200 {
            return Err(GeminiError::ApiResponse { status, body: text });
        }

        parse_response(&text)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_image(&self, png: &[u8], prompt: &str) -> Result<ModelOutput, GeminiError> {
        self.generate(png, prompt, true).await
    }

    async fn generate_text(&self, png: &[u8], prompt: &str) -> Result<String, GeminiError> {
        let output = self.generate(png, prompt, false).await?;
        output.text.ok_or(GeminiError::EmptyResponse)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ApiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(json: &str) -> Result<ModelOutput, GeminiError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| GeminiError::ApiParse(e.to_string()))?;

    let mut images = Vec::new();
    let mut text_parts = Vec::new();
    for candidate in api.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(inline) = part.inline_data {
                images.push(InlineImage { mime_type: inline.mime_type, data: inline.data });
            }
            if let Some(text) = part.text {
                if !text.is_empty() {
                    text_parts.push(text);
                }
            }
        }
    }

    if images.is_empty() && text_parts.is_empty() {
        return Err(GeminiError::EmptyResponse);
    }

    let text = if text_parts.is_empty() { None } else { Some(text_parts.join("")) };
    Ok(ModelOutput { images, text })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
