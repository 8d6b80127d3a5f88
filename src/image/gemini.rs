//! Gemini (Google) image transformer.

use crate::error::{sanitize_error_message, GenerationCause, Result};
use crate::image::transformer::ImageTransformer;
use crate::image::types::{decode_base64_lenient, EncodedImage, ImageFormat, TransformRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default REST endpoint of the Generative Language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Appended to every style instruction so the model answers with an image.
pub const INSTRUCTION_SUFFIX: &str = " Return the edited image.";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    Flash,
    /// Gemini 3 Pro Image (highest quality).
    Pro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }

    /// Parses a short model name (`flash`, `pro`) or a full identifier.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "flash" | "gemini-2.5-flash-image" => Some(Self::Flash),
            "pro" | "gemini-3-pro-image-preview" => Some(Self::Pro),
            _ => None,
        }
    }
}

/// Builder for [`GeminiTransformer`].
#[derive(Debug, Clone, Default)]
pub struct GeminiTransformerBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    endpoint: Option<String>,
}

impl GeminiTransformerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    ///
    /// Without a key the transformer still builds, but every call fails
    /// with an authentication cause.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API key if one is present.
    pub fn maybe_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Builds the transformer.
    pub fn build(self) -> GeminiTransformer {
        GeminiTransformer {
            client: reqwest::Client::new(),
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            model: self.model,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Gemini-backed [`ImageTransformer`].
///
/// Holds one credential for its whole lifetime and reuses it for every call.
pub struct GeminiTransformer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    endpoint: String,
}

impl GeminiTransformer {
    /// Creates a new `GeminiTransformerBuilder`.
    pub fn builder() -> GeminiTransformerBuilder {
        GeminiTransformerBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint,
            self.model.as_str()
        )
    }

    async fn transform_impl(
        &self,
        request: &TransformRequest,
    ) -> std::result::Result<EncodedImage, GenerationCause> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationCause::Auth("no API key configured".into()))?;

        let body = GeminiRequest::from_transform_request(request);

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let text = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        extract_image(gemini_response)
    }
}

#[async_trait]
impl ImageTransformer for GeminiTransformer {
    async fn transform(&self, request: &TransformRequest) -> Result<EncodedImage> {
        request.validate()?;

        let start = Instant::now();
        tracing::debug!(
            model = self.model.as_str(),
            input_bytes = request.image.size(),
            input_format = %request.image.format,
            "sending transform request"
        );

        match self.transform_impl(request).await {
            Ok(image) => {
                tracing::info!(
                    model = self.model.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    output_bytes = image.size(),
                    "transform succeeded"
                );
                Ok(image)
            }
            Err(cause) => {
                tracing::warn!(
                    model = self.model.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "transform failed: {cause}"
                );
                Err(cause.into())
            }
        }
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Picks the first inline image out of a response, re-tagged as PNG.
fn extract_image(response: GeminiResponse) -> std::result::Result<EncodedImage, GenerationCause> {
    // Blocks arrive as HTTP 200 with prompt feedback
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
    {
        let msg = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason_message.clone())
            .unwrap_or_else(|| format!("prompt blocked: {reason}"));
        return Err(GenerationCause::ContentBlocked(msg));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationCause::NoImage {
            finish_reason: None,
        });
    };

    let inline_data = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|p| p.inline_data);

    let Some(inline_data) = inline_data else {
        return Err(GenerationCause::NoImage {
            finish_reason: candidate.finish_reason,
        });
    };

    let data =
        decode_base64_lenient(&inline_data.data).map_err(|e| GenerationCause::Decode(e.to_string()))?;
    if data.is_empty() {
        return Err(GenerationCause::Decode("inline image data is empty".into()));
    }

    Ok(EncodedImage::new(data, ImageFormat::Png))
}

fn parse_error(status: u16, text: &str) -> GenerationCause {
    let message = serde_json::from_str::<GeminiErrorResponse>(text)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| text.to_string());
    let message = sanitize_error_message(&message);

    match status {
        401 | 403 => GenerationCause::Auth(message),
        _ => GenerationCause::Api { status, message },
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_transform_request(req: &TransformRequest) -> Self {
        // The source is always tagged PNG, whatever the upload encoding was.
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: ImageFormat::Png.mime_type().to_string(),
                    data: req.image.to_base64(),
                },
            },
            GeminiRequestPart::Text {
                text: format!("{}{}", req.instruction, INSTRUCTION_SUFFIX),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}
