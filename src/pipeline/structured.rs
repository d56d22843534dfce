//! Structured-generation client for the Gemini `generateContent` API.
//!
//! One combined text part plus the photo, with
//! `generationConfig.responseMimeType = "application/json"` so the provider
//! guarantees a JSON body. The shape of that JSON is still checked by
//! [`crate::pipeline::normalize`].

use crate::config::{AnalysisConfig, ResponseMode};
use crate::error::AnalysisError;
use crate::output::RawProviderReply;
use crate::pipeline::encode::encode_decoded;
use crate::pipeline::llm::{with_timeout, InferenceClient};
use crate::prompts::PromptPayload;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Default model for the structured client.
pub const DEFAULT_STRUCTURED_MODEL: &str = "gemini-2.0-flash";

/// Default API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Gemini client forcing JSON output.
#[derive(Debug, Clone)]
pub struct StructuredClient {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: usize,
    max_image_dimension: u32,
    api_timeout_secs: u64,
    client: Client,
}

impl StructuredClient {
    /// Build a client from `GEMINI_API_KEY` (or `GOOGLE_API_KEY`).
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let key = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty())
            .ok_or_else(|| AnalysisError::ProviderNotConfigured {
                provider: PROVIDER.into(),
                hint: "Set GEMINI_API_KEY to use the structured client.".into(),
            })?;

        Self::new(key, config)
    }

    pub fn new(api_key: impl Into<String>, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AnalysisError::ProviderNotConfigured {
                provider: PROVIDER.into(),
                hint: format!("HTTP client could not be built: {e}"),
            })?;

        Ok(Self {
            api_key: api_key.into(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_STRUCTURED_MODEL.to_string()),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_image_dimension: config.max_image_dimension,
            api_timeout_secs: config.api_timeout_secs,
            client,
        })
    }

    /// Point the client at another API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, payload: &PromptPayload, image: &[u8]) -> Result<GenerateRequest, AnalysisError> {
        let encoded = encode_decoded(image, self.max_image_dimension)?;

        Ok(GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: payload.combined(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: encoded.mime_type.to_string(),
                            data: encoded.data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        })
    }

    async fn send(&self, request: &GenerateRequest) -> Result<GenerateResponse, AnalysisError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("{}: request failed: {}", PROVIDER, e);
                AnalysisError::ProviderUnavailable {
                    provider: PROVIDER.into(),
                    detail: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            warn!("{}: HTTP {}: {}", PROVIDER, status, body);
            return Err(map_status(status, retry_after_secs, body));
        }

        response.json::<GenerateResponse>().await.map_err(|e| {
            AnalysisError::ProviderUnavailable {
                provider: PROVIDER.into(),
                detail: format!("unreadable response envelope: {e}"),
            }
        })
    }
}

#[async_trait]
impl InferenceClient for StructuredClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::Structured
    }

    async fn analyze(
        &self,
        payload: &PromptPayload,
        image: &[u8],
    ) -> Result<RawProviderReply, AnalysisError> {
        let request = self.build_request(payload, image)?;
        let start = Instant::now();

        let response = with_timeout(PROVIDER, self.api_timeout_secs, self.send(&request)).await?;
        let reply = reply_from_response(response)?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            PROVIDER,
            reply.input_tokens,
            reply.output_tokens,
            start.elapsed()
        );
        Ok(reply)
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn map_status(status: StatusCode, retry_after_secs: Option<u64>, body: String) -> AnalysisError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        AnalysisError::ProviderThrottled {
            provider: PROVIDER.into(),
            retry_after_secs,
        }
    } else {
        AnalysisError::ProviderUnavailable {
            provider: PROVIDER.into(),
            detail: format!("HTTP {status}: {body}"),
        }
    }
}

/// Pull the reply text out of a response envelope.
///
/// A blocked prompt, a missing candidate or a candidate without text all
/// count as an empty reply.
fn reply_from_response(response: GenerateResponse) -> Result<RawProviderReply, AnalysisError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!("{}: prompt blocked ({})", PROVIDER, reason);
        return Err(AnalysisError::EmptyResponse {
            provider: PROVIDER.into(),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::EmptyResponse {
            provider: PROVIDER.into(),
        })?;

    let body: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if body.trim().is_empty() {
        warn!(
            "{}: empty candidate (finish reason {:?})",
            PROVIDER, candidate.finish_reason
        );
        return Err(AnalysisError::EmptyResponse {
            provider: PROVIDER.into(),
        });
    }

    let usage = response.usage_metadata.unwrap_or_default();
    Ok(RawProviderReply {
        body,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::compose;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 128, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    fn client() -> StructuredClient {
        StructuredClient::new("test-key", &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn request_forces_json_and_camel_case() {
        let payload = compose("eggs", 3, ResponseMode::Structured).unwrap();
        let request = client().build_request(&payload, &png_bytes()).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1500);
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().contains("Plan for 3 days."));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert!(!parts[1]["inlineData"]["data"].as_str().unwrap().is_empty());
    }

    #[test]
    fn request_rejects_non_image() {
        let payload = compose("eggs", 3, ResponseMode::Structured).unwrap();
        let err = client().build_request(&payload, b"not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn endpoint_uses_model_and_base_url() {
        let c = client().with_base_url("http://localhost:1234/");
        assert_eq!(
            c.endpoint(),
            "http://localhost:1234/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn reply_joins_text_parts_and_usage() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"Dairy\":"}, {"text": "[\"Milk\"]}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 812, "candidatesTokenCount": 14}
        }))
        .unwrap();
        let reply = reply_from_response(response).unwrap();
        assert_eq!(reply.body, r#"{"Dairy":["Milk"]}"#);
        assert_eq!(reply.input_tokens, 812);
        assert_eq!(reply.output_tokens, 14);
    }

    #[test]
    fn blocked_prompt_is_empty_response() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(
            reply_from_response(response),
            Err(AnalysisError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn no_candidates_is_empty_response() {
        assert!(matches!(
            reply_from_response(GenerateResponse::default()),
            Err(AnalysisError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, Some(30), String::new()),
            AnalysisError::ProviderThrottled {
                retry_after_secs: Some(30),
                ..
            }
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, None, "bad key".into()),
            AnalysisError::ProviderUnavailable { .. }
        ));
    }
}
