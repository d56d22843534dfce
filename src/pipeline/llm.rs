//! Provider interaction: the [`InferenceClient`] capability and its
//! conversational (chat completion) implementation.
//!
//! Prompt wording lives in [`crate::prompts`]; image transport lives in
//! [`crate::pipeline::encode`]. Clients only assemble the request, enforce
//! the call timeout and classify failures. Nothing here retries: every
//! failure is reported to the caller, who decides whether to re-trigger.

use crate::config::{AnalysisConfig, ResponseMode};
use crate::error::AnalysisError;
use crate::output::RawProviderReply;
use crate::pipeline::encode::encode_inline;
use crate::prompts::PromptPayload;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, LlmError, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Default model for the conversational client.
pub const DEFAULT_CONVERSATIONAL_MODEL: &str = "gpt-4o";

/// Send a prompt plus a photo to a multimodal provider and return its reply.
///
/// Callers depend only on this trait, never on a provider type.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Short provider name used in errors and logs.
    fn provider(&self) -> &str;

    /// The response contract this client is built around.
    fn response_mode(&self) -> ResponseMode;

    /// Issue exactly one request.
    async fn analyze(
        &self,
        payload: &PromptPayload,
        image: &[u8],
    ) -> Result<RawProviderReply, AnalysisError>;
}

// ── Conversational client ────────────────────────────────────────────────

/// Chat-completion client: system block, user text, inline image, bounded
/// output size, one free-text answer.
pub struct ConversationalClient {
    llm: Arc<dyn LLMProvider>,
    provider_name: String,
    temperature: f32,
    max_tokens: usize,
    api_timeout_secs: u64,
}

impl ConversationalClient {
    /// Build an OpenAI-backed client. Fails when `OPENAI_API_KEY` is unset.
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => {}
            _ => {
                return Err(AnalysisError::ProviderNotConfigured {
                    provider: "openai".into(),
                    hint: "Set OPENAI_API_KEY to use the conversational client.".into(),
                })
            }
        }

        let model = config
            .model
            .as_deref()
            .unwrap_or(DEFAULT_CONVERSATIONAL_MODEL);
        let provider = ProviderFactory::create_llm_provider("openai", model).map_err(|e| {
            AnalysisError::ProviderNotConfigured {
                provider: "openai".into(),
                hint: format!("{e}"),
            }
        })?;

        Ok(Self::with_provider(provider, "openai", config))
    }

    /// Wrap a pre-built provider.
    pub fn with_provider(
        provider: Arc<dyn LLMProvider>,
        provider_name: impl Into<String>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            llm: provider,
            provider_name: provider_name.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    fn options(&self) -> CompletionOptions {
        build_options(self.temperature, self.max_tokens)
    }
}

#[async_trait]
impl InferenceClient for ConversationalClient {
    fn provider(&self) -> &str {
        &self.provider_name
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::FreeText
    }

    async fn analyze(
        &self,
        payload: &PromptPayload,
        image: &[u8],
    ) -> Result<RawProviderReply, AnalysisError> {
        let messages = build_messages(payload, encode_inline(image)?);

        let options = self.options();
        let start = Instant::now();

        let response = with_timeout(self.provider(), self.api_timeout_secs, async {
            self.llm
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| classify_provider_error(self.provider(), &e))
        })
        .await?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.provider_name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty()
            || response.finish_reason.as_deref() == Some("content_filter")
        {
            return Err(AnalysisError::EmptyResponse {
                provider: self.provider_name.clone(),
            });
        }

        Ok(RawProviderReply {
            body: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// System block (when the mode has one) followed by the user text with the
/// photo attached.
fn build_messages(payload: &PromptPayload, image: ImageData) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(ref instructions) = payload.instructions {
        messages.push(ChatMessage::system(instructions.as_str()));
    }
    messages.push(ChatMessage::user_with_images(
        payload.content.as_str(),
        vec![image],
    ));
    messages
}

/// Build `CompletionOptions` for one call.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────

/// Run a provider call under the configured timeout.
///
/// Expiry surfaces as [`AnalysisError::ProviderUnavailable`].
pub(crate) async fn with_timeout<T, F>(
    provider: &str,
    secs: u64,
    call: F,
) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    match timeout(Duration::from_secs(secs), call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{}: call timed out after {}s", provider, secs);
            Err(AnalysisError::ProviderUnavailable {
                provider: provider.to_string(),
                detail: format!("no reply within {secs}s"),
            })
        }
    }
}

/// Map a provider error onto the call-time error taxonomy.
///
/// Network, auth and timeout failures mean the provider is unavailable.
/// Some SDK paths report rate limits and content filtering only inside a
/// generic API error, so those two are recognised from the message.
pub fn classify_provider_error(provider: &str, error: &LlmError) -> AnalysisError {
    warn!("{}: call failed: {}", provider, error);

    let throttled = || AnalysisError::ProviderThrottled {
        provider: provider.to_string(),
        retry_after_secs: None,
    };
    let unavailable = || AnalysisError::ProviderUnavailable {
        provider: provider.to_string(),
        detail: error.to_string(),
    };

    match error {
        LlmError::RateLimited(_) => throttled(),
        LlmError::ApiError(message) | LlmError::ProviderError(message) => {
            let lower = message.to_lowercase();
            if lower.contains("content_filter") || lower.contains("content filter") {
                AnalysisError::EmptyResponse {
                    provider: provider.to_string(),
                }
            } else if lower.contains("429")
                || lower.contains("rate limit")
                || lower.contains("rate_limit")
                || lower.contains("quota")
                || lower.contains("resource_exhausted")
            {
                throttled()
            } else {
                unavailable()
            }
        }
        _ => unavailable(),
    }
}
