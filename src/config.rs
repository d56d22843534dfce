//! Configuration types for fridge analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. Credentials are deliberately absent: each
//! provider client reads its own secret from the environment when it is
//! constructed, so a config can be logged or cloned freely.

use crate::error::AnalysisError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest day count a shopping list can be planned for.
pub const MIN_DAYS: u8 = 1;
/// Largest day count a shopping list can be planned for.
pub const MAX_DAYS: u8 = 7;
/// Day count used when the caller does not choose one.
pub const DEFAULT_DAYS: u8 = 3;

/// Configuration for an analysis session.
///
/// # Example
/// ```rust
/// use fridge2list::{AnalysisConfig, ResponseMode};
///
/// let config = AnalysisConfig::builder()
///     .model("gpt-4o")
///     .max_tokens(1500)
///     .response_mode(ResponseMode::Structured)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Provider model identifier. If None, each client uses its own default
    /// (`gpt-4o` for the conversational client, `gemini-2.0-flash` for the
    /// structured client).
    pub model: Option<String>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the provider may generate for one list. Default: 1500.
    ///
    /// A week of groceries grouped by department fits comfortably; a lower
    /// cap risks a list cut off mid-category.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Expiry surfaces as
    /// [`AnalysisError::ProviderUnavailable`]. Default: 60.
    pub api_timeout_secs: u64,

    /// Longest edge, in pixels, of a photo re-encoded for the structured
    /// client. Larger captures are scaled down proportionally. Default: 2048.
    pub max_image_dimension: u32,

    /// Force a response mode instead of the client's natural one.
    pub response_mode: Option<ResponseMode>,

    /// Receives extraction and analysis lifecycle events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.2,
            max_tokens: 1500,
            api_timeout_secs: 60,
            max_image_dimension: 2048,
            response_mode: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_image_dimension", &self.max_image_dimension)
            .field("response_mode", &self.response_mode)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(64);
        self
    }

    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.config.response_mode = Some(mode);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Response contract shared by prompt composition and reply normalisation.
///
/// The same value is handed to [`crate::prompts::compose`] and
/// [`crate::pipeline::normalize::normalize`] so the two stay in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Prose or Markdown grouped by store department. Display-only.
    FreeText,
    /// A single JSON object mapping category names to arrays of item names.
    Structured,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseMode::FreeText => f.write_str("free-text"),
            ResponseMode::Structured => f.write_str("structured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.max_tokens, 1500);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(c.model.is_none());
        assert!(c.response_mode.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = AnalysisConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = AnalysisConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(AnalysisConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", AnalysisConfig::default());
        assert!(s.contains("AnalysisConfig"));
        assert!(s.contains("max_tokens: 1500"));
    }

    #[test]
    fn response_mode_display() {
        assert_eq!(ResponseMode::FreeText.to_string(), "free-text");
        assert_eq!(ResponseMode::Structured.to_string(), "structured");
    }
}
