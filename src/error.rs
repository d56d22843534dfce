//! Error types for the fridge2list library.
//!
//! Every operation returns [`AnalysisError`]. The variants fall into three
//! groups that callers usually treat differently:
//!
//! * **Local input errors**: the document cannot be read, a parameter is out
//!   of range, no diet plan has been loaded yet. Nothing was sent to a
//!   provider; the user has to fix the input.
//!
//! * **Call-time provider errors**: unavailable, throttled, empty reply,
//!   malformed reply. These are terminal for the invocation but the user may
//!   re-trigger the same request; see [`AnalysisError::is_retryable`].
//!
//! * **Startup errors**: missing credentials or an unloadable pdfium library.
//!   These are reported to the operator when the process starts.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the fridge2list library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The diet plan document could not be opened or parsed at all.
    #[error("Diet plan document is unreadable: {detail}")]
    DocumentUnreadable { detail: String },

    /// A request parameter failed local validation. No provider call was made.
    #[error("Invalid {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// An analysis was requested before any diet plan was loaded.
    #[error("No diet plan loaded.\nUpload a diet plan document before analysing a photo.")]
    DietPlanMissing,

    // ── Provider errors ───────────────────────────────────────────────────
    /// The provider credential is missing or the provider could not be built.
    #[error("Provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Network, authentication or timeout failure talking to the provider.
    #[error("Provider '{provider}' is unavailable: {detail}")]
    ProviderUnavailable { provider: String, detail: String },

    /// The provider rejected the call because of rate limits or quota.
    #[error("Provider '{provider}' is throttling requests{}", retry_hint(.retry_after_secs))]
    ProviderThrottled {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The provider answered but the reply carried no usable content.
    #[error("Provider '{provider}' returned an empty or refused reply")]
    EmptyResponse { provider: String },

    /// A structured reply was not a JSON object of string arrays.
    #[error("Malformed shopping list reply: {detail}")]
    MalformedResponse { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

impl AnalysisError {
    /// Shorthand for [`AnalysisError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Whether the user may re-trigger the same request after this error.
    ///
    /// Nothing in the library retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::ProviderThrottled { .. }
                | Self::EmptyResponse { .. }
                | Self::MalformedResponse { .. }
        )
    }
}
