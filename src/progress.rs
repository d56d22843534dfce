//! Progress-callback trait for extraction and analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told when
//! a diet plan has been read, when a provider call starts, and how it ended.
//! The CLI uses it to drive a spinner; a UI would use it to disable the
//! "generate" trigger while a call is outstanding.
//!
//! # Example
//!
//! ```rust
//! use fridge2list::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CallCounter {
//!     calls: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CallCounter {
//!     fn on_analysis_start(&self, days: u8) {
//!         self.calls.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("planning for {days} days");
//!     }
//! }
//!
//! let counter = Arc::new(CallCounter { calls: AtomicUsize::new(0) });
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::session::Session`] as it works.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once a diet plan document has been turned into text.
    ///
    /// # Arguments
    /// * `pages`: number of pages in the document
    /// * `chars`: length of the extracted text in characters
    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        let _ = (pages, chars);
    }

    /// Called just before the provider request is sent.
    fn on_analysis_start(&self, days: u8) {
        let _ = days;
    }

    /// Called when a reply was normalised into a shopping list.
    ///
    /// # Arguments
    /// * `categories`: number of categories in the list
    /// * `items`     : number of items across all categories
    fn on_analysis_complete(&self, categories: usize, items: usize) {
        let _ = (categories, items);
    }

    /// Called when the analysis failed, with a human-readable description.
    fn on_analysis_error(&self, error: &str) {
        let _ = error;
    }
}

/// Convenience type alias for a shared callback.
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

/// No-op implementation used when the caller does not provide one.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}
