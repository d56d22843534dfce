//! Value types flowing through the analysis pipeline.

use crate::config::{MAX_DAYS, MIN_DAYS};
use crate::error::AnalysisError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category name under which a free-text reply is shown.
pub const FREE_TEXT_CATEGORY: &str = "Shopping list";

// ── Diet plan ────────────────────────────────────────────────────────────

/// Text extracted from a diet plan document, page by page.
///
/// Immutable once built. Pages without extractable text are kept as empty
/// strings so page numbering still matches the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietPlan {
    pages: Vec<String>,
    text: String,
}

impl DietPlan {
    /// Build a plan from per-page extraction results, in page order.
    ///
    /// `None` marks a page that yielded no text (scanned, image-only). It
    /// contributes nothing to [`DietPlan::text`].
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let pages: Vec<String> = pages.into_iter().map(Option::unwrap_or_default).collect();
        let text = pages.concat();
        Self { pages, text }
    }

    /// The concatenated diet text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Per-page texts, empty for pages without extractable text.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of pages that yielded no text.
    pub fn empty_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_empty()).count()
    }
}

// ── Analysis request ─────────────────────────────────────────────────────

/// One analysis invocation: diet text, day count and the captured photo.
///
/// Construction validates the day count and rejects an empty capture, so an
/// `AnalysisRequest` that exists is always safe to send.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    diet_text: String,
    days: u8,
    image: Vec<u8>,
}

impl AnalysisRequest {
    pub fn new(
        diet_text: impl Into<String>,
        days: u8,
        image: Vec<u8>,
    ) -> Result<Self, AnalysisError> {
        let days = validate_days(days)?;
        if image.is_empty() {
            return Err(AnalysisError::invalid("image", "captured photo is empty"));
        }
        Ok(Self {
            diet_text: diet_text.into(),
            days,
            image,
        })
    }

    pub fn diet_text(&self) -> &str {
        &self.diet_text
    }

    pub fn days(&self) -> u8 {
        self.days
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

/// Check that `days` lies within `MIN_DAYS..=MAX_DAYS`.
pub fn validate_days(days: u8) -> Result<u8, AnalysisError> {
    if (MIN_DAYS..=MAX_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(AnalysisError::invalid(
            "days",
            format!("must be between {MIN_DAYS} and {MAX_DAYS}, got {days}"),
        ))
    }
}

// ── Provider reply ───────────────────────────────────────────────────────

/// The provider's reply body before normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProviderReply {
    pub body: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl RawProviderReply {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }
}

// ── Shopping list ────────────────────────────────────────────────────────

/// The canonical, provider-agnostic shopping list.
///
/// Serialises as a plain JSON object for categorized lists and as a plain
/// string for free-text lists. Categories keep the order the provider gave
/// them in, which follows the store layout the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShoppingList {
    /// Category name → items to buy. Never holds an empty category.
    Categorized(IndexMap<String, Vec<String>>),
    /// Unstructured reply text. Display-only.
    FreeText(String),
}

impl ShoppingList {
    /// Build a categorized list.
    ///
    /// Blank category names and empty categories are dropped, and an item
    /// repeated within a category is kept once. A category seen twice has
    /// its items merged into the first occurrence.
    pub fn categorized<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut map: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, items) in categories {
            if name.trim().is_empty() {
                continue;
            }
            let slot = map.entry(name).or_default();
            for item in items {
                if !slot.contains(&item) {
                    slot.push(item);
                }
            }
        }
        map.retain(|_, items| !items.is_empty());
        Self::Categorized(map)
    }

    /// Whether per-item checklisting is possible.
    pub fn is_checklist_capable(&self) -> bool {
        matches!(self, Self::Categorized(_))
    }

    /// Iterate `(category, items)` pairs in display order.
    ///
    /// A free-text list yields one implicit [`FREE_TEXT_CATEGORY`] holding
    /// the raw text.
    pub fn categories(&self) -> Vec<(&str, Vec<&str>)> {
        match self {
            Self::Categorized(map) => map
                .iter()
                .map(|(name, items)| (name.as_str(), items.iter().map(String::as_str).collect()))
                .collect(),
            Self::FreeText(text) => vec![(FREE_TEXT_CATEGORY, vec![text.as_str()])],
        }
    }

    /// Items listed under `category`, if present.
    pub fn items(&self, category: &str) -> Option<&[String]> {
        match self {
            Self::Categorized(map) => map.get(category).map(Vec::as_slice),
            Self::FreeText(_) => None,
        }
    }

    pub fn category_count(&self) -> usize {
        match self {
            Self::Categorized(map) => map.len(),
            Self::FreeText(_) => 1,
        }
    }

    /// Number of checkable items. Zero for free-text lists.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Categorized(map) => map.values().map(Vec::len).sum(),
            Self::FreeText(_) => 0,
        }
    }

    /// True when there is nothing to buy.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Categorized(map) => map.is_empty(),
            Self::FreeText(text) => text.trim().is_empty(),
        }
    }
}

/// Per-call statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}
