//! Reply normalisation: raw provider text → [`ShoppingList`].
//!
//! Structured replies are parsed strictly. Anything that is not a JSON object
//! of string arrays is rejected as a whole, and so is an object naming the
//! same category twice; a half-parsed list could hide items the user needs,
//! so there is no best-effort recovery. The only tolerance is a single
//! Markdown fence wrapped around the entire reply, which chat models add
//! even when told not to.
//!
//! Free-text replies pass through unchanged.

use crate::config::ResponseMode;
use crate::error::AnalysisError;
use crate::output::ShoppingList;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Normalise `raw` according to the response contract it was requested with.
pub fn normalize(raw: &str, mode: ResponseMode) -> Result<ShoppingList, AnalysisError> {
    match mode {
        ResponseMode::FreeText => Ok(ShoppingList::FreeText(raw.to_string())),
        ResponseMode::Structured => parse_structured(raw),
    }
}

fn parse_structured(raw: &str) -> Result<ShoppingList, AnalysisError> {
    let json = strip_json_fence(raw);

    let StrictCategories(parsed) =
        serde_json::from_str(json).map_err(|e| AnalysisError::MalformedResponse {
            detail: format!("expected a JSON object of string arrays: {e}"),
        })?;

    let total = parsed.len();
    let list = ShoppingList::categorized(
        parsed
            .into_iter()
            .filter_map(|(category, items)| items.map(|items| (category, items))),
    );
    debug!(
        "Normalised {} categories ({} dropped as empty)",
        list.category_count(),
        total - list.category_count()
    );

    Ok(list)
}

/// Category → items in reply order. A `null` value is kept as `None`.
struct StrictCategories(IndexMap<String, Option<Vec<String>>>);

impl<'de> Deserialize<'de> for StrictCategories {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CategoriesVisitor)
    }
}

struct CategoriesVisitor;

impl<'de> Visitor<'de> for CategoriesVisitor {
    type Value = StrictCategories;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping category names to arrays of strings")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut categories = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(category) = access.next_key::<String>()? {
            if categories.contains_key(&category) {
                return Err(de::Error::custom(format!(
                    "category {category:?} appears more than once"
                )));
            }
            let items: Option<Vec<String>> = access.next_value()?;
            categories.insert(category, items);
        }
        Ok(StrictCategories(categories))
    }
}

// ── Outer fence ──────────────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Remove one Markdown code fence enclosing the whole reply, if present.
fn strip_json_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}
