//! Prompts for fridge analysis, and the composer that fills them in.
//!
//! Every instruction a provider sees lives here so prompt changes are made in
//! one place and can be inspected by unit tests without a provider. The
//! composer is pure: identical inputs always produce an identical payload.

use crate::config::ResponseMode;
use crate::error::AnalysisError;
use crate::output::validate_days;
use serde::Serialize;

/// Instructions for free-text mode, sent as the system block.
pub const FREE_TEXT_INSTRUCTIONS: &str = r#"You are a nutrition expert. Analyse the photo of the refrigerator and compare it with the diet plan.

1. Identify what is already in the refrigerator.
2. Compare it with what the diet plan requires for the given number of days.
3. Write a shopping list grouped by the store's departments.

Assume spices and cooking oil are already at home."#;

/// Instructions for structured mode, prepended to the content block.
pub const STRUCTURED_INSTRUCTIONS: &str = r#"You are a nutrition expert. Analyse the photo of the refrigerator and compare it with the diet plan.

1. Identify what is already in the refrigerator.
2. Compare it with what the diet plan requires for the given number of days.
3. Decide what must be bought, grouped by the store's departments.

Ignore base staples such as spices, salt and cooking oil.

OUTPUT FORMAT
- Reply with exactly one JSON object and nothing else.
- Do NOT add prose, headings or explanations before or after the object.
- Each key is a store department name.
- Each value is an array of strings, one item to buy per string.
- Example: {"Dairy": ["Milk 2 L", "Greek yoghurt"], "Produce": ["Spinach"]}"#;

/// Everything a provider needs besides the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPayload {
    /// Response contract the instructions ask for.
    pub mode: ResponseMode,
    /// Separate system block. `None` when the instructions are folded into
    /// `content`.
    pub instructions: Option<String>,
    /// User-facing text segment: day count and diet text.
    pub content: String,
}

impl PromptPayload {
    /// Instructions and content as one block, for providers that take a
    /// single text part.
    pub fn combined(&self) -> String {
        match &self.instructions {
            Some(instructions) => format!("{}\n\n{}", instructions, self.content),
            None => self.content.clone(),
        }
    }
}

/// Build the prompt for `days` days of `diet_text` under `mode`.
///
/// Fails with [`AnalysisError::InvalidParameter`] when `days` is outside
/// 1–7.
pub fn compose(diet_text: &str, days: u8, mode: ResponseMode) -> Result<PromptPayload, AnalysisError> {
    let days = validate_days(days)?;

    Ok(match mode {
        ResponseMode::FreeText => PromptPayload {
            mode,
            instructions: Some(FREE_TEXT_INSTRUCTIONS.to_string()),
            content: plan_context(diet_text, days),
        },
        ResponseMode::Structured => PromptPayload {
            mode,
            instructions: None,
            content: format!(
                "{}\n\n{}",
                STRUCTURED_INSTRUCTIONS,
                plan_context(diet_text, days)
            ),
        },
    })
}

fn plan_context(diet_text: &str, days: u8) -> String {
    let unit = if days == 1 { "day" } else { "days" };
    format!(
        "Plan for {days} {unit}. Here is the diet plan:\n\n\"\"\"{}\"\"\"",
        diet_text
    )
}
