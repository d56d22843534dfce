//! Pipeline stages for turning a diet plan and a fridge photo into a list.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompts) ──▶ encode ──▶ llm / structured ──▶ normalize
//! (paths)   (pdfium)    (compose)     (image)    (provider call)       (list)
//! ```
//!
//! 1. [`input`]       read files for path-holding callers
//! 2. [`extract`]     concatenate per-page text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]      inline base64 or decode/scale/re-encode the photo
//! 4. [`llm`]         the [`llm::InferenceClient`] trait and the
//!    chat-completion client
//! 5. [`structured`]  the JSON-forcing Gemini client
//! 6. [`normalize`]   strict reply parsing into a `ShoppingList`

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod structured;
