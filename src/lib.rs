//! # fridge2list
//!
//! Turn a diet plan PDF and a photo of the refrigerator into a categorized
//! shopping list, using a multimodal Language Model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! diet plan PDF                                  fridge photo + days
//!  │                                                     │
//!  ├─ 1. Extract  per-page text via pdfium               │
//!  │              (empty pages contribute nothing)       │
//!  └──────────────────────────┬──────────────────────────┘
//!                             ├─ 2. Compose   instructions + days + diet text
//!                             ├─ 3. Call      chat completion or JSON-forced generation
//!                             ├─ 4. Normalise strict JSON → category → items
//!                             └─ 5. Checklist per-item acquired flags, clear/reload
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fridge2list::{AnalysisConfig, Session, StructuredClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     // Fails at startup when GEMINI_API_KEY is missing.
//!     let client = StructuredClient::from_env(&config)?;
//!
//!     let mut session = Session::new(config);
//!     session.load_document(std::fs::read("diet.pdf")?).await?;
//!     let list = session.analyze(&client, std::fs::read("fridge.jpg")?, 3).await?;
//!     println!("{}", serde_json::to_string_pretty(list)?);
//!
//!     session.toggle("Dairy", "Milk");
//!     Ok(())
//! }
//! ```
//!
//! ## Response Modes
//!
//! | Mode | Client | Output | Checklist |
//! |------|--------|--------|-----------|
//! | `FreeText`   | [`ConversationalClient`] (`gpt-4o`)         | Markdown grouped by department | display-only |
//! | `Structured` | [`StructuredClient`] (`gemini-2.0-flash`)  | `{"Dairy": ["Milk"], …}`       | per item     |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fridge2list` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod checklist;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use checklist::{ChecklistEntry, ChecklistState};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ResponseMode, DEFAULT_DAYS, MAX_DAYS, MIN_DAYS};
pub use error::AnalysisError;
pub use output::{AnalysisRequest, AnalysisStats, DietPlan, RawProviderReply, ShoppingList, FREE_TEXT_CATEGORY};
pub use pipeline::extract::extract_diet_plan;
pub use pipeline::llm::{ConversationalClient, InferenceClient};
pub use pipeline::normalize::normalize;
pub use pipeline::structured::StructuredClient;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{compose, PromptPayload};
pub use session::Session;
