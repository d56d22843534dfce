//! The interactive session: one diet plan, one checklist, one call at a time.
//!
//! A [`Session`] is the explicit context object a collaborator (a UI, the
//! CLI, a test) holds for the lifetime of an interaction. Every operation
//! takes `&mut self`, so the borrow checker guarantees at most one analysis
//! in flight per session.
//!
//! ```text
//! load_document ──▶ DietPlan (cached)
//!                       │
//! analyze(photo, days) ─┴─▶ compose ──▶ client.analyze ──▶ normalize ──▶ checklist.load
//! ```

use crate::checklist::ChecklistState;
use crate::config::{AnalysisConfig, ResponseMode};
use crate::error::AnalysisError;
use crate::output::{AnalysisRequest, AnalysisStats, DietPlan, ShoppingList};
use crate::pipeline::extract::extract_diet_plan;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::normalize::normalize;
use crate::prompts::compose;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Session-scoped state and the operations on it.
#[derive(Debug, Default)]
pub struct Session {
    config: AnalysisConfig,
    diet_plan: Option<DietPlan>,
    checklist: ChecklistState,
    last_stats: Option<AnalysisStats>,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // ── Diet plan ─────────────────────────────────────────────────────────

    /// Extract and cache the diet plan from PDF bytes.
    ///
    /// A new document replaces the previous plan wholesale. On failure the
    /// previous plan is kept.
    pub async fn load_document(&mut self, bytes: Vec<u8>) -> Result<&DietPlan, AnalysisError> {
        let plan = extract_diet_plan(bytes).await?;
        info!(
            "Diet plan extracted: {} pages ({} without text), {} chars",
            plan.page_count(),
            plan.empty_pages(),
            plan.text().len()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_complete(plan.page_count(), plan.text().chars().count());
        }
        Ok(self.set_diet_plan(plan))
    }

    /// Install an already extracted plan.
    pub fn set_diet_plan(&mut self, plan: DietPlan) -> &DietPlan {
        self.diet_plan.insert(plan)
    }

    pub fn diet_plan(&self) -> Option<&DietPlan> {
        self.diet_plan.as_ref()
    }

    // ── Analysis ──────────────────────────────────────────────────────────

    /// The response mode an analysis with `client` will use.
    pub fn mode_for(&self, client: &dyn InferenceClient) -> ResponseMode {
        self.config
            .response_mode
            .unwrap_or_else(|| client.response_mode())
    }

    /// Analyse a fridge photo against the cached plan for `days` days.
    ///
    /// On success the new list replaces the checklist. On any failure the
    /// checklist is left exactly as it was; no partial list is stored.
    pub async fn analyze(
        &mut self,
        client: &dyn InferenceClient,
        image: Vec<u8>,
        days: u8,
    ) -> Result<&ShoppingList, AnalysisError> {
        let plan = self.diet_plan.as_ref().ok_or(AnalysisError::DietPlanMissing)?;
        let request = AnalysisRequest::new(plan.text(), days, image)?;

        match self.run(client, &request).await {
            Ok((list, stats)) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_analysis_complete(list.category_count(), list.item_count());
                }
                self.last_stats = Some(stats);
                self.checklist.load(list);
                self.checklist
                    .list()
                    .ok_or_else(|| AnalysisError::Internal("checklist lost its list".into()))
            }
            Err(e) => {
                warn!("Analysis failed: {}", e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_analysis_error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        client: &dyn InferenceClient,
        request: &AnalysisRequest,
    ) -> Result<(ShoppingList, AnalysisStats), AnalysisError> {
        let mode = self.mode_for(client);
        let payload = compose(request.diet_text(), request.days(), mode)?;

        info!(
            "Analysing {} byte photo for {} days via {} ({} mode)",
            request.image().len(),
            request.days(),
            client.provider(),
            mode
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_analysis_start(request.days());
        }

        let start = Instant::now();
        let reply = client.analyze(&payload, request.image()).await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!("Reply: {} chars in {}ms", reply.body.len(), duration_ms);

        let list = normalize(&reply.body, mode)?;

        Ok((
            list,
            AnalysisStats {
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
                duration_ms,
            },
        ))
    }

    /// Statistics of the last successful analysis.
    pub fn last_stats(&self) -> Option<&AnalysisStats> {
        self.last_stats.as_ref()
    }

    // ── Checklist ─────────────────────────────────────────────────────────

    pub fn checklist(&self) -> &ChecklistState {
        &self.checklist
    }

    pub fn shopping_list(&self) -> Option<&ShoppingList> {
        self.checklist.list()
    }

    /// Flip an item's acquired flag. Unknown pairs are ignored.
    pub fn toggle(&mut self, category: &str, item: &str) -> Option<bool> {
        self.checklist.toggle(category, item)
    }

    /// Discard the list and checklist. A fresh analysis is needed before
    /// checklisting again; the diet plan stays loaded.
    pub fn clear(&mut self) {
        self.checklist.clear();
        self.last_stats = None;
    }
}
