//! Narrative stage: optional AI summary for each displayed card

use crate::ai::AIBackend;

use super::engine::AnalysisContext;
use super::types::{Insight, MISSING_PROVIDER_NARRATIVE, PROVIDER_FAILURE_NARRATIVE};

#[derive(Debug, Default, Clone, Copy)]
pub struct NarrativeStage;

impl NarrativeStage {
    /// Summary text for one card; never fails
    pub async fn narrate(&self, ctx: &AnalysisContext<'_>, insight: &Insight) -> String {
        let Some(ai) = ctx.ai else {
            return MISSING_PROVIDER_NARRATIVE.to_string();
        };

        let mut card = insight.clone();
        card.llm_details = None;
        let data = match serde_json::to_string_pretty(&[card]) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize insight for narrative");
                return PROVIDER_FAILURE_NARRATIVE.to_string();
            }
        };

        match ai.narrate_insights(&data).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(model = ai.model(), error = %e, "Narrative generation failed");
                PROVIDER_FAILURE_NARRATIVE.to_string()
            }
        }
    }
}
