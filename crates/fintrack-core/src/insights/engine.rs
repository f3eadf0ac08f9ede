//! Insight Engine - runs the stages, caps the output and persists the cache

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use crate::ai::AIClient;
use crate::db::Database;
use crate::models::{currency_symbol, round_currency, CategoryType, NewBudgetInsight, UNCATEGORIZED};
use crate::Result;

use super::types::{Insight, InsightKind, SpendRecord};
use super::{AnomalyStage, ForecastStage, NarrativeStage, ReallocationStage};

/// Default number of cards returned
pub const DEFAULT_MAX_INSIGHTS: usize = 4;

/// Everything a stage may read
pub struct AnalysisContext<'a> {
    pub db: &'a Database,
    /// Optional AI client for the narrative stage
    pub ai: Option<&'a AIClient>,
    pub user_id: i64,
    pub today: NaiveDate,
    /// Display symbol for the user's preferred currency
    pub currency_symbol: String,
    /// Expense history, oldest first
    pub records: Vec<SpendRecord>,
}

impl<'a> AnalysisContext<'a> {
    /// Load the user's expense history and currency
    pub fn load(
        db: &'a Database,
        ai: Option<&'a AIClient>,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<Self> {
        let currency = db.preferred_currency(user_id)?;
        let mut records: Vec<SpendRecord> = db
            .all_transactions(user_id)?
            .into_iter()
            .filter(|t| t.category_type == CategoryType::Expense)
            .map(|t| SpendRecord {
                date: t.date,
                category: t
                    .category_name
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                amount: t.amount,
            })
            .collect();
        records.sort_by_key(|r| r.date);

        Ok(Self {
            db,
            ai,
            user_id,
            today,
            currency_symbol: currency_symbol(&currency),
            records,
        })
    }

    /// Total spend per category, keyed by name
    pub fn category_totals(&self) -> BTreeMap<&str, f64> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for r in &self.records {
            *totals.entry(r.category.as_str()).or_default() += r.amount;
        }
        totals
    }

    /// Daily spend series per category, keyed by name, each ascending by date
    pub fn daily_by_category(&self) -> BTreeMap<&str, Vec<(NaiveDate, f64)>> {
        let mut grouped: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for r in &self.records {
            *grouped
                .entry(r.category.as_str())
                .or_default()
                .entry(r.date)
                .or_default() += r.amount;
        }
        grouped
            .into_iter()
            .map(|(cat, days)| (cat, days.into_iter().collect()))
            .collect()
    }
}

/// One optional step of the pipeline
#[async_trait]
pub trait InsightStage: Send + Sync {
    fn kind(&self) -> InsightKind;

    fn name(&self) -> &'static str;

    /// Capability check; unavailable stages are skipped
    fn is_available(&self, _ctx: &AnalysisContext<'_>) -> bool {
        true
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>>;
}

/// Runs the analysis stages in order and narrates the result
pub struct InsightEngine {
    stages: Vec<Box<dyn InsightStage>>,
    narrator: NarrativeStage,
    max_insights: usize,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Engine with the built-in stages: anomalies, forecasts, reallocations
    pub fn new() -> Self {
        let mut engine = Self {
            stages: vec![],
            narrator: NarrativeStage,
            max_insights: DEFAULT_MAX_INSIGHTS,
        };

        engine.register(Box::new(AnomalyStage::new()));
        engine.register(Box::new(ForecastStage::new()));
        engine.register(Box::new(ReallocationStage::new()));

        engine
    }

    pub fn with_max_insights(mut self, max_insights: usize) -> Self {
        self.max_insights = max_insights;
        self
    }

    pub fn register(&mut self, stage: Box<dyn InsightStage>) {
        self.stages.push(stage);
    }

    pub fn stage_kinds(&self) -> Vec<InsightKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Run every available stage, in registration order, without capping
    ///
    /// A failing stage is logged and contributes nothing.
    pub async fn analyze_all(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let mut all = vec![];

        for stage in &self.stages {
            if !stage.is_available(ctx) {
                tracing::debug!(stage = stage.name(), "Insight stage unavailable, skipping");
                continue;
            }
            match stage.analyze(ctx).await {
                Ok(found) => {
                    tracing::debug!(stage = stage.name(), count = found.len(), "Insight stage complete");
                    all.extend(found);
                }
                Err(e) => {
                    tracing::warn!(stage = stage.name(), error = %e, "Insight stage failed");
                }
            }
        }

        all
    }

    /// Capped and narrated cards (possibly empty)
    pub async fn generate(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let mut insights = self.analyze_all(ctx).await;
        insights.truncate(self.max_insights);
        self.narrate(ctx, &mut insights).await;
        insights
    }

    /// Like `generate`, but never empty: falls back to the insufficient-data card
    pub async fn generate_for_display(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let insights = self.generate(ctx).await;
        if insights.is_empty() {
            vec![Insight::insufficient_data()]
        } else {
            insights
        }
    }

    /// Generate cards for display and refresh the user's budget insight cache
    pub async fn run_and_persist(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let all = self.analyze_all(ctx).await;
        let cache = budget_insights(ctx, &all);
        ctx.db.replace_budget_insights(ctx.user_id, &cache)?;
        tracing::info!(
            user_id = ctx.user_id,
            cached = cache.len(),
            "Budget insights refreshed"
        );

        let mut shown = all;
        shown.truncate(self.max_insights);
        self.narrate(ctx, &mut shown).await;
        if shown.is_empty() {
            shown.push(Insight::insufficient_data());
        }
        Ok(shown)
    }

    async fn narrate(&self, ctx: &AnalysisContext<'_>, insights: &mut [Insight]) {
        for insight in insights.iter_mut() {
            insight.llm_details = Some(self.narrator.narrate(ctx, insight).await);
        }
    }
}

/// Build the cache rows: one per forecast category
fn budget_insights(ctx: &AnalysisContext<'_>, insights: &[Insight]) -> Vec<NewBudgetInsight> {
    let window_start = ctx.today - Duration::days(29);
    let mut recent: BTreeMap<&str, f64> = BTreeMap::new();
    for r in ctx
        .records
        .iter()
        .filter(|r| r.date >= window_start && r.date <= ctx.today)
    {
        *recent.entry(r.category.as_str()).or_default() += r.amount;
    }

    insights
        .iter()
        .filter(|i| i.kind == InsightKind::Forecast)
        .map(|forecast| {
            let average = recent.get(forecast.category.as_str()).copied().unwrap_or(0.0) / 30.0;
            let recommendation = insights
                .iter()
                .find(|i| i.kind == InsightKind::Budget && i.category == forecast.category)
                .map(|i| i.description.clone())
                .unwrap_or_else(|| {
                    format!(
                        "Keep {} spending near {}{:.2} a month to stay on track.",
                        forecast.category,
                        ctx.currency_symbol,
                        average * 30.0
                    )
                });
            NewBudgetInsight {
                category: forecast.category.clone(),
                average_spending: round_currency(average),
                forecasted_spending: round_currency(forecast.data_point),
                savings_recommendation: recommendation,
            }
        })
        .collect()
}
