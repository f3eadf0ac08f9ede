//! Reallocation stage: flags categories that dominate total spend

use async_trait::async_trait;

use crate::error::Result;

use super::engine::{AnalysisContext, InsightStage};
use super::types::{Insight, InsightKind};

/// Share of total spend above which a category is flagged
pub const SHARE_THRESHOLD: f64 = 0.3;

/// Suggested cut as a fraction of the category's spend
pub const SUGGESTED_CUT: f64 = 0.15;

#[derive(Default)]
pub struct ReallocationStage;

impl ReallocationStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InsightStage for ReallocationStage {
    fn kind(&self) -> InsightKind {
        InsightKind::Budget
    }

    fn name(&self) -> &'static str {
        "reallocation"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let totals = ctx.category_totals();
        let overall: f64 = totals.values().sum();
        if overall <= 0.0 {
            return Ok(vec![]);
        }

        let insights = totals
            .into_iter()
            .filter_map(|(category, amount)| {
                let share = amount / overall;
                if share <= SHARE_THRESHOLD {
                    return None;
                }
                let cut = amount * SUGGESTED_CUT;
                Some(Insight::new(
                    InsightKind::Budget,
                    format!("Smart Budget Recommendation: {}", category),
                    format!(
                        "You allocate a high volume ({:.1}%) of spending to {}. AI suggests reducing it by {}{:.2} this month.",
                        share * 100.0,
                        category,
                        ctx.currency_symbol,
                        cut
                    ),
                    category,
                    cut,
                ))
            })
            .collect();

        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::insights::types::SpendRecord;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_flags_dominant_category() {
        let db = Database::in_memory().unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let records = [("Rent", 600.0), ("Food", 250.0), ("Fun", 150.0)]
            .into_iter()
            .map(|(c, a)| SpendRecord {
                date: on,
                category: c.to_string(),
                amount: a,
            })
            .collect();
        let ctx = AnalysisContext {
            db: &db,
            ai: None,
            user_id: 1,
            today: on,
            currency_symbol: "$".to_string(),
            records,
        };

        let insights = ReallocationStage::new().analyze(&ctx).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, "Rent");
        assert!((insights[0].data_point - 90.0).abs() < 1e-9);
        assert_eq!(
            insights[0].description,
            "You allocate a high volume (60.0%) of spending to Rent. AI suggests reducing it by $90.00 this month."
        );
    }
}
