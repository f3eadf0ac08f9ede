//! Cumulative savings projection
//!
//! Historical months come from budget history (limit minus spend, floored at
//! zero); the next twelve months add a constant increment on top.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{round_currency, MonthlyBudgetTotals};

/// Number of months projected past the history
pub const PROJECTION_MONTHS: u32 = 12;

/// Fallback increment as a fraction of the total budget
const FALLBACK_RATE: f64 = 0.1;

/// Parallel month labels (`%b`) and cumulative saved amounts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsProjection {
    pub months: Vec<String>,
    pub amounts: Vec<f64>,
}

fn month_label(month: u32) -> String {
    NaiveDate::from_ymd_opt(2000, month, 1)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}

/// Build the series from already-loaded figures
///
/// `history` must be one year's monthly totals in ascending month order.
pub fn build_projection(
    history: &[MonthlyBudgetTotals],
    total_budget: f64,
    average_transaction: f64,
    current_month: u32,
) -> SavingsProjection {
    let mut months = Vec::new();
    let mut amounts = Vec::new();
    let mut cumulative = 0.0;

    for entry in history {
        cumulative += (entry.total_budget - entry.total_spent).max(0.0);
        months.push(month_label(entry.month));
        amounts.push(round_currency(cumulative));
    }

    if history.is_empty() {
        months.push(month_label(current_month));
        amounts.push(0.0);
    }

    let mut increment = total_budget - average_transaction;
    if increment <= 0.0 {
        increment = total_budget * FALLBACK_RATE;
    }

    for i in 1..=PROJECTION_MONTHS {
        cumulative += increment;
        months.push(month_label((current_month + i - 1) % 12 + 1));
        amounts.push(round_currency(cumulative));
    }

    SavingsProjection { months, amounts }
}

/// Projection for a user as of `today`
pub fn project_savings(db: &Database, user_id: i64, today: NaiveDate) -> Result<SavingsProjection> {
    let history = db.monthly_budget_totals(user_id, today.year())?;
    let total_budget = db.total_budget_limit(user_id)?;
    let average = db.average_transaction_amount(user_id, today.year())?;
    Ok(build_projection(&history, total_budget, average, today.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_seed_and_projection() {
        let history = vec![MonthlyBudgetTotals {
            month: 1,
            total_budget: 1500.0,
            total_spent: 1400.0,
        }];
        let p = build_projection(&history, 1500.0, 0.0, 1);
        assert_eq!(p.amounts.len(), 13);
        assert_eq!(p.amounts[0], 100.0);
        assert_eq!(p.amounts[1], 1600.0);
        assert_eq!(p.months[0], "Jan");
        assert_eq!(p.months[1], "Feb");
        assert_eq!(p.months[12], "Jan");
    }

    #[test]
    fn test_no_history_has_thirteen_entries() {
        let p = build_projection(&[], 1000.0, 200.0, 11);
        assert_eq!(p.amounts.len(), 13);
        assert_eq!(p.amounts[0], 0.0);
        assert_eq!(p.months[0], "Nov");
        assert_eq!(p.months[1], "Dec");
        assert_eq!(p.months[2], "Jan");
        assert_eq!(p.amounts[1], 800.0);
    }

    #[test]
    fn test_non_positive_increment_uses_ten_percent() {
        let p = build_projection(&[], 500.0, 900.0, 6);
        assert_eq!(p.amounts[1], 50.0);
        assert_eq!(p.amounts[12], 600.0);
    }

    #[test]
    fn test_overspent_month_contributes_nothing() {
        let history = vec![
            MonthlyBudgetTotals { month: 1, total_budget: 100.0, total_spent: 300.0 },
            MonthlyBudgetTotals { month: 2, total_budget: 100.0, total_spent: 40.0 },
        ];
        let p = build_projection(&history, 0.0, 0.0, 2);
        assert_eq!(&p.amounts[..2], &[0.0, 60.0]);
        assert_eq!(p.amounts.len(), 14);
        assert!(p.amounts.windows(2).all(|w| w[1] >= w[0]));
    }
}
