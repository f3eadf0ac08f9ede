//! Monthly budget-history snapshots
//!
//! Each run records, per budget, last month's actual spend against the limit
//! and a suggested limit for the coming month.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::{month_bounds, previous_month};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::round_currency;

/// Suggested limit for next month given the current limit and last month's spend
///
/// Overspending raises the limit by 10%; spending under 70% of it lowers it by 10%.
pub fn suggest_limit(limit: f64, spent: f64) -> f64 {
    if spent > limit {
        round_currency(limit * 1.1)
    } else if spent < limit * 0.7 {
        round_currency(limit * 0.9)
    } else {
        limit
    }
}

/// Counts from one snapshot run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotReport {
    pub users: usize,
    pub rows: usize,
}

/// Snapshot every budget of one user, keyed on the month containing `today`
pub fn snapshot_user(db: &Database, user_id: i64, today: NaiveDate) -> Result<usize> {
    let (prev_year, prev_month) = previous_month(today);
    let (start, end) = month_bounds(prev_year, prev_month)
        .ok_or_else(|| Error::InvalidData(format!("Invalid month {}-{}", prev_year, prev_month)))?;

    let budgets = db.list_budgets(user_id)?;
    for budget in &budgets {
        let spent = db.category_spend_between(user_id, &budget.category, start, end)?;
        let suggested = suggest_limit(budget.monthly_limit, spent);
        db.upsert_budget_history(
            user_id,
            &budget.category,
            today.month(),
            today.year(),
            budget.monthly_limit,
            round_currency(spent),
            suggested,
        )?;
        debug!(user_id, category = %budget.category, spent, suggested, "Budget snapshot");
    }
    Ok(budgets.len())
}

/// Snapshot every user's budgets; a failing user is logged and skipped
pub fn snapshot_all(db: &Database, today: NaiveDate) -> Result<SnapshotReport> {
    let mut report = SnapshotReport::default();
    for user_id in db.list_user_ids()? {
        match snapshot_user(db, user_id, today) {
            Ok(rows) => {
                report.users += 1;
                report.rows += rows;
            }
            Err(e) => warn!(user_id, error = %e, "Budget snapshot failed"),
        }
    }
    info!(users = report.users, rows = report.rows, "Budget history snapshot complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_limit_rules() {
        assert_eq!(suggest_limit(100.0, 150.0), 110.0);
        assert_eq!(suggest_limit(100.0, 50.0), 90.0);
        assert_eq!(suggest_limit(100.0, 70.0), 100.0);
        assert_eq!(suggest_limit(100.0, 100.0), 100.0);
    }
}
