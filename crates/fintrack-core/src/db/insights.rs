//! Cached budget insight records

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{BudgetInsight, NewBudgetInsight};

impl Database {
    /// Replace a user's cached insights with a fresh set
    pub fn replace_budget_insights(
        &self,
        user_id: i64,
        insights: &[NewBudgetInsight],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        db_tx.execute(
            "DELETE FROM budget_insights WHERE user_id = ?",
            params![user_id],
        )?;
        for insight in insights {
            db_tx.execute(
                r#"
                INSERT INTO budget_insights
                    (user_id, category, average_spending, forecasted_spending, savings_recommendation)
                VALUES (?, ?, ?, ?, ?)
                "#,
                params![
                    user_id,
                    insight.category,
                    insight.average_spending,
                    insight.forecasted_spending,
                    insight.savings_recommendation
                ],
            )?;
        }
        db_tx.commit()?;
        Ok(())
    }

    /// Cached insights, newest first
    pub fn list_budget_insights(&self, user_id: i64) -> Result<Vec<BudgetInsight>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category, average_spending, forecasted_spending,
                   savings_recommendation, created_at
            FROM budget_insights
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;
        let insights = stmt
            .query_map(params![user_id], |row| {
                let created_at: String = row.get(6)?;
                Ok(BudgetInsight {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    category: row.get(2)?,
                    average_spending: row.get(3)?,
                    forecasted_spending: row.get(4)?,
                    savings_recommendation: row.get(5)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(insights)
    }
}
