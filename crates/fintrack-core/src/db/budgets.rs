//! Budgets and budget history snapshots

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{conflict_on_unique, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetHistory, MonthlyBudgetTotals, MonthlySavingsHistory};

fn validate_limit(limit: f64) -> Result<()> {
    if !limit.is_finite() || limit < 0.0 {
        return Err(Error::InvalidData(
            "Monthly limit must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

impl Database {
    fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
        let created_at: String = row.get(4)?;
        Ok(Budget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            monthly_limit: row.get(3)?,
            created_at: parse_datetime(&created_at),
        })
    }

    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, category, monthly_limit, created_at FROM budgets WHERE user_id = ? ORDER BY category",
        )?;
        let budgets = stmt
            .query_map(params![user_id], Self::row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    pub fn get_budget(&self, user_id: i64, id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                "SELECT id, user_id, category, monthly_limit, created_at FROM budgets WHERE id = ? AND user_id = ?",
                params![id, user_id],
                Self::row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    pub fn create_budget(&self, user_id: i64, category: &str, monthly_limit: f64) -> Result<Budget> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidData("Category is required".to_string()));
        }
        validate_limit(monthly_limit)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO budgets (user_id, category, monthly_limit) VALUES (?, ?, ?)",
            params![user_id, category, monthly_limit],
        )
        .map_err(|e| conflict_on_unique(e, format!("A budget for '{}' already exists", category)))?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_budget(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Budget {} not found", id)))
    }

    pub fn update_budget(
        &self,
        user_id: i64,
        id: i64,
        category: Option<&str>,
        monthly_limit: Option<f64>,
    ) -> Result<Budget> {
        if let Some(limit) = monthly_limit {
            validate_limit(limit)?;
        }

        let conn = self.conn()?;
        let changed = conn
            .execute(
                r#"
                UPDATE budgets SET
                    category = COALESCE(?, category),
                    monthly_limit = COALESCE(?, monthly_limit)
                WHERE id = ? AND user_id = ?
                "#,
                params![category.map(str::trim), monthly_limit, id, user_id],
            )
            .map_err(|e| conflict_on_unique(e, "A budget for that category already exists"))?;
        drop(conn);

        if changed == 0 {
            return Err(Error::NotFound(format!("Budget {} not found", id)));
        }
        self.get_budget(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Budget {} not found", id)))
    }

    pub fn delete_budget(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Set the limit for a category, creating the budget if needed
    pub fn set_budget_limit(&self, user_id: i64, category: &str, monthly_limit: f64) -> Result<Budget> {
        validate_limit(monthly_limit)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category, monthly_limit) VALUES (?, ?, ?)
            ON CONFLICT(user_id, category) DO UPDATE SET monthly_limit = excluded.monthly_limit
            "#,
            params![user_id, category, monthly_limit],
        )?;
        let budget = conn.query_row(
            "SELECT id, user_id, category, monthly_limit, created_at FROM budgets WHERE user_id = ? AND category = ?",
            params![user_id, category],
            Self::row_to_budget,
        )?;
        Ok(budget)
    }

    /// Sum of all current monthly limits for a user
    pub fn total_budget_limit(&self, user_id: i64) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(monthly_limit), 0) FROM budgets WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Expense spend in a category label over `[start, end]`
    pub fn category_spend_between(
        &self,
        user_id: i64,
        category: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        let conn = self.conn()?;
        let spent: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(t.amount), 0)
            FROM transactions t
            JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND c.name = ? COLLATE NOCASE
              AND t.category_type = 'expense'
              AND t.date >= ? AND t.date <= ?
            "#,
            params![user_id, category, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(spent)
    }

    // ========== Budget history ==========

    /// Insert or replace the snapshot for (user, category, month, year)
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_budget_history(
        &self,
        user_id: i64,
        category: &str,
        month: u32,
        year: i32,
        previous_limit: f64,
        actual_spent: f64,
        suggested_limit: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budget_history
                (user_id, category, month, year, previous_limit, actual_spent, suggested_limit)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, category, month, year) DO UPDATE SET
                previous_limit = excluded.previous_limit,
                actual_spent = excluded.actual_spent,
                suggested_limit = excluded.suggested_limit
            "#,
            params![
                user_id,
                category,
                month,
                year,
                previous_limit,
                actual_spent,
                suggested_limit
            ],
        )?;
        Ok(())
    }

    /// Budget history rows, optionally narrowed to a month and/or year
    pub fn list_budget_history(
        &self,
        user_id: i64,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<BudgetHistory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category, month, year, previous_limit, actual_spent, suggested_limit
            FROM budget_history
            WHERE user_id = ?1 AND (?2 IS NULL OR month = ?2) AND (?3 IS NULL OR year = ?3)
            ORDER BY year DESC, month DESC, category
            "#,
        )?;
        let history = stmt
            .query_map(params![user_id, month, year], |row| {
                Ok(BudgetHistory {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    category: row.get(2)?,
                    month: row.get(3)?,
                    year: row.get(4)?,
                    previous_limit: row.get(5)?,
                    actual_spent: row.get(6)?,
                    suggested_limit: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(history)
    }

    /// Per-month totals of budget history for one year, ascending by month
    pub fn monthly_budget_totals(&self, user_id: i64, year: i32) -> Result<Vec<MonthlyBudgetTotals>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT month, SUM(previous_limit), SUM(actual_spent)
            FROM budget_history
            WHERE user_id = ? AND year = ?
            GROUP BY month
            ORDER BY month ASC
            "#,
        )?;
        let totals = stmt
            .query_map(params![user_id, year], |row| {
                Ok(MonthlyBudgetTotals {
                    month: row.get(0)?,
                    total_budget: row.get(1)?,
                    total_spent: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    /// Budget history grouped by month, ordered by (year, month)
    pub fn savings_history(&self, user_id: i64) -> Result<Vec<MonthlySavingsHistory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT year, month, SUM(suggested_limit), SUM(actual_spent), SUM(previous_limit)
            FROM budget_history
            WHERE user_id = ?
            GROUP BY year, month
            ORDER BY year ASC, month ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                let year: i32 = row.get(0)?;
                let month: u32 = row.get(1)?;
                let label = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_else(|| format!("{:02} {}", month, year));
                Ok(MonthlySavingsHistory {
                    month: label,
                    total_saved: row.get(2)?,
                    actual_spent: row.get(3)?,
                    previous_limit: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
