//! Savings goal operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    round_currency, NewSavingsGoal, SavingsGoal, SavingsGoalUpdate, SAVINGS_CATEGORY,
};

const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, saved_amount, deadline, created_at";

/// Split `total` across goals already sorted by priority
///
/// Each goal is filled up to its target in order; whatever is left over lands
/// on the last goal.
fn validate_saved_amount(saved: f64) -> Result<()> {
    if !saved.is_finite() || saved < 0.0 {
        return Err(Error::InvalidData(
            "Saved amount must be zero or a positive number".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn allocate_savings(total: f64, targets: &[f64]) -> Vec<f64> {
    let mut remaining = total.max(0.0);
    let mut allocated = Vec::with_capacity(targets.len());

    for target in targets {
        let share = remaining.min(target.max(0.0));
        allocated.push(share);
        remaining -= share;
    }

    if remaining > 0.0 {
        if let Some(last) = allocated.last_mut() {
            *last += remaining;
        }
    }

    allocated
}

impl Database {
    fn row_to_goal(row: &Row) -> rusqlite::Result<SavingsGoal> {
        let deadline: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;
        Ok(SavingsGoal {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            target_amount: row.get(3)?,
            saved_amount: row.get(4)?,
            deadline: deadline.as_deref().map(|s| parse_date(5, s)).transpose()?,
            created_at: parse_datetime(&created_at),
        })
    }

    /// Goals ordered by deadline, goals without one last
    pub fn list_goals(&self, user_id: i64) -> Result<Vec<SavingsGoal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM savings_goals WHERE user_id = ? ORDER BY deadline IS NULL, deadline ASC, id ASC",
            GOAL_COLUMNS
        ))?;
        let goals = stmt
            .query_map(params![user_id], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    pub fn get_goal(&self, user_id: i64, id: i64) -> Result<Option<SavingsGoal>> {
        let conn = self.conn()?;
        let goal = conn
            .query_row(
                &format!(
                    "SELECT {} FROM savings_goals WHERE id = ? AND user_id = ?",
                    GOAL_COLUMNS
                ),
                params![id, user_id],
                Self::row_to_goal,
            )
            .optional()?;
        Ok(goal)
    }

    pub fn create_goal(&self, user_id: i64, goal: &NewSavingsGoal) -> Result<SavingsGoal> {
        if goal.name.trim().is_empty() {
            return Err(Error::InvalidData("Goal name is required".to_string()));
        }
        if !goal.target_amount.is_finite() || goal.target_amount <= 0.0 {
            return Err(Error::InvalidData(
                "Target amount must be a positive number".to_string(),
            ));
        }
        validate_saved_amount(goal.saved_amount)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_goals (user_id, name, target_amount, saved_amount, deadline)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                goal.name.trim(),
                goal.target_amount,
                goal.saved_amount,
                goal.deadline.map(|d| d.to_string()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_goal(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Goal {} not found", id)))
    }

    pub fn update_goal(
        &self,
        user_id: i64,
        id: i64,
        update: &SavingsGoalUpdate,
    ) -> Result<SavingsGoal> {
        if let Some(target) = update.target_amount {
            if !target.is_finite() || target <= 0.0 {
                return Err(Error::InvalidData(
                    "Target amount must be a positive number".to_string(),
                ));
            }
        }
        if let Some(saved) = update.saved_amount {
            validate_saved_amount(saved)?;
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE savings_goals SET
                name = COALESCE(?, name),
                target_amount = COALESCE(?, target_amount),
                saved_amount = COALESCE(?, saved_amount),
                deadline = COALESCE(?, deadline)
            WHERE id = ? AND user_id = ?
            "#,
            params![
                update.name.as_deref().map(str::trim),
                update.target_amount,
                update.saved_amount,
                update.deadline.map(|d| d.to_string()),
                id,
                user_id,
            ],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(Error::NotFound(format!("Goal {} not found", id)));
        }
        self.get_goal(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Goal {} not found", id)))
    }

    pub fn delete_goal(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM savings_goals WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Total of the user's expense transactions in the savings category
    pub fn savings_contributions(&self, user_id: i64) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(t.amount), 0)
            FROM transactions t
            JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND c.name = ? COLLATE NOCASE AND t.category_type = 'expense'
            "#,
            params![user_id, SAVINGS_CATEGORY],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Recompute every goal's saved amount from savings transactions
    pub fn recompute_goal_progress(&self, user_id: i64) -> Result<Vec<SavingsGoal>> {
        let goals = self.list_goals(user_id)?;
        if goals.is_empty() {
            return Ok(goals);
        }

        let total = self.savings_contributions(user_id)?;
        let targets: Vec<f64> = goals.iter().map(|g| g.target_amount).collect();
        let allocation = allocate_savings(total, &targets);

        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        for (goal, saved) in goals.iter().zip(&allocation) {
            db_tx.execute(
                "UPDATE savings_goals SET saved_amount = ? WHERE id = ?",
                params![round_currency(*saved), goal.id],
            )?;
        }
        db_tx.commit()?;
        drop(conn);

        self.list_goals(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::allocate_savings;

    #[test]
    fn test_allocate_fills_in_order() {
        assert_eq!(allocate_savings(150.0, &[100.0, 200.0]), vec![100.0, 50.0]);
    }

    #[test]
    fn test_allocate_remainder_to_last() {
        assert_eq!(allocate_savings(400.0, &[100.0, 200.0]), vec![100.0, 300.0]);
    }

    #[test]
    fn test_allocate_nothing_saved() {
        assert_eq!(allocate_savings(0.0, &[100.0]), vec![0.0]);
        assert!(allocate_savings(50.0, &[]).is_empty());
    }
}
