//! Aggregate queries for analytics and the admin dashboard

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::params;
use serde::Serialize;

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::UNCATEGORIZED;

/// Income and expense sums over a period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expenses: f64,
}

/// Income and expense sums for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub banned_users: i64,
    /// Users who logged in during the last 30 days
    pub recently_active_users: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RevenueStats {
    pub total_revenue: f64,
    pub monthly_revenue: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentMetrics {
    /// Sum of completed payments
    pub total_revenue: f64,
    pub completed: i64,
    pub pending: i64,
    pub failed: i64,
}

/// Optional filters for the admin dashboard
#[derive(Debug, Clone, Default)]
pub struct AdminDashboardFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthAmount {
    /// "%Y-%m"
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeBreakdown {
    pub category_type: String,
    pub count: i64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_transactions: i64,
    pub total_payments: i64,
    pub total_revenue: f64,
    pub revenue_by_month: Vec<MonthAmount>,
    pub transactions_by_type: Vec<TypeBreakdown>,
    pub payments_by_status: Vec<StatusCount>,
}

impl Database {
    /// Income and expense totals, optionally bounded by `[start, end]`
    pub fn type_totals(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<MonthlyTotals> {
        let conn = self.conn()?;
        let totals = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN category_type = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN category_type = 'expense' THEN amount END), 0)
            FROM transactions
            WHERE user_id = ?1
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
            "#,
            params![
                user_id,
                start.map(|d| d.to_string()),
                end.map(|d| d.to_string())
            ],
            |row| {
                Ok(MonthlyTotals {
                    income: row.get(0)?,
                    expenses: row.get(1)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Per-day income and expense sums for days with activity, ascending
    pub fn daily_totals(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTotals>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date,
                   COALESCE(SUM(CASE WHEN category_type = 'income' THEN amount END), 0),
                   COALESCE(SUM(CASE WHEN category_type = 'expense' THEN amount END), 0)
            FROM transactions
            WHERE user_id = ? AND date >= ? AND date <= ?
            GROUP BY date
            ORDER BY date ASC
            "#,
        )?;
        let days = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                |row| {
                    let date: String = row.get(0)?;
                    Ok(DailyTotals {
                        date: parse_date(0, &date)?,
                        income: row.get(1)?,
                        expenses: row.get(2)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(days)
    }

    /// Expense totals per category over `[start, end]`, largest first
    pub fn expense_by_category(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT COALESCE(c.name, ?), SUM(t.amount) AS total
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND t.category_type = 'expense'
              AND t.date >= ? AND t.date <= ?
            GROUP BY 1
            ORDER BY total DESC
            "#,
        )?;
        let totals = stmt
            .query_map(
                params![UNCATEGORIZED, user_id, start.to_string(), end.to_string()],
                |row| {
                    Ok(CategoryTotal {
                        category: row.get(0)?,
                        amount: row.get(1)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    /// Mean transaction amount within a calendar year (0 when there are none)
    pub fn average_transaction_amount(&self, user_id: i64, year: i32) -> Result<f64> {
        let conn = self.conn()?;
        let avg: Option<f64> = conn.query_row(
            "SELECT AVG(amount) FROM transactions WHERE user_id = ? AND strftime('%Y', date) = ?",
            params![user_id, format!("{:04}", year)],
            |row| row.get(0),
        )?;
        Ok(avg.unwrap_or(0.0))
    }

    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ========== Admin ==========

    pub fn user_stats(&self) -> Result<UserStats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(is_active = 1), 0),
                   COALESCE(SUM(is_active = 0), 0),
                   COALESCE(SUM(last_login >= datetime('now', '-30 days')), 0)
            FROM users
            "#,
            [],
            |row| {
                Ok(UserStats {
                    total_users: row.get(0)?,
                    active_users: row.get(1)?,
                    banned_users: row.get(2)?,
                    recently_active_users: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Transaction volume overall and for the month containing `today`
    pub fn revenue_stats(&self, today: NaiveDate) -> Result<RevenueStats> {
        let conn = self.conn()?;
        let month_start = today.with_day(1).unwrap_or(today);
        let stats = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0),
                   COALESCE(SUM(CASE WHEN date >= ? AND date <= ? THEN amount END), 0)
            FROM transactions
            "#,
            params![month_start.to_string(), today.to_string()],
            |row| {
                Ok(RevenueStats {
                    total_revenue: row.get(0)?,
                    monthly_revenue: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    pub fn payment_metrics(&self) -> Result<PaymentMetrics> {
        let conn = self.conn()?;
        let metrics = conn.query_row(
            r#"
            SELECT COALESCE(SUM(CASE WHEN status = 'completed' THEN amount END), 0),
                   COALESCE(SUM(status = 'completed'), 0),
                   COALESCE(SUM(status = 'pending'), 0),
                   COALESCE(SUM(status = 'failed'), 0)
            FROM payments
            "#,
            [],
            |row| {
                Ok(PaymentMetrics {
                    total_revenue: row.get(0)?,
                    completed: row.get(1)?,
                    pending: row.get(2)?,
                    failed: row.get(3)?,
                })
            },
        )?;
        Ok(metrics)
    }

    pub fn admin_dashboard(&self, filter: &AdminDashboardFilter) -> Result<AdminDashboard> {
        let conn = self.conn()?;

        // Inclusive end date: compare against the following day for timestamps
        let start = filter.start_date.map(|d| d.to_string());
        let end_exclusive = filter
            .end_date
            .map(|d| (d + Duration::days(1)).to_string());
        let end = filter.end_date.map(|d| d.to_string());

        let total_users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        let total_transactions: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
              AND (?3 IS NULL OR category_type = ?3)
            "#,
            params![start, end, filter.transaction_type],
            |row| row.get(0),
        )?;

        let (total_payments, total_revenue): (i64, f64) = conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'completed' THEN amount END), 0)
            FROM payments
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
              AND (?3 IS NULL OR status = ?3)
            "#,
            params![start, end_exclusive, filter.payment_status],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', created_at) AS month, SUM(amount)
            FROM payments
            WHERE status = 'completed'
              AND (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
            GROUP BY month
            ORDER BY month ASC
            "#,
        )?;
        let revenue_by_month = stmt
            .query_map(params![start, end_exclusive], |row| {
                Ok(MonthAmount {
                    month: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT category_type, COUNT(*), SUM(amount)
            FROM transactions
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
              AND (?3 IS NULL OR category_type = ?3)
            GROUP BY category_type
            ORDER BY category_type
            "#,
        )?;
        let transactions_by_type = stmt
            .query_map(params![start, end, filter.transaction_type], |row| {
                Ok(TypeBreakdown {
                    category_type: row.get(0)?,
                    count: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT status, COUNT(*)
            FROM payments
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
              AND (?3 IS NULL OR status = ?3)
            GROUP BY status
            ORDER BY status
            "#,
        )?;
        let payments_by_status = stmt
            .query_map(params![start, end_exclusive, filter.payment_status], |row| {
                Ok(StatusCount {
                    status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(AdminDashboard {
            total_users,
            total_transactions,
            total_payments,
            total_revenue,
            revenue_by_month,
            transactions_by_type,
            payments_by_status,
        })
    }
}
