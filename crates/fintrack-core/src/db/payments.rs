//! Payment records for revenue reporting

use rusqlite::{params, Row};

use super::{parse_datetime, parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{Payment, PaymentStatus};

impl Database {
    fn row_to_payment(row: &Row) -> rusqlite::Result<Payment> {
        let status: String = row.get(4)?;
        let created_at: String = row.get(5)?;
        Ok(Payment {
            payment_id: row.get(0)?,
            user_id: row.get(1)?,
            username: row.get(2)?,
            amount: row.get(3)?,
            status: parse_enum(4, &status)?,
            created_at: parse_datetime(&created_at),
        })
    }

    /// Record a payment for a user, returning its generated id
    pub fn create_payment(&self, user_id: i64, amount: f64, status: PaymentStatus) -> Result<String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidData(
                "Amount must be a positive number".to_string(),
            ));
        }
        if self.get_user(user_id)?.is_none() {
            return Err(Error::InvalidData("User does not exist".to_string()));
        }

        let payment_id = uuid::Uuid::new_v4().to_string();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO payments (payment_id, user_id, amount, status) VALUES (?, ?, ?, ?)",
            params![payment_id, user_id, amount, status.as_str()],
        )?;
        Ok(payment_id)
    }

    /// List payments, newest first, with an optional username/id search and status filter
    ///
    /// Returns the page and the total match count. A negative limit returns every row.
    pub fn list_payments(
        &self,
        search: Option<&str>,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Payment>, i64)> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = search {
            if !q.trim().is_empty() {
                conditions.push(
                    "(u.username LIKE ? COLLATE NOCASE OR p.payment_id LIKE ?)".to_string(),
                );
                let pattern = format!("%{}%", q.trim());
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
        }

        if let Some(status) = status {
            conditions.push("p.status = ?".to_string());
            params.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM payments p JOIN users u ON u.id = p.user_id {}",
                where_clause
            ),
            params_refs.as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            r#"
            SELECT p.payment_id, p.user_id, u.username, p.amount, p.status, p.created_at
            FROM payments p
            JOIN users u ON u.id = p.user_id
            {}
            ORDER BY p.created_at DESC, p.rowid DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );
        params.push(Box::new(limit));
        params.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let payments = stmt
            .query_map(params_refs.as_slice(), Self::row_to_payment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((payments, total))
    }
}
