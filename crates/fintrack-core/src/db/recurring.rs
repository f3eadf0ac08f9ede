//! Recurring payments and the reminder log

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{
    DuePayment, NewRecurringPayment, RecurringPayment, RecurringPaymentUpdate, UpcomingBill,
};

const RECURRING_COLUMNS: &str =
    "r.id, r.user_id, r.name, r.amount, r.category, r.frequency, r.next_payment_date, r.status, r.created_at";

fn validate_payment_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidData(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(())
}

impl Database {
    fn row_to_recurring(row: &Row) -> rusqlite::Result<RecurringPayment> {
        let frequency: String = row.get(5)?;
        let next: String = row.get(6)?;
        let status: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        Ok(RecurringPayment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            frequency: parse_enum(5, &frequency)?,
            next_payment_date: parse_date(6, &next)?,
            status: parse_enum(7, &status)?,
            created_at: parse_datetime(&created_at),
        })
    }

    pub fn list_recurring_payments(&self, user_id: i64) -> Result<Vec<RecurringPayment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_payments r WHERE r.user_id = ? ORDER BY r.next_payment_date, r.id",
            RECURRING_COLUMNS
        ))?;
        let payments = stmt
            .query_map(params![user_id], Self::row_to_recurring)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(payments)
    }

    pub fn get_recurring_payment(&self, user_id: i64, id: i64) -> Result<Option<RecurringPayment>> {
        let conn = self.conn()?;
        let payment = conn
            .query_row(
                &format!(
                    "SELECT {} FROM recurring_payments r WHERE r.id = ? AND r.user_id = ?",
                    RECURRING_COLUMNS
                ),
                params![id, user_id],
                Self::row_to_recurring,
            )
            .optional()?;
        Ok(payment)
    }

    pub fn create_recurring_payment(
        &self,
        user_id: i64,
        payment: &NewRecurringPayment,
    ) -> Result<RecurringPayment> {
        if payment.name.trim().is_empty() {
            return Err(Error::InvalidData("Name is required".to_string()));
        }
        validate_payment_amount(payment.amount)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO recurring_payments (user_id, name, amount, category, frequency, next_payment_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                payment.name.trim(),
                payment.amount,
                payment.category,
                payment.frequency.as_str(),
                payment.next_payment_date.to_string(),
                payment.status.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_recurring_payment(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Recurring payment {} not found", id)))
    }

    pub fn update_recurring_payment(
        &self,
        user_id: i64,
        id: i64,
        update: &RecurringPaymentUpdate,
    ) -> Result<RecurringPayment> {
        if let Some(amount) = update.amount {
            validate_payment_amount(amount)?;
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE recurring_payments SET
                name = COALESCE(?, name),
                amount = COALESCE(?, amount),
                category = COALESCE(?, category),
                frequency = COALESCE(?, frequency),
                next_payment_date = COALESCE(?, next_payment_date),
                status = COALESCE(?, status)
            WHERE id = ? AND user_id = ?
            "#,
            params![
                update.name.as_deref().map(str::trim),
                update.amount,
                update.category,
                update.frequency.map(|f| f.as_str()),
                update.next_payment_date.map(|d| d.to_string()),
                update.status.map(|s| s.as_str()),
                id,
                user_id,
            ],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(Error::NotFound(format!("Recurring payment {} not found", id)));
        }
        self.get_recurring_payment(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Recurring payment {} not found", id)))
    }

    pub fn delete_recurring_payment(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM recurring_payments WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Active payments of every user due within `[start, end]`
    pub fn due_payments(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DuePayment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, u.email, COALESCE(p.preferred_currency, 'INR')
            FROM recurring_payments r
            JOIN users u ON u.id = r.user_id
            LEFT JOIN profiles p ON p.user_id = r.user_id
            WHERE r.status = 'active' AND r.next_payment_date >= ? AND r.next_payment_date <= ?
            ORDER BY r.next_payment_date, r.id
            "#,
            RECURRING_COLUMNS
        ))?;
        let due = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(DuePayment {
                    payment: Self::row_to_recurring(row)?,
                    user_email: row.get(9)?,
                    currency: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(due)
    }

    /// Claim the reminder key for (payment, due date) and write the notification
    ///
    /// Both writes share one SQLite transaction, so a failed notification
    /// leaves the key unclaimed for the next pass. Returns false when the key
    /// was already claimed.
    pub fn send_reminder(
        &self,
        payment_id: i64,
        due_date: NaiveDate,
        user_id: i64,
        title: Option<&str>,
        message: &str,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        let claimed = db_tx.execute(
            "INSERT OR IGNORE INTO reminder_log (payment_id, due_date) VALUES (?, ?)",
            params![payment_id, due_date.to_string()],
        )?;
        if claimed == 0 {
            return Ok(false);
        }

        db_tx.execute(
            "INSERT INTO notifications (user_id, title, message, status) VALUES (?, ?, ?, 'sent')",
            params![user_id, title, message],
        )?;
        db_tx.commit()?;

        Ok(true)
    }

    /// Active payments whose next date has already passed
    pub fn overdue_payments(&self, today: NaiveDate) -> Result<Vec<RecurringPayment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_payments r WHERE r.status = 'active' AND r.next_payment_date < ?",
            RECURRING_COLUMNS
        ))?;
        let payments = stmt
            .query_map(params![today.to_string()], Self::row_to_recurring)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(payments)
    }

    pub fn set_next_payment_date(&self, id: i64, date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE recurring_payments SET next_payment_date = ? WHERE id = ?",
            params![date.to_string(), id],
        )?;
        Ok(())
    }

    /// Active payments due today or later, soonest first
    pub fn upcoming_bills(&self, user_id: i64, today: NaiveDate) -> Result<Vec<UpcomingBill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM recurring_payments r
            WHERE r.user_id = ? AND r.status = 'active' AND r.next_payment_date >= ?
            ORDER BY r.next_payment_date, r.id
            "#,
            RECURRING_COLUMNS
        ))?;
        let bills = stmt
            .query_map(params![user_id, today.to_string()], Self::row_to_recurring)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|p| UpcomingBill {
                id: p.id,
                name: p.name,
                amount: p.amount,
                category: p.category,
                frequency: p.frequency,
                days_remaining: (p.next_payment_date - today).num_days(),
                next_payment_date: p.next_payment_date,
            })
            .collect();
        Ok(bills)
    }
}
