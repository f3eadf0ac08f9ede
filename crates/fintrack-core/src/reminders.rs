//! Recurring payment reminders
//!
//! One idempotent pass: every active payment due in the lookahead window gets
//! at most one notification per due date, then overdue payments roll forward.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MAX_REMINDER_LOOKAHEAD_DAYS;
use crate::db::Database;
use crate::error::Result;
use crate::models::{currency_symbol, DuePayment};

/// Default number of days ahead to remind about
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 3;

/// Counts from one reminder pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    /// Notifications created
    pub sent: usize,
    /// Payments already reminded for this due date
    pub skipped: usize,
    /// Overdue payments whose next date was moved forward
    pub rolled_forward: usize,
}

/// Reminder text for a payment due `days` from today
pub fn reminder_message(name: &str, amount: f64, currency: &str, days: i64) -> String {
    let symbol = currency_symbol(currency);
    if days <= 0 {
        format!("Reminder: {} payment of {}{:.2} is due today!", name, symbol, amount)
    } else {
        format!(
            "Reminder: {} bill of {}{:.2} is due in {} days.",
            name, symbol, amount, days
        )
    }
}

/// Last due date covered by a pass, with the lookahead clamped to its supported range
pub fn lookahead_end(today: NaiveDate, lookahead_days: i64) -> NaiveDate {
    let days = lookahead_days.clamp(0, MAX_REMINDER_LOOKAHEAD_DAYS);
    today
        .checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

fn remind(db: &Database, due: &DuePayment, today: NaiveDate) -> Result<bool> {
    let payment = &due.payment;
    let days = (payment.next_payment_date - today).num_days();
    let message = reminder_message(&payment.name, payment.amount, &due.currency, days);
    if !db.send_reminder(
        payment.id,
        payment.next_payment_date,
        payment.user_id,
        Some("Payment Reminder"),
        &message,
    )? {
        return Ok(false);
    }
    info!(
        payment_id = payment.id,
        user = %due.user_email,
        due = %payment.next_payment_date,
        "{}",
        message
    );
    Ok(true)
}

/// Run one reminder pass for `[today, today + lookahead]`
pub fn run_reminder_pass(db: &Database, today: NaiveDate, lookahead_days: i64) -> Result<ReminderReport> {
    let mut report = ReminderReport::default();

    for due in db.due_payments(today, lookahead_end(today, lookahead_days))? {
        match remind(db, &due, today) {
            Ok(true) => report.sent += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => warn!(payment_id = due.payment.id, error = %e, "Failed to send reminder"),
        }
    }

    for payment in db.overdue_payments(today)? {
        let mut next = payment.next_payment_date;
        while next < today {
            next = payment.frequency.advance(next);
        }
        db.set_next_payment_date(payment.id, next)?;
        report.rolled_forward += 1;
    }

    info!(
        sent = report.sent,
        skipped = report.skipped,
        rolled_forward = report.rolled_forward,
        "Reminder pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_messages() {
        assert_eq!(
            reminder_message("Rent", 1200.0, "INR", 0),
            "Reminder: Rent payment of ₹1200.00 is due today!"
        );
        assert_eq!(
            reminder_message("Netflix", 9.5, "USD", 2),
            "Reminder: Netflix bill of $9.50 is due in 2 days."
        );
    }

    #[test]
    fn test_lookahead_end_is_clamped() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(lookahead_end(today, 3), NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
        assert_eq!(lookahead_end(today, -5), today);
        assert_eq!(
            lookahead_end(today, i64::MAX),
            today + Duration::days(MAX_REMINDER_LOOKAHEAD_DAYS)
        );
        assert_eq!(lookahead_end(NaiveDate::MAX, 3), NaiveDate::MAX);
    }
}
