//! One-shot runs of the background jobs
//!
//! Useful from cron when the server runs with its schedulers disabled.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use fintrack_core::budget_history::{snapshot_all, SnapshotReport};
use fintrack_core::config::MAX_REMINDER_LOOKAHEAD_DAYS;
use fintrack_core::db::Database;
use fintrack_core::reminders::{lookahead_end, run_reminder_pass, ReminderReport};

pub fn cmd_reminders(db: &Database, today: NaiveDate, lookahead_days: i64) -> Result<ReminderReport> {
    if !(0..=MAX_REMINDER_LOOKAHEAD_DAYS).contains(&lookahead_days) {
        bail!(
            "Lookahead must be between 0 and {} days",
            MAX_REMINDER_LOOKAHEAD_DAYS
        );
    }

    println!(
        "🔔 Checking recurring payments due {} to {}...",
        today,
        lookahead_end(today, lookahead_days)
    );

    let report = run_reminder_pass(db, today, lookahead_days).context("Reminder pass failed")?;

    println!("   Reminders sent: {}", report.sent);
    if report.skipped > 0 {
        println!("   Already reminded: {}", report.skipped);
    }
    if report.rolled_forward > 0 {
        println!("   Overdue payments rolled forward: {}", report.rolled_forward);
    }

    let purged = db.purge_expired_tokens()?;
    if purged > 0 {
        println!("   Expired revoked tokens purged: {}", purged);
    }

    Ok(report)
}

pub fn cmd_snapshot_budgets(db: &Database, today: NaiveDate) -> Result<SnapshotReport> {
    println!("📊 Snapshotting budgets against last month's spending...");

    let report = snapshot_all(db, today).context("Budget snapshot failed")?;

    println!(
        "✅ Recorded {} budget(s) across {} user(s)",
        report.rows, report.users
    );
    Ok(report)
}
