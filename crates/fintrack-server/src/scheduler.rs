//! Background jobs
//!
//! Two periodic jobs run alongside the server, configured in `[scheduler]`:
//!
//! - reminders: notify users about recurring payments due soon, then roll
//!   overdue payments forward (`reminder_interval_minutes`)
//! - budget snapshots: record last month's spend against each budget
//!   (`snapshot_interval_hours`)
//!
//! An interval of 0 disables the job, as does one above the configured
//! maximum. Both jobs also purge expired entries from the token revocation list.

use std::time::Duration;

use chrono::Local;
use tokio::time::interval;
use tracing::{error, info, warn};

use fintrack_core::budget_history::snapshot_all;
use fintrack_core::config::{
    SchedulerSection, MAX_REMINDER_INTERVAL_MINUTES, MAX_SNAPSHOT_INTERVAL_HOURS,
};
use fintrack_core::reminders::run_reminder_pass;
use fintrack_core::Database;

/// Why a job was not scheduled
#[derive(Debug, PartialEq, Eq)]
enum PeriodError {
    Disabled,
    TooLong { max: u64 },
}

/// Period for an interval of `value` units of `unit_secs` seconds
fn job_period(value: u64, max: u64, unit_secs: u64) -> Result<Duration, PeriodError> {
    if value == 0 {
        return Err(PeriodError::Disabled);
    }
    if value > max {
        return Err(PeriodError::TooLong { max });
    }
    Ok(Duration::from_secs(value * unit_secs))
}

fn purge_tokens(db: &Database) {
    match db.purge_expired_tokens() {
        Ok(0) => {}
        Ok(n) => info!("Purged {} expired revoked token(s)", n),
        Err(e) => warn!("Failed to purge expired tokens: {}", e),
    }
}

/// Start the recurring payment reminder job as a background task
pub fn start_reminder_scheduler(db: Database, config: &SchedulerSection) {
    let period = match job_period(config.reminder_interval_minutes, MAX_REMINDER_INTERVAL_MINUTES, 60) {
        Ok(period) => period,
        Err(PeriodError::Disabled) => {
            warn!("reminder_interval_minutes is 0, payment reminders disabled");
            return;
        }
        Err(PeriodError::TooLong { max }) => {
            error!(
                "reminder_interval_minutes {} exceeds {}, payment reminders disabled",
                config.reminder_interval_minutes, max
            );
            return;
        }
    };
    let lookahead = config.reminder_lookahead_days;

    info!(
        "Starting reminder scheduler: every {} minutes, {} day lookahead",
        config.reminder_interval_minutes, lookahead
    );

    tokio::spawn(async move {
        let mut ticker = interval(period);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let today = Local::now().date_naive();
            match run_reminder_pass(&db, today, lookahead) {
                Ok(report) => info!(
                    sent = report.sent,
                    skipped = report.skipped,
                    rolled_forward = report.rolled_forward,
                    "Reminder pass completed"
                ),
                Err(e) => error!("Reminder pass failed: {}", e),
            }

            purge_tokens(&db);
        }
    });
}

/// Start the monthly budget snapshot job as a background task
///
/// Snapshots are upserted per (user, category, month, year), so running the
/// job several times in one month only refreshes the current month's rows.
pub fn start_snapshot_scheduler(db: Database, config: &SchedulerSection) {
    let period = match job_period(config.snapshot_interval_hours, MAX_SNAPSHOT_INTERVAL_HOURS, 3600) {
        Ok(period) => period,
        Err(PeriodError::Disabled) => {
            warn!("snapshot_interval_hours is 0, budget history snapshots disabled");
            return;
        }
        Err(PeriodError::TooLong { max }) => {
            error!(
                "snapshot_interval_hours {} exceeds {}, budget history snapshots disabled",
                config.snapshot_interval_hours, max
            );
            return;
        }
    };

    info!(
        "Starting budget snapshot scheduler: every {} hours",
        config.snapshot_interval_hours
    );

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match snapshot_all(&db, Local::now().date_naive()) {
                Ok(report) => info!(
                    users = report.users,
                    rows = report.rows,
                    "Budget snapshot completed"
                ),
                Err(e) => error!("Budget snapshot failed: {}", e),
            }

            purge_tokens(&db);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_disables_job() {
        assert_eq!(job_period(0, 60, 60), Err(PeriodError::Disabled));
        assert_eq!(job_period(0, 744, 3600), Err(PeriodError::Disabled));
    }

    #[test]
    fn test_job_period_units() {
        assert_eq!(job_period(15, 10_080, 60), Ok(Duration::from_secs(900)));
        assert_eq!(job_period(24, 744, 3600), Ok(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        assert_eq!(
            job_period(u64::MAX, MAX_SNAPSHOT_INTERVAL_HOURS, 3600),
            Err(PeriodError::TooLong {
                max: MAX_SNAPSHOT_INTERVAL_HOURS
            })
        );
        assert_eq!(
            job_period(MAX_REMINDER_INTERVAL_MINUTES + 1, MAX_REMINDER_INTERVAL_MINUTES, 60),
            Err(PeriodError::TooLong {
                max: MAX_REMINDER_INTERVAL_MINUTES
            })
        );
    }
}
