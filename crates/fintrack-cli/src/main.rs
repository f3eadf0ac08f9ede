//! Fintrack CLI - Personal finance tracker
//!
//! Usage:
//!   fintrack init                           Initialize database
//!   fintrack serve --port 3000              Start web server and background jobs
//!   fintrack create-admin --email E --password P
//!   fintrack reminders                      Run one recurring payment reminder pass
//!   fintrack snapshot-budgets               Record budget history for last month
//!   fintrack insights --user NAME           Print insight cards for a user

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                cli.no_encrypt,
                config,
                host,
                port,
                static_dir,
            )
            .await
        }
        Commands::CreateAdmin {
            email,
            password,
            full_name,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_create_admin(&db, &email, &password, full_name.as_deref()).map(|_| ())
        }
        Commands::Reminders { date, lookahead } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let lookahead = lookahead.unwrap_or(config.scheduler.reminder_lookahead_days);
            commands::cmd_reminders(&db, commands::resolve_date(date), lookahead).map(|_| ())
        }
        Commands::SnapshotBudgets { date } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_snapshot_budgets(&db, commands::resolve_date(date)).map(|_| ())
        }
        Commands::Insights { user, date, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_insights(
                &db,
                &user,
                commands::resolve_date(date),
                config.insights.max_insights,
                json,
            )
            .await
            .map(|_| ())
        }
    }
}
