//! CLI argument definitions using clap
//!
//! The command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Fintrack - Track spending, budgets and savings goals
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Self-hosted personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <config_dir>/fintrack/config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path
    #[arg(long, default_value = "fintrack.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FINTRACK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server and background jobs
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Directory of static frontend files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,
    },

    /// Run one recurring payment reminder pass
    Reminders {
        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Days ahead to look for due payments (overrides config)
        #[arg(long)]
        lookahead: Option<i64>,
    },

    /// Snapshot every budget against last month's spending
    SnapshotBudgets {
        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Generate insight cards for a user
    Insights {
        /// Username or email
        #[arg(short, long)]
        user: String,

        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
