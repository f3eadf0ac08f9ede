//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `common` - Shared utilities (open_db, load_config, resolve_date) and `init`
//! - `admin` - Admin account creation
//! - `jobs` - One-shot runs of the reminder and budget snapshot jobs
//! - `insights` - Insight cards for a single user
//! - `serve` - Web server command

pub mod admin;
pub mod common;
pub mod insights;
pub mod jobs;
pub mod serve;

// Re-export command functions for main.rs
pub use admin::*;
pub use common::*;
pub use insights::*;
pub use jobs::*;
pub use serve::*;
