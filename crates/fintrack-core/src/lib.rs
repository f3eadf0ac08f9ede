//! Fintrack Core Library
//!
//! Shared functionality for the fintrack personal finance application:
//! - Database access and migrations
//! - Password hashing and username derivation
//! - Pluggable AI backends (Ollama, OpenAI-compatible, mock)
//! - Prompt library for customizable AI prompts
//! - Transaction categorization and voice entry parsing
//! - Insights pipeline (anomaly, forecast, reallocation, narrative)
//! - Savings projection, financial health scoring and analytics
//! - Budget history snapshots and recurring payment reminders
//! - CSV exports

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod budget_history;
pub mod categorize;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod health;
pub mod insights;
pub mod models;
pub mod projection;
pub mod prompts;
pub mod reminders;
pub mod voice;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, CategoryGuess, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use config::AppConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use insights::{Insight, InsightEngine, InsightKind};
pub use models::*;
pub use prompts::{PromptId, PromptLibrary};
