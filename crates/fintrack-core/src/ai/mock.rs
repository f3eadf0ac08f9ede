//! Mock backend for testing
//!
//! Returns predictable responses without a running model server.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::CategoryGuess;
use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// When set, every operation fails like an unreachable server
    pub failing: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            failing: false,
        }
    }

    /// A backend whose calls all return errors
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }

    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_category(&self, description: &str, labels: &[&str]) -> Result<CategoryGuess> {
        if self.failing {
            return Err(Error::InvalidData("mock backend failure".into()));
        }

        let lower = description.to_lowercase();
        let guess = match lower.as_str() {
            d if d.contains("uber") || d.contains("taxi") || d.contains("metro") => "Transport",
            d if d.contains("pizza") || d.contains("restaurant") || d.contains("cafe") => "Food",
            d if d.contains("amazon") || d.contains("mall") => "Shopping",
            d if d.contains("electricity") || d.contains("internet") => "Bills",
            d if d.contains("payroll") || d.contains("salary") => "Salary",
            d if d.contains("cinema") || d.contains("netflix") => "Entertainment",
            _ => "Other",
        };

        let (label, score) = match labels.iter().find(|l| l.eq_ignore_ascii_case(guess)) {
            Some(l) if guess != "Other" => (l.to_string(), 0.9),
            _ => ("Other".to_string(), 0.2),
        };

        Ok(CategoryGuess { label, score })
    }

    async fn narrate_insights(&self, data: &str) -> Result<String> {
        if self.failing {
            return Err(Error::InvalidData("mock backend failure".into()));
        }
        let first_line = data.lines().next().unwrap_or_default();
        Ok(format!("Mock summary: {}", first_line))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
