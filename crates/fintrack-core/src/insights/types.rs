//! Insight card types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Narrative used when no AI provider is configured
pub const MISSING_PROVIDER_NARRATIVE: &str = "Your AI spending report shows actionable areas for improvement based on recent transactional velocity. Review the smart budgets to optimize your savings.";

/// Narrative used when the AI provider fails
pub const PROVIDER_FAILURE_NARRATIVE: &str = "Our AI is currently analyzing your financial velocity. Please check back later for your highly personalized report.";

/// Kind of insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightKind {
    Anomaly,
    Forecast,
    Budget,
    General,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anomaly => "Anomaly",
            Self::Forecast => "Forecast",
            Self::Budget => "Budget",
            Self::General => "General",
        }
    }
}

/// One advisory card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub category: String,
    pub data_point: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_details: Option<String>,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        title: String,
        description: String,
        category: &str,
        data_point: f64,
    ) -> Self {
        Self {
            kind,
            title,
            description,
            category: category.to_string(),
            data_point,
            llm_details: None,
        }
    }

    /// Placeholder card shown when no stage produced anything
    pub fn insufficient_data() -> Self {
        Self {
            kind: InsightKind::General,
            title: "Insufficient Data".to_string(),
            description: "Start adding transactions and a budget to receive personalized AI financial forecasts.".to_string(),
            category: "All".to_string(),
            data_point: 0.0,
            llm_details: Some("Keep using the app and wait for more data to be collected.".to_string()),
        }
    }
}

/// One expense transaction, reduced to what the stages need
#[derive(Debug, Clone, PartialEq)]
pub struct SpendRecord {
    pub date: NaiveDate,
    /// Category name, `Uncategorized` when missing
    pub category: String,
    pub amount: f64,
}
