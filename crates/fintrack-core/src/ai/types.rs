//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

/// Result of zero-shot category classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGuess {
    /// One of the candidate labels
    pub label: String,
    /// Confidence between 0.0 and 1.0
    pub score: f64,
}
