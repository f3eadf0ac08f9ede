//! Transaction auto-categorization
//!
//! A `Categorizer` maps a free-text description to a category label. The
//! chain tries an AI classifier first, then keyword matching, and always
//! lands on `Other` when neither is confident.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::db::Database;
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};
use crate::voice::keyword_category;

/// Labels offered to the zero-shot classifier
pub const LABELS: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Insurance",
    "Loans",
    "Salary",
    "Entertainment",
    "Travel",
    "Groceries",
    "Other",
];

/// Label used when no categorizer is confident
pub const FALLBACK_LABEL: &str = "Other";

/// Minimum classifier score for an AI guess to be accepted
pub const MIN_AI_SCORE: f64 = 0.3;

#[async_trait]
pub trait Categorizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// A label for `description`, or `None` when not confident
    async fn categorize(&self, description: &str) -> Result<Option<String>>;
}

/// Keyword lookup over the voice-entry keyword map
#[derive(Debug, Default, Clone)]
pub struct KeywordCategorizer;

#[async_trait]
impl Categorizer for KeywordCategorizer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn categorize(&self, description: &str) -> Result<Option<String>> {
        Ok(keyword_category(description).map(str::to_string))
    }
}

/// Zero-shot classification through an AI backend
#[derive(Clone)]
pub struct AiCategorizer {
    client: AIClient,
}

impl AiCategorizer {
    pub fn new(client: AIClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Categorizer for AiCategorizer {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn categorize(&self, description: &str) -> Result<Option<String>> {
        let guess = self.client.classify_category(description, LABELS).await?;
        debug!(label = %guess.label, score = guess.score, "AI category guess");
        if guess.score > MIN_AI_SCORE {
            Ok(Some(guess.label))
        } else {
            Ok(None)
        }
    }
}

/// Tries each categorizer in order; never fails
#[derive(Clone, Default)]
pub struct CategorizerChain {
    categorizers: Vec<Arc<dyn Categorizer>>,
}

impl CategorizerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// AI first (when configured), then keywords
    pub fn standard(ai: Option<AIClient>) -> Self {
        let mut chain = Self::new();
        if let Some(client) = ai {
            chain = chain.with(Arc::new(AiCategorizer::new(client)));
        }
        chain.with(Arc::new(KeywordCategorizer))
    }

    pub fn with(mut self, categorizer: Arc<dyn Categorizer>) -> Self {
        self.categorizers.push(categorizer);
        self
    }

    /// First confident label, or `Other`
    pub async fn categorize(&self, description: &str) -> String {
        for categorizer in &self.categorizers {
            match categorizer.categorize(description).await {
                Ok(Some(label)) => return label,
                Ok(None) => {}
                Err(e) => {
                    warn!(categorizer = categorizer.name(), error = %e, "Categorizer failed");
                }
            }
        }
        FALLBACK_LABEL.to_string()
    }
}

/// Create a transaction, filling in a category from its description when none is given
///
/// Failure to resolve a category is logged and the transaction is stored uncategorized.
pub async fn create_with_category(
    db: &Database,
    chain: &CategorizerChain,
    user_id: i64,
    mut tx: NewTransaction,
) -> Result<Transaction> {
    let description = tx
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    if let (None, Some(description)) = (tx.category_id, description) {
        let label = chain.categorize(&description).await;
        match db.get_or_create_category(user_id, &label) {
            Ok(category) => tx.category_id = Some(category.id),
            Err(e) => warn!(error = %e, "Failed to auto-categorize transaction"),
        }
    }

    db.create_transaction(user_id, &tx)
}
