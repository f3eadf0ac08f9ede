//! Insights pipeline
//!
//! Turns a user's expense history into a short list of advisory cards. Each
//! stage is optional: it is skipped when its capability is missing and
//! degrades to an empty result when the data is too thin.
//!
//! ## Stages
//!
//! - **Anomaly** - isolation-forest scoring of daily spend
//! - **Forecast** - linear trend per category over the next 30 days
//! - **Reallocation** - categories taking more than 30% of spend
//! - **Narrative** - optional AI summary per displayed card
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fintrack_core::insights::{AnalysisContext, InsightEngine};
//!
//! let ctx = AnalysisContext::load(&db, ai.as_ref(), user_id, today)?;
//! let cards = InsightEngine::new().generate_for_display(&ctx).await;
//! ```

pub mod anomaly;
pub mod engine;
pub mod forecast;
pub mod narrative;
pub mod reallocation;
pub mod types;

pub use anomaly::AnomalyStage;
pub use engine::{AnalysisContext, InsightEngine, InsightStage};
pub use forecast::ForecastStage;
pub use narrative::NarrativeStage;
pub use reallocation::ReallocationStage;
pub use types::{Insight, InsightKind, SpendRecord};
