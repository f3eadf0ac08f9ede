//! Insight cards, budget suggestions and savings projections

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use fintrack_core::insights::AnalysisContext;
use fintrack_core::models::{BudgetInsight, MonthlySavingsHistory};
use fintrack_core::projection::{project_savings, SavingsProjection};
use fintrack_core::{Insight, InsightEngine};

use super::today;
use crate::{parse_body, AppError, AppState, CurrentUser};

/// GET /api/insights - Run the insight pipeline for the caller
///
/// Never empty: with too little data a single general card is returned.
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let ctx = AnalysisContext::load(&state.db, state.ai.as_ref(), user.id, today())?;
    let engine = InsightEngine::new().with_max_insights(state.config.insights.max_insights);
    let insights = engine.run_and_persist(&ctx).await?;

    info!(user_id = user.id, count = insights.len(), "Generated insights");
    Ok(Json(insights))
}

#[derive(Debug, Deserialize)]
pub struct AcceptBudgetRequest {
    pub category: Option<String>,
    pub new_limit: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AcceptBudgetResponse {
    pub message: String,
    pub new_limit: f64,
}

/// POST /api/insights/accept-budget - Apply a suggested limit
pub async fn accept_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<AcceptBudgetResponse>, AppError> {
    let req: AcceptBudgetRequest = parse_body(&body)?;
    let (Some(category), Some(new_limit)) = (
        req.category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        req.new_limit,
    ) else {
        return Err(AppError::bad_request("Missing category or new limit"));
    };

    let budget = state.db.set_budget_limit(user.id, &category, new_limit)?;
    Ok(Json(AcceptBudgetResponse {
        message: format!("Budget updated successfully for {}!", budget.category),
        new_limit: budget.monthly_limit,
    }))
}

/// GET /api/insights/savings-history
pub async fn savings_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<MonthlySavingsHistory>>, AppError> {
    Ok(Json(state.db.savings_history(user.id)?))
}

/// GET /api/insights/budget-insights - Cached rows from the last insight run
pub async fn budget_insights(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<BudgetInsight>>, AppError> {
    Ok(Json(state.db.list_budget_insights(user.id)?))
}

/// GET /api/insights/projection - Cumulative savings series
pub async fn savings_projection(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<SavingsProjection>, AppError> {
    Ok(Json(project_savings(&state.db, user.id, today())?))
}
