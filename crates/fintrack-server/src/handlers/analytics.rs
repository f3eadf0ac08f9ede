//! Dashboard analytics

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use fintrack_core::analytics::{
    financial_summary as summarize, spending_analysis as analyze, FinancialSummary, Period,
    SpendingAnalysis,
};

use super::today;
use crate::{AppError, AppState, CurrentUser};

/// GET /api/analytics/financial-summary
pub async fn financial_summary(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<FinancialSummary>, AppError> {
    Ok(Json(summarize(&state.db, user.id, today())?))
}

#[derive(Debug, Deserialize)]
pub struct SpendingQuery {
    pub period: Option<String>,
}

/// GET /api/analytics/spending?period=week|month|year
pub async fn spending_analysis(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SpendingQuery>,
) -> Result<Json<SpendingAnalysis>, AppError> {
    let period = match params.period.as_deref() {
        None => Period::default(),
        Some(p) => p.parse::<Period>().map_err(|e| AppError::bad_request(&e))?,
    };
    Ok(Json(analyze(&state.db, user.id, period, today())?))
}
