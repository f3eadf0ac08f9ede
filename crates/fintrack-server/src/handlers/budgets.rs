//! Budget handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use fintrack_core::models::{Budget, BudgetHistory};

use crate::{parse_body, AppError, AppState, CurrentUser, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub category: Option<String>,
    pub monthly_limit: Option<f64>,
}

/// GET /api/budgets
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Budget>>, AppError> {
    Ok(Json(state.db.list_budgets(user.id)?))
}

/// POST /api/budgets - One budget per category
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let req: BudgetRequest = parse_body(&body)?;
    let (Some(category), Some(limit)) = (
        req.category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        req.monthly_limit,
    ) else {
        return Err(AppError::bad_request("Category and monthly limit are required"));
    };

    let budget = state.db.create_budget(user.id, &category, limit)?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// GET /api/budgets/:id
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Budget>, AppError> {
    state
        .db
        .get_budget(user.id, id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Budget {} not found", id)))
}

/// PUT /api/budgets/:id
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Budget>, AppError> {
    let req: BudgetRequest = parse_body(&body)?;
    let budget = state.db.update_budget(
        user.id,
        id,
        req.category.as_deref().filter(|c| !c.trim().is_empty()),
        req.monthly_limit,
    )?;
    Ok(Json(budget))
}

/// DELETE /api/budgets/:id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_budget(user.id, id)? {
        return Err(AppError::not_found(&format!("Budget {} not found", id)));
    }
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct BudgetHistoryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// GET /api/budgets/history - Monthly snapshots, optionally filtered
pub async fn budget_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<BudgetHistoryQuery>,
) -> Result<Json<Vec<BudgetHistory>>, AppError> {
    if params.month.is_some_and(|m| !(1..=12).contains(&m)) {
        return Err(AppError::bad_request("Month must be between 1 and 12"));
    }
    Ok(Json(
        state
            .db
            .list_budget_history(user.id, params.month, params.year)?,
    ))
}
