//! Savings goal handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use fintrack_core::models::{NewSavingsGoal, SavingsGoal, SavingsGoalUpdate};

use crate::{parse_body, AppError, AppState, CurrentUser, SuccessResponse};

/// GET /api/goals
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<SavingsGoal>>, AppError> {
    Ok(Json(state.db.list_goals(user.id)?))
}

/// POST /api/goals
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<SavingsGoal>), AppError> {
    let goal: NewSavingsGoal = parse_body(&body)?;
    Ok((StatusCode::CREATED, Json(state.db.create_goal(user.id, &goal)?)))
}

/// GET /api/goals/:id
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SavingsGoal>, AppError> {
    state
        .db
        .get_goal(user.id, id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Goal {} not found", id)))
}

/// PUT /api/goals/:id
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<SavingsGoal>, AppError> {
    let update: SavingsGoalUpdate = parse_body(&body)?;
    Ok(Json(state.db.update_goal(user.id, id, &update)?))
}

/// DELETE /api/goals/:id
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_goal(user.id, id)? {
        return Err(AppError::not_found(&format!("Goal {} not found", id)));
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/goals/recompute - Refresh saved amounts from Savings expenses
pub async fn recompute_goals(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<SavingsGoal>>, AppError> {
    Ok(Json(state.db.recompute_goal_progress(user.id)?))
}
