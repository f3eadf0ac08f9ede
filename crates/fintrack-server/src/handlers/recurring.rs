//! Recurring payment handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use fintrack_core::models::{NewRecurringPayment, RecurringPayment, RecurringPaymentUpdate};

use crate::{parse_body, AppError, AppState, CurrentUser, SuccessResponse};

/// GET /api/recurring
pub async fn list_recurring(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<RecurringPayment>>, AppError> {
    Ok(Json(state.db.list_recurring_payments(user.id)?))
}

/// POST /api/recurring
pub async fn create_recurring(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<RecurringPayment>), AppError> {
    let payment: NewRecurringPayment = parse_body(&body)?;
    let created = state.db.create_recurring_payment(user.id, &payment)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/recurring/:id
pub async fn get_recurring(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<RecurringPayment>, AppError> {
    state
        .db
        .get_recurring_payment(user.id, id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Recurring payment {} not found", id)))
}

/// PUT /api/recurring/:id
pub async fn update_recurring(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<RecurringPayment>, AppError> {
    let update: RecurringPaymentUpdate = parse_body(&body)?;
    Ok(Json(state.db.update_recurring_payment(user.id, id, &update)?))
}

/// DELETE /api/recurring/:id
pub async fn delete_recurring(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_recurring_payment(user.id, id)? {
        return Err(AppError::not_found(&format!("Recurring payment {} not found", id)));
    }
    Ok(Json(SuccessResponse { success: true }))
}
