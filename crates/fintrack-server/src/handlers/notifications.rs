//! Notification handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use fintrack_core::models::Notification;

use crate::{parse_body, AppError, AppState, CurrentUser};

/// GET /api/notifications - Unread notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.db.list_notifications(user.id, true)?))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    /// Notification ids; all unread notifications when absent
    pub ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

/// POST /api/notifications/mark-read
pub async fn mark_notifications_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<MarkReadResponse>, AppError> {
    let req: MarkReadRequest = parse_body(&body)?;
    let updated = state
        .db
        .mark_notifications_read(user.id, req.ids.as_deref())?;
    Ok(Json(MarkReadResponse { updated }))
}
