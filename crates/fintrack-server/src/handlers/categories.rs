//! Category handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use fintrack_core::models::Category;

use crate::{parse_body, AppError, AppState, CurrentUser, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

impl CategoryRequest {
    fn name(self) -> Result<String, AppError> {
        self.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::bad_request("Category name is required"))
    }
}

/// GET /api/categories - The caller's categories, seeded with defaults on first use
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.db.list_categories(user.id)?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = parse_body::<CategoryRequest>(&body)?.name()?;
    let category = state.db.create_category(user.id, &name)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/:id
pub async fn rename_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Category>, AppError> {
    let name = parse_body::<CategoryRequest>(&body)?.name()?;
    Ok(Json(state.db.rename_category(user.id, id, &name)?))
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_category(user.id, id)? {
        return Err(AppError::not_found(&format!("Category {} not found", id)));
    }
    Ok(Json(SuccessResponse { success: true }))
}
