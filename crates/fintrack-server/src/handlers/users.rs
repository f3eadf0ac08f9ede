//! Current user, profile and financial data

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Extension, Json};
use serde::Serialize;

use fintrack_core::models::{FinancialData, FinancialDataUpdate, Profile, ProfileUpdate, User};

use crate::{parse_body, AppError, AppState, CurrentUser};

#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
}

/// GET /api/users/me - The authenticated user with their profile
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<MeResponse>, AppError> {
    let profile = state.db.get_or_create_profile(user.id)?;
    Ok(Json(MeResponse { user, profile }))
}

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.db.get_or_create_profile(user.id)?))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<Profile>, AppError> {
    let update: ProfileUpdate = parse_body(&body)?;
    Ok(Json(state.db.update_profile(user.id, &update)?))
}

/// GET /api/users/financial-data
pub async fn get_financial_data(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<FinancialData>, AppError> {
    Ok(Json(state.db.get_or_create_financial_data(user.id)?))
}

/// PUT /api/users/financial-data
pub async fn update_financial_data(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<FinancialData>, AppError> {
    let update: FinancialDataUpdate = parse_body(&body)?;
    Ok(Json(state.db.update_financial_data(user.id, &update)?))
}
