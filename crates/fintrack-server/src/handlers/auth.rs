//! Signup, login, logout and token refresh

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use fintrack_core::auth::{derive_username, hash_password, validate_password, verify_password};
use fintrack_core::models::{NewUser, Role};

use crate::auth::{token_digest, TokenKind};
use crate::{parse_body, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: i64,
    pub username: String,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/auth/signup - Register and receive a token pair
pub async fn signup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let req: SignupRequest = parse_body(&body)?;

    let (Some(full_name), Some(email), Some(password)) = (
        required(req.full_name),
        required(req.email).map(|e| e.to_lowercase()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request(
            "Full name, email and password are required",
        ));
    };

    if !email.contains('@') {
        return Err(AppError::bad_request("Enter a valid email address"));
    }
    validate_password(&password)?;

    if state.db.get_user_by_email(&email)?.is_some() {
        return Err(AppError::bad_request("A user with this email already exists"));
    }

    let username = derive_username(&state.db, &email)?;
    let user_id = state.db.create_user(&NewUser {
        email,
        username: username.clone(),
        password_hash: hash_password(&password)?,
        full_name: Some(full_name),
        phone_no: required(req.phone_no),
        role: Role::User,
    })?;

    let user = state
        .db
        .get_user(user_id)?
        .ok_or_else(|| AppError::internal("User not found after creation"))?;
    let tokens = state.auth.issue_pair(&user)?;

    info!(user_id, username = %username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user_id,
            username,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// POST /api/auth/login - Authenticate by username or email
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    let req: LoginRequest = parse_body(&body)?;

    let identifier = required(req.username).or_else(|| required(req.email));
    let (Some(identifier), Some(password)) = (identifier, req.password) else {
        return Err(AppError::bad_request(
            "Username or email and password are required",
        ));
    };

    let Some((user, password_hash)) = state.db.get_login(&identifier)? else {
        return Err(AppError::unauthorized("Invalid Credentials"));
    };
    if !user.is_active || !verify_password(&password, &password_hash)? {
        return Err(AppError::unauthorized("Invalid Credentials"));
    }

    state.db.update_last_login(user.id)?;
    let tokens = state.auth.issue_pair(&user)?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// POST /api/auth/logout - Revoke a refresh token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: RefreshRequest = parse_body(&body)?;
    let token = required(req.refresh).ok_or_else(|| AppError::bad_request("Refresh token is required"))?;

    let claims = state
        .auth
        .validate(&token, TokenKind::Refresh)
        .map_err(|_| AppError::bad_request("Invalid or expired token"))?;
    state
        .db
        .revoke_token(&token_digest(&claims.jti), claims.expires_at())?;

    info!(user = %claims.username, "User logged out");

    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

/// POST /api/auth/token/refresh - Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: RefreshRequest = parse_body(&body)?;
    let token = required(req.refresh).ok_or_else(|| AppError::bad_request("Refresh token is required"))?;

    let claims = state.auth.validate(&token, TokenKind::Refresh)?;
    if state.db.is_token_revoked(&token_digest(&claims.jti))? {
        return Err(AppError::unauthorized("Token has been revoked"));
    }

    let user = state
        .db
        .get_user(claims.user_id()?)?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    let access = state.auth.issue(&user, TokenKind::Access)?;
    Ok(Json(serde_json::json!({ "access": access })))
}
