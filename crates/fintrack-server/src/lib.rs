//! Fintrack Web Server
//!
//! Axum-based REST API for the fintrack personal finance application.
//!
//! Security features:
//! - Bearer JWT authentication with refresh-token revocation
//! - Admin-only routes behind a role check
//! - Restrictive CORS policy and security headers
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use fintrack_core::ai::{AIBackend, AIClient};
use fintrack_core::categorize::CategorizerChain;
use fintrack_core::config::AppConfig;
use fintrack_core::db::Database;

pub mod auth;
mod handlers;
mod scheduler;

pub use auth::{AuthManager, CurrentUser};
pub use scheduler::{start_reminder_scheduler, start_snapshot_scheduler};

/// Default page size for paginated listings
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for paginated listings
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum accepted JSON body (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub ai: Option<AIClient>,
    pub categorizer: CategorizerChain,
    pub auth: AuthManager,
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `{count, page, page_size, results}` envelope for paginated listings
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub results: Vec<T>,
}

/// Clamp page parameters, returning (page, page_size, offset)
pub fn page_bounds(page: Option<i64>, page_size: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size, (page - 1) * page_size)
}

/// Deserialize a JSON request body, mapping malformed input to 400
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if body.len() > MAX_BODY_SIZE {
        return Err(AppError::bad_request("Request body too large"));
    }
    let bytes: &[u8] = if body.is_empty() { b"{}" } else { body };
    serde_json::from_slice(bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}

/// Create the application router around the given AI backend
pub fn create_router_with_ai(db: Database, config: AppConfig, ai: Option<AIClient>) -> Router {
    let auth = AuthManager::from_config(&config.auth);
    let categorizer = CategorizerChain::standard(ai.clone());
    let static_dir = config.server.static_dir.clone();
    let allowed_origins = config.server.allowed_origins.clone();

    let state = Arc::new(AppState {
        db,
        config,
        ai,
        categorizer,
        auth,
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/token/refresh", post(handlers::refresh_token));

    let user_routes = Router::new()
        // Users
        .route("/users/me", get(handlers::get_me))
        .route(
            "/users/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route(
            "/users/financial-data",
            get(handlers::get_financial_data).put(handlers::update_financial_data),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/recent", get(handlers::recent_transactions))
        .route("/transactions/deleted", get(handlers::deleted_transactions))
        .route("/transactions/upcoming-bills", get(handlers::upcoming_bills))
        .route("/transactions/export", get(handlers::export_my_transactions))
        .route("/transactions/voice-entry", post(handlers::voice_entry))
        .route(
            "/transactions/voice-entry/confirm",
            post(handlers::confirm_voice_entry),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            axum::routing::put(handlers::rename_category).delete(handlers::delete_category),
        )
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route("/budgets/history", get(handlers::budget_history))
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        // Savings goals
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route("/goals/recompute", post(handlers::recompute_goals))
        .route(
            "/goals/:id",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        // Recurring payments
        .route(
            "/recurring",
            get(handlers::list_recurring).post(handlers::create_recurring),
        )
        .route(
            "/recurring/:id",
            get(handlers::get_recurring)
                .put(handlers::update_recurring)
                .delete(handlers::delete_recurring),
        )
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/mark-read", post(handlers::mark_notifications_read))
        // Insights
        .route("/insights", get(handlers::get_insights))
        .route("/insights/accept-budget", post(handlers::accept_budget))
        .route("/insights/savings-history", get(handlers::savings_history))
        .route("/insights/budget-insights", get(handlers::budget_insights))
        .route("/insights/projection", get(handlers::savings_projection))
        // Analytics
        .route(
            "/analytics/financial-summary",
            get(handlers::financial_summary),
        )
        .route("/analytics/spending", get(handlers::spending_analysis))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_jwt,
        ));

    let admin_routes = Router::new()
        .route("/admin/stats/users", get(handlers::admin_user_stats))
        .route("/admin/stats/revenue", get(handlers::admin_revenue_stats))
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .route("/admin/users", get(handlers::admin_list_users))
        .route("/admin/users/bulk-delete", post(handlers::admin_bulk_delete_users))
        .route("/admin/users/:id", patch(handlers::admin_update_user))
        .route(
            "/admin/payments",
            get(handlers::admin_list_payments).post(handlers::admin_create_payment),
        )
        .route("/admin/export/users", get(handlers::admin_export_users))
        .route("/admin/export/payments", get(handlers::admin_export_payments))
        .route(
            "/admin/export/transactions",
            get(handlers::admin_export_transactions),
        )
        .route("/admin/notifications", post(handlers::admin_send_notification))
        .route("/admin/activity-logs", get(handlers::admin_activity_logs))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_jwt,
        ));

    let api_routes = public_routes.merge(user_routes).merge(admin_routes);

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the background jobs and serve until shutdown
pub async fn serve_with_config(db: Database, config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let ai = AIClient::from_env();
    check_ai_connection(ai.as_ref()).await;

    start_reminder_scheduler(db.clone(), &config.scheduler);
    start_snapshot_scheduler(db.clone(), &config.scheduler);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_router_with_ai(db, config, ai);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log the status of the AI backend the router will use
async fn check_ai_connection(ai: Option<&AIClient>) -> bool {
    match ai {
        Some(client) => {
            let healthy = client.health_check().await;
            if healthy {
                info!("AI backend connected: {} (model: {})", client.host(), client.model());
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
            healthy
        }
        None => {
            info!("AI backend not configured (set AI_BACKEND or OLLAMA_HOST to enable AI features)");
            false
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = ?err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        use fintrack_core::Error as CoreError;

        let err = err.into();
        match err.downcast_ref::<CoreError>() {
            Some(CoreError::NotFound(msg)) => Self::not_found(msg),
            Some(CoreError::Conflict(msg)) => Self::conflict(msg),
            Some(CoreError::InvalidData(msg)) => Self::bad_request(msg),
            Some(CoreError::Auth(msg)) => Self::unauthorized(msg),
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                internal: Some(err),
            },
        }
    }
}

#[cfg(test)]
mod tests;
