//! Admin handlers: reporting, user management, payments, exports and broadcasts
//!
//! Every route here sits behind `require_admin`. Mutations are written to the
//! audit log with the acting admin's username.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{Response, StatusCode},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use fintrack_core::db::{
    AdminDashboard, AdminDashboardFilter, AuditEntry, PaymentMetrics, RevenueStats, UserStats,
};
use fintrack_core::models::{Payment, PaymentStatus, User, UserQuery, UserUpdate};

use super::{csv_response, today};
use crate::{page_bounds, parse_body, AppError, AppState, CurrentUser, Page};

/// Rows returned by the activity log endpoint
const ACTIVITY_LOG_LIMIT: i64 = 50;

// ========== Reporting ==========

/// GET /api/admin/stats/users
pub async fn admin_user_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.db.user_stats()?))
}

/// GET /api/admin/stats/revenue
pub async fn admin_revenue_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RevenueStats>, AppError> {
    Ok(Json(state.db.revenue_stats(today())?))
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<String>,
    pub payment_status: Option<String>,
}

/// GET /api/admin/dashboard
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<AdminDashboard>, AppError> {
    let filter = AdminDashboardFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        transaction_type: params.transaction_type.filter(|t| !t.is_empty()),
        payment_status: params.payment_status.filter(|s| !s.is_empty()),
    };
    Ok(Json(state.db.admin_dashboard(&filter)?))
}

// ========== Users ==========

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub query: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl UserListQuery {
    fn to_query(&self, limit: i64, offset: i64) -> Result<UserQuery, AppError> {
        if let Some(status) = self.status.as_deref() {
            if !matches!(status, "" | "active" | "banned") {
                return Err(AppError::bad_request("Status must be active or banned"));
            }
        }
        if let Some(sort) = self.sort.as_deref() {
            if !matches!(sort, "" | "username" | "email" | "last_login" | "date_joined") {
                return Err(AppError::bad_request(
                    "Sort must be one of username, email, last_login, date_joined",
                ));
            }
        }
        Ok(UserQuery {
            query: self.query.clone().filter(|q| !q.trim().is_empty()),
            status: self.status.clone().filter(|s| !s.is_empty()),
            sort: self.sort.clone().filter(|s| !s.is_empty()),
            order: self.order.clone(),
            limit,
            offset,
        })
    }
}

/// GET /api/admin/users
pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<Page<User>>, AppError> {
    let (page, page_size, offset) = page_bounds(params.page, params.page_size);
    let query = params.to_query(page_size, offset)?;
    let (results, count) = state.db.list_users(&query)?;
    Ok(Json(Page {
        count,
        page,
        page_size,
        results,
    }))
}

/// PATCH /api/admin/users/:id
pub async fn admin_update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let update: UserUpdate = parse_body(&body)?;
    let user = state.db.update_user(id, &update)?;

    let details = serde_json::json!({
        "username": update.username,
        "email": update.email,
        "role": update.role,
        "is_active": update.is_active,
    })
    .to_string();
    state
        .db
        .log_audit(&admin.username, "update_user", Some("user"), Some(id), Some(&details))?;

    info!(admin = %admin.username, user_id = id, "Updated user");
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub user_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

/// POST /api/admin/users/bulk-delete
pub async fn admin_bulk_delete_users(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let req: BulkDeleteRequest = parse_body(&body)?;
    let requested = req
        .user_ids
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| AppError::bad_request("No users selected"))?;

    // The acting admin is never deleted
    let ids: Vec<i64> = requested.iter().copied().filter(|id| *id != admin.id).collect();
    if ids.is_empty() {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    let deleted = state.db.delete_users(&ids)?;
    let details = format!("Deleted {} of {} requested users", deleted, requested.len());
    state
        .db
        .log_audit(&admin.username, "bulk_delete_users", Some("user"), None, Some(&details))?;

    info!(admin = %admin.username, deleted, "Bulk deleted users");
    Ok(Json(BulkDeleteResponse { deleted }))
}

// ========== Payments ==========

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    #[serde(flatten)]
    pub page: Page<Payment>,
    pub metrics: PaymentMetrics,
}

/// GET /api/admin/payments - Paginated payments with revenue metrics
pub async fn admin_list_payments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentListQuery>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<PaymentStatus>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let (page, page_size, offset) = page_bounds(params.page, params.page_size);
    let (results, count) =
        state
            .db
            .list_payments(params.search.as_deref(), status, page_size, offset)?;

    Ok(Json(PaymentListResponse {
        page: Page {
            count,
            page,
            page_size,
            results,
        },
        metrics: state.db.payment_metrics()?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: Option<i64>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// POST /api/admin/payments - Record a payment
pub async fn admin_create_payment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let req: CreatePaymentRequest = parse_body(&body)?;
    let (Some(user_id), Some(amount)) = (req.user_id, req.amount) else {
        return Err(AppError::bad_request("User and amount are required"));
    };

    let payment_id = state.db.create_payment(user_id, amount, req.status)?;
    let details = format!("{:.2} ({})", amount, req.status);
    state.db.log_audit(
        &admin.username,
        "create_payment",
        Some("payment"),
        Some(user_id),
        Some(&details),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "payment_id": payment_id })),
    ))
}

// ========== Exports ==========

/// GET /api/admin/export/users - Honours the user listing filters
pub async fn admin_export_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListQuery>,
) -> Result<Response<Body>, AppError> {
    let query = params.to_query(-1, 0)?;
    csv_response(state.db.export_users_csv(&query)?, "users.csv")
}

/// GET /api/admin/export/payments
pub async fn admin_export_payments(
    State(state): State<Arc<AppState>>,
) -> Result<Response<Body>, AppError> {
    csv_response(state.db.export_payments_csv()?, "payments.csv")
}

/// GET /api/admin/export/transactions - Every user's transactions
pub async fn admin_export_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Response<Body>, AppError> {
    csv_response(state.db.export_transactions_csv(None)?, "transactions.csv")
}

// ========== Notifications & activity ==========

#[derive(Debug, Deserialize)]
pub struct AdminNotificationRequest {
    /// "all" or a user id
    pub recipient: Option<Value>,
    pub title: Option<String>,
    pub message: Option<String>,
}

enum Recipient {
    All,
    User(i64),
}

fn parse_recipient(value: Option<&Value>) -> Option<Recipient> {
    match value? {
        Value::String(s) if s.eq_ignore_ascii_case("all") => Some(Recipient::All),
        Value::String(s) => s.trim().parse().ok().map(Recipient::User),
        Value::Number(n) => n.as_i64().map(Recipient::User),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct AdminNotificationResponse {
    pub message: String,
    pub sent: usize,
}

/// POST /api/admin/notifications - Notify one user or everyone
pub async fn admin_send_notification(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<AdminNotificationResponse>), AppError> {
    let req: AdminNotificationRequest = parse_body(&body)?;
    let (Some(recipient), Some(title), Some(message)) = (
        parse_recipient(req.recipient.as_ref()),
        req.title.filter(|t| !t.trim().is_empty()),
        req.message.filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(AppError::bad_request("All fields are required"));
    };

    let (sent, target) = match recipient {
        Recipient::All => (
            state.db.broadcast_notification(Some(&title), &message)?,
            "all".to_string(),
        ),
        Recipient::User(id) => {
            if state.db.get_user(id)?.is_none() {
                return Err(AppError::bad_request("User does not exist"));
            }
            state.db.create_notification(id, Some(&title), &message)?;
            (1, id.to_string())
        }
    };

    let details = format!("{} -> {}", title, target);
    state.db.log_audit(
        &admin.username,
        "send_notification",
        Some("notification"),
        None,
        Some(&details),
    )?;

    info!(admin = %admin.username, sent, "Sent notification");
    Ok((
        StatusCode::CREATED,
        Json(AdminNotificationResponse {
            message: "Notification sent successfully".to_string(),
            sent,
        }),
    ))
}

/// GET /api/admin/activity-logs - Most recent audit entries
pub async fn admin_activity_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    Ok(Json(state.db.list_audit_log(ACTIVITY_LOG_LIMIT)?))
}
