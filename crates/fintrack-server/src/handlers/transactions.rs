//! Transaction handlers, including voice entry and CSV export

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{Response, StatusCode},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use fintrack_core::categorize::create_with_category;
use fintrack_core::models::{
    CategoryType, DeletedTransaction, NewTransaction, Transaction, TransactionQuery,
    TransactionUpdate, UpcomingBill,
};
use fintrack_core::voice::{parse_voice_entry, VoiceEntry};

use super::{csv_response, today};
use crate::{page_bounds, parse_body, AppError, AppState, CurrentUser, Page, SuccessResponse};

/// Number of rows in the recent transactions widget
const RECENT_LIMIT: i64 = 10;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    /// Category id
    pub category: Option<i64>,
    pub min_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub ordering: Option<String>,
}

/// GET /api/transactions - Paginated, filtered listing
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<TransactionListQuery>,
) -> Result<Json<Page<Transaction>>, AppError> {
    if let Some(ordering) = params.ordering.as_deref() {
        if !matches!(ordering, "date" | "-date" | "amount" | "-amount") {
            return Err(AppError::bad_request(
                "Invalid ordering. Use date, -date, amount or -amount",
            ));
        }
    }

    let (page, page_size, offset) = page_bounds(params.page, params.page_size);
    let query = TransactionQuery {
        search: params.search,
        category_id: params.category,
        min_amount: params.min_amount,
        date: params.date,
        ordering: params.ordering,
        limit: page_size,
        offset,
    };

    let (results, count) = state.db.list_transactions(user.id, &query)?;
    Ok(Json(Page {
        count,
        page,
        page_size,
        results,
    }))
}

/// POST /api/transactions - Create a transaction, auto-categorizing when possible
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let tx: NewTransaction = parse_body(&body)?;
    let created = create_with_category(&state.db, &state.categorizer, user.id, tx).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state
        .db
        .get_transaction(user.id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;
    Ok(Json(tx))
}

/// PUT /api/transactions/:id
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Transaction>, AppError> {
    let update: TransactionUpdate = parse_body(&body)?;
    Ok(Json(state.db.update_transaction(user.id, id, &update)?))
}

/// DELETE /api/transactions/:id - Archive then delete
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_transaction(user.id, id)? {
        return Err(AppError::not_found(&format!("Transaction {} not found", id)));
    }
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub struct RecentTransaction {
    pub id: i64,
    pub category_name: String,
    pub category_type: CategoryType,
    pub description: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
}

/// GET /api/transactions/recent - Latest ten transactions
pub async fn recent_transactions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<RecentTransaction>>, AppError> {
    let recent = state
        .db
        .recent_transactions(user.id, RECENT_LIMIT)?
        .into_iter()
        .map(|t| RecentTransaction {
            id: t.id,
            category_name: t.category_name.unwrap_or_else(|| "Other".to_string()),
            category_type: t.category_type,
            description: t.description,
            amount: t.amount,
            date: t.date,
        })
        .collect();
    Ok(Json(recent))
}

/// GET /api/transactions/deleted - The deletion archive
pub async fn deleted_transactions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<DeletedTransaction>>, AppError> {
    Ok(Json(state.db.list_deleted_transactions(user.id)?))
}

/// GET /api/transactions/upcoming-bills
pub async fn upcoming_bills(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<UpcomingBill>>, AppError> {
    Ok(Json(state.db.upcoming_bills(user.id, today())?))
}

/// GET /api/transactions/export - CSV of the caller's transactions
pub async fn export_my_transactions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response<Body>, AppError> {
    let csv = state.db.export_transactions_csv(Some(user.id))?;
    info!(
        user_id = user.id,
        rows = csv.lines().count().saturating_sub(1),
        "Exported transactions to CSV"
    );
    csv_response(csv, "transactions.csv")
}

#[derive(Debug, Deserialize)]
pub struct VoiceEntryRequest {
    pub voice_text: Option<String>,
}

/// POST /api/transactions/voice-entry - Parse dictated text into a draft
pub async fn voice_entry(body: Bytes) -> Result<Json<VoiceEntry>, AppError> {
    let req: VoiceEntryRequest = parse_body(&body)?;
    let text = req
        .voice_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("No voice input received"))?;
    Ok(Json(parse_voice_entry(&text)?))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmVoiceRequest {
    pub amount: Option<f64>,
    pub transaction_type: Option<CategoryType>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmVoiceResponse {
    pub message: String,
    pub transaction_id: i64,
}

/// POST /api/transactions/voice-entry/confirm - Save a confirmed draft dated today
pub async fn confirm_voice_entry(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<ConfirmVoiceResponse>), AppError> {
    let req: ConfirmVoiceRequest = parse_body(&body)?;
    let (Some(amount), Some(category_type), Some(category)) = (
        req.amount.filter(|a| *a != 0.0),
        req.transaction_type,
        req.category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    ) else {
        return Err(AppError::bad_request("Missing transaction details"));
    };

    let category = state.db.get_or_create_category(user.id, &category)?;
    let tx = state.db.create_transaction(
        user.id,
        &NewTransaction {
            amount,
            category_id: Some(category.id),
            category_type,
            description: None,
            date: today(),
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ConfirmVoiceResponse {
            message: "Transaction saved successfully!".to_string(),
            transaction_id: tx.id,
        }),
    ))
}
