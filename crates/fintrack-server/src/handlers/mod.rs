//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod health;
pub mod insights;
pub mod notifications;
pub mod recurring;
pub mod transactions;
pub mod users;

// Re-export all handlers for use in router
pub use admin::*;
pub use analytics::*;
pub use auth::*;
pub use budgets::*;
pub use categories::*;
pub use goals::*;
pub use health::*;
pub use insights::*;
pub use notifications::*;
pub use recurring::*;
pub use transactions::*;
pub use users::*;

use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use chrono::{Local, NaiveDate};

use crate::AppError;

/// Local calendar date used for "today" in reports and jobs
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// CSV attachment response
pub(crate) fn csv_response(csv: String, filename: &str) -> Result<Response<Body>, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}
