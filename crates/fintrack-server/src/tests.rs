//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use fintrack_core::auth::hash_password;
use fintrack_core::models::{NewUser, Role};
use http_body_util::BodyExt;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("test-secret".to_string());
    config
}

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    let app = create_router_with_ai(db.clone(), test_config(), Some(AIClient::mock()));
    (app, db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Sign up a user and return (access, refresh)
async fn signup(app: &Router, email: &str) -> (String, String) {
    let response = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "full_name": "Test User",
            "email": email,
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    (
        json["access"].as_str().unwrap().to_string(),
        json["refresh"].as_str().unwrap().to_string(),
    )
}

/// Create an admin directly in the database and log in through the API
async fn admin_token(app: &Router, db: &Database) -> String {
    db.create_user(&NewUser {
        email: "admin@example.com".into(),
        username: "admin".into(),
        password_hash: hash_password("adminpass1").unwrap(),
        full_name: Some("Admin".into()),
        phone_no: None,
        role: Role::Admin,
    })
    .unwrap();

    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "adminpass1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["role"], "admin");
    json["access"].as_str().unwrap().to_string()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ai_backend"], true);
}

#[tokio::test]
async fn test_ai_connection_check_uses_given_client() {
    use fintrack_core::MockBackend;

    assert!(check_ai_connection(Some(&AIClient::mock())).await);
    assert!(!check_ai_connection(Some(&AIClient::Mock(MockBackend::unhealthy()))).await);
    assert!(!check_ai_connection(None).await);
}

#[tokio::test]
async fn test_serve_rejects_invalid_config() {
    let mut config = test_config();
    config.scheduler.reminder_lookahead_days = i64::MAX;
    let result = serve_with_config(Database::in_memory().unwrap(), config).await;
    assert!(result.is_err());
}

// ========== Auth ==========

#[tokio::test]
async fn test_signup_and_login() {
    let (app, _db) = setup_test_app();

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "full_name": "Asha Rao",
            "email": "Asha.Rao@example.com",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["username"], "asha.rao");
    assert!(json["access"].is_string());

    // Login by email
    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "asha.rao@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["role"], "user");

    // Wrong password
    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "asha.rao", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Invalid Credentials");
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _db) = setup_test_app();
    signup(&app, "dup@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "full_name": "Dup", "email": "dup@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "A user with this email already exists");

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "email": "x@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "full_name": "Short", "email": "short@example.com", "password": "abc" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_username_gets_counter_suffix() {
    let (app, _db) = setup_test_app();
    signup(&app, "sam@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "full_name": "Sam", "email": "sam@other.org", "password": "password123" })),
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["username"], "sam1");
}

#[tokio::test]
async fn test_auth_required() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/api/transactions", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", "/api/transactions", Some("garbage"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_then_logout_revokes() {
    let (app, _db) = setup_test_app();
    let (access, refresh) = signup(&app, "r@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["access"].is_string());

    // An access token is not a refresh token
    let response = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": access })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Token has been revoked");
}

#[tokio::test]
async fn test_me_includes_profile() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "me@example.com").await;

    let response = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["email"], "me@example.com");
    assert_eq!(json["profile"]["preferred_currency"], "INR");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "j@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transactions")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Invalid JSON");
}

// ========== Transactions ==========

#[tokio::test]
async fn test_create_transaction_auto_categorizes() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "t@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "amount": 180.0,
            "category_type": "expense",
            "description": "Uber to the office",
            "date": "2024-03-05"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["category_name"], "Transport");
    assert!(json["category_id"].is_i64());
}

#[tokio::test]
async fn test_transaction_validation_and_ownership() {
    let (app, _db) = setup_test_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (bob, _) = signup(&app, "bob@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&alice),
        Some(json!({ "amount": 0, "date": "2024-03-05" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&alice),
        Some(json!({ "amount": 40, "date": "2024-03-05", "description": "snacks" })),
    )
    .await;
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    // Bob cannot see or delete Alice's transaction
    let uri = format!("/api/transactions/{}", id);
    let response = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice deletes it and it lands in the archive
    let response = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "GET", "/api/transactions/deleted", Some(&alice), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["amount"], 40.0);
}

#[tokio::test]
async fn test_list_transactions_paginates() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "p@example.com").await;

    for day in 1..=12 {
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "amount": day as f64 * 10.0,
                "date": format!("2024-04-{:02}", day),
                "description": "groceries"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, "GET", "/api/transactions", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 12);
    assert_eq!(json["page_size"], 10);
    assert_eq!(json["results"].as_array().unwrap().len(), 10);
    // Newest first by default
    assert_eq!(json["results"][0]["date"], "2024-04-12");

    let response = send(
        &app,
        "GET",
        "/api/transactions?page=2&ordering=amount&min_amount=50",
        Some(&token),
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 8);
    assert_eq!(json["page"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);

    let response = send(
        &app,
        "GET",
        "/api/transactions?ordering=name",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recent_transactions_default_category() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "rc@example.com").await;

    send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({ "amount": 15, "date": "2024-05-01" })),
    )
    .await;

    let response = send(&app, "GET", "/api/transactions/recent", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json[0]["category_name"], "Other");
}

#[tokio::test]
async fn test_voice_entry_and_confirm() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "v@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/transactions/voice-entry",
        Some(&token),
        Some(json!({ "voice_text": "I got my salary of 50000 today" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let draft = get_body_json(response).await;
    assert_eq!(draft["amount"], 50000.0);
    assert_eq!(draft["transaction_type"], "income");
    assert_eq!(draft["category"], "Salary");

    let response = send(
        &app,
        "POST",
        "/api/transactions/voice-entry",
        Some(&token),
        Some(json!({ "voice_text": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No voice input received");

    let response = send(
        &app,
        "POST",
        "/api/transactions/voice-entry/confirm",
        Some(&token),
        Some(draft),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Transaction saved successfully!");
    assert!(json["transaction_id"].is_i64());

    let response = send(
        &app,
        "POST",
        "/api/transactions/voice-entry/confirm",
        Some(&token),
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing transaction details");
}

#[tokio::test]
async fn test_export_my_transactions_csv() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "csv@example.com").await;
    send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({ "amount": 99.5, "date": "2024-06-01", "description": "pizza night" })),
    )
    .await;

    let response = send(&app, "GET", "/api/transactions/export", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("transactions.csv"));

    let text = get_body_text(response).await;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ID,Date,Category,Amount,Description"));
    assert!(lines.next().unwrap().ends_with("Food,99.50,pizza night"));
}

// ========== Categories & budgets ==========

#[tokio::test]
async fn test_categories_seeded_and_unique() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "c@example.com").await;

    let response = send(&app, "GET", "/api/categories", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 7);

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Food" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Pets" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_accept_budget() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "b@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/insights/accept-budget",
        Some(&token),
        Some(json!({ "category": "Food" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing category or new limit");

    let response = send(
        &app,
        "POST",
        "/api/insights/accept-budget",
        Some(&token),
        Some(json!({ "category": "Food", "new_limit": 4250.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Budget updated successfully for Food!");
    assert_eq!(json["new_limit"], 4250.0);

    // Accepting again updates the same budget
    send(
        &app,
        "POST",
        "/api/insights/accept-budget",
        Some(&token),
        Some(json!({ "category": "Food", "new_limit": 3000.0 })),
    )
    .await;
    let response = send(&app, "GET", "/api/budgets", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["monthly_limit"], 3000.0);
}

#[tokio::test]
async fn test_budget_history_rejects_bad_month() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "h@example.com").await;

    let response = send(&app, "GET", "/api/budgets/history?month=13", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/budgets/history", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Insights & analytics ==========

#[tokio::test]
async fn test_insights_without_data_returns_general_card() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "i@example.com").await;

    let response = send(&app, "GET", "/api/insights", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let cards = json.as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["type"], "General");
    assert_eq!(cards[0]["title"], "Insufficient Data");
    assert_eq!(cards[0]["category"], "All");
}

#[tokio::test]
async fn test_projection_has_thirteen_entries_without_history() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "pr@example.com").await;

    let response = send(&app, "GET", "/api/insights/projection", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["months"].as_array().unwrap().len(), 13);
    assert_eq!(json["amounts"][0], 0.0);
}

#[tokio::test]
async fn test_spending_analysis_period() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "s@example.com").await;

    let response = send(
        &app,
        "GET",
        "/api/analytics/spending?period=week",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["bar_months"].as_array().unwrap().len(), 6);

    let response = send(
        &app,
        "GET",
        "/api/analytics/spending?period=decade",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Notifications ==========

#[tokio::test]
async fn test_mark_notifications_read() {
    let (app, db) = setup_test_app();
    let (token, _) = signup(&app, "n@example.com").await;
    let user = db.get_user_by_email("n@example.com").unwrap().unwrap();
    db.create_notification(user.id, Some("Hi"), "First").unwrap();
    db.create_notification(user.id, None, "Second").unwrap();

    let response = send(&app, "GET", "/api/notifications", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = send(
        &app,
        "POST",
        "/api/notifications/mark-read",
        Some(&token),
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["updated"], 2);

    let response = send(&app, "GET", "/api/notifications", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}

// ========== Admin ==========

#[tokio::test]
async fn test_admin_routes_forbidden_for_users() {
    let (app, _db) = setup_test_app();
    let (token, _) = signup(&app, "u@example.com").await;

    let response = send(&app, "GET", "/api/admin/stats/users", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = get_body_json(response).await;
    assert_eq!(
        json["error"],
        "You do not have permission to perform this action"
    );

    let response = send(&app, "GET", "/api/admin/stats/users", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (app, db) = setup_test_app();
    let admin = admin_token(&app, &db).await;
    signup(&app, "one@example.com").await;
    signup(&app, "two@example.com").await;

    let response = send(&app, "GET", "/api/admin/stats/users", Some(&admin), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["total_users"], 3);

    let response = send(
        &app,
        "GET",
        "/api/admin/users?query=one&sort=email",
        Some(&admin),
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 1);
    let one_id = json["results"][0]["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PATCH",
        &format!("/api/admin/users/{}", one_id),
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["is_active"], false);

    // A banned user can no longer log in
    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "one@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/admin/users/bulk-delete",
        Some(&admin),
        Some(json!({ "user_ids": [] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/admin/users/bulk-delete",
        Some(&admin),
        Some(json!({ "user_ids": [one_id] })),
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["deleted"], 1);

    let response = send(&app, "GET", "/api/admin/activity-logs", Some(&admin), None).await;
    let json = get_body_json(response).await;
    let actions: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"update_user"));
    assert!(actions.contains(&"bulk_delete_users"));
    assert!(json.as_array().unwrap().iter().all(|e| e["actor"] == "admin"));
}

#[tokio::test]
async fn test_admin_bulk_delete_skips_self() {
    let (app, db) = setup_test_app();
    let admin = admin_token(&app, &db).await;
    signup(&app, "victim@example.com").await;

    let admin_id = db.get_user_by_email("admin@example.com").unwrap().unwrap().id;
    let victim_id = db.get_user_by_email("victim@example.com").unwrap().unwrap().id;

    let response = send(
        &app,
        "POST",
        "/api/admin/users/bulk-delete",
        Some(&admin),
        Some(json!({ "user_ids": [admin_id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/admin/users/bulk-delete",
        Some(&admin),
        Some(json!({ "user_ids": [admin_id, victim_id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["deleted"], 1);

    assert!(db.get_user(admin_id).unwrap().is_some());
    assert!(db.get_user(victim_id).unwrap().is_none());

    let response = send(&app, "GET", "/api/admin/stats/users", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_notifications() {
    let (app, db) = setup_test_app();
    let admin = admin_token(&app, &db).await;
    let (token, _) = signup(&app, "notify@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/admin/notifications",
        Some(&admin),
        Some(json!({ "recipient": "all", "title": "Maintenance" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "All fields are required");

    let response = send(
        &app,
        "POST",
        "/api/admin/notifications",
        Some(&admin),
        Some(json!({ "recipient": 9999, "title": "Hi", "message": "Hello" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "User does not exist");

    let response = send(
        &app,
        "POST",
        "/api/admin/notifications",
        Some(&admin),
        Some(json!({ "recipient": "all", "title": "Maintenance", "message": "Down at 2am" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["sent"], 2);

    let response = send(&app, "GET", "/api/notifications", Some(&token), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json[0]["message"], "Down at 2am");
}

#[tokio::test]
async fn test_admin_payments_and_exports() {
    let (app, db) = setup_test_app();
    let admin = admin_token(&app, &db).await;
    signup(&app, "payer@example.com").await;
    let payer = db.get_user_by_email("payer@example.com").unwrap().unwrap();

    let response = send(
        &app,
        "POST",
        "/api/admin/payments",
        Some(&admin),
        Some(json!({ "user_id": payer.id, "amount": 499.0, "status": "completed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["payment_id"].as_str().unwrap().len(), 36);

    let response = send(
        &app,
        "POST",
        "/api/admin/payments",
        Some(&admin),
        Some(json!({ "user_id": 9999, "amount": 10.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/admin/payments", Some(&admin), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["metrics"]["completed"], 1);
    assert_eq!(json["metrics"]["total_revenue"], 499.0);

    let response = send(
        &app,
        "GET",
        "/api/admin/payments?status=refunded",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/admin/export/payments", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = get_body_text(response).await;
    assert!(text.starts_with("Payment ID,User,Amount,Status,Date"));
    assert!(text.contains("payer"));

    let response = send(
        &app,
        "GET",
        "/api/admin/export/users?status=active",
        Some(&admin),
        None,
    )
    .await;
    let text = get_body_text(response).await;
    assert_eq!(text.lines().count(), 3);
}

// ========== Static files ==========

#[tokio::test]
async fn test_static_dir_fallback() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>fintrack</h1>").unwrap();

    let mut config = test_config();
    config.server.static_dir = Some(dir.path().to_path_buf());
    let app = create_router_with_ai(Database::in_memory().unwrap(), config, None);

    let response = send(&app, "GET", "/index.html", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_text(response).await, "<h1>fintrack</h1>");

    // API routes still win over the fallback
    let response = send(&app, "GET", "/api/health", None, None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["ai_backend"], false);
}
