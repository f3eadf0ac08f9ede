//! Integration tests for fintrack-core
//!
//! These tests exercise whole workflows across the data layer and the
//! analysis modules: projection, reminders, snapshots, summaries and exports.

use chrono::NaiveDate;
use fintrack_core::{
    analytics::{financial_summary, spending_analysis, Period},
    budget_history::{snapshot_all, snapshot_user},
    categorize::{create_with_category, CategorizerChain},
    db::Database,
    insights::{AnalysisContext, InsightEngine, InsightKind},
    models::{
        CategoryType, Frequency, NewRecurringPayment, NewSavingsGoal, NewTransaction, NewUser,
        RecurringStatus, Role, SAVINGS_CATEGORY,
    },
    projection::project_savings,
    reminders::run_reminder_pass,
    AIClient,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn make_user(db: &Database, name: &str) -> i64 {
    db.create_user(&NewUser {
        email: format!("{}@example.com", name),
        username: name.to_string(),
        password_hash: "hash".to_string(),
        full_name: None,
        phone_no: None,
        role: Role::User,
    })
    .expect("Failed to create user")
}

fn add(
    db: &Database,
    user_id: i64,
    category: Option<&str>,
    kind: CategoryType,
    amount: f64,
    on: NaiveDate,
    description: Option<&str>,
) {
    let category_id = category.map(|c| db.get_or_create_category(user_id, c).unwrap().id);
    db.create_transaction(
        user_id,
        &NewTransaction {
            amount,
            category_id,
            category_type: kind,
            description: description.map(str::to_string),
            date: on,
        },
    )
    .expect("Failed to create transaction");
}

fn recurring(name: &str, amount: f64, next: NaiveDate, frequency: Frequency) -> NewRecurringPayment {
    NewRecurringPayment {
        name: name.to_string(),
        amount,
        category: Some("Bills".to_string()),
        frequency,
        next_payment_date: next,
        status: RecurringStatus::Active,
    }
}

// =============================================================================
// Projection
// =============================================================================

#[test]
fn test_projection_worked_example() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "projector");

    db.create_budget(user_id, "Food", 500.0).unwrap();
    db.create_budget(user_id, "Rent", 1000.0).unwrap();
    db.upsert_budget_history(user_id, "Food", 1, 2024, 500.0, 400.0, 450.0)
        .unwrap();
    db.upsert_budget_history(user_id, "Rent", 1, 2024, 1000.0, 1000.0, 1000.0)
        .unwrap();

    let projection = project_savings(&db, user_id, date(2024, 1, 20)).unwrap();
    assert_eq!(projection.amounts.len(), 13);
    assert_eq!(projection.amounts[0], 100.0);
    assert_eq!(projection.amounts[1], 1600.0);
    assert_eq!(projection.months[0], "Jan");
}

#[test]
fn test_projection_without_history() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "fresh");

    let projection = project_savings(&db, user_id, date(2024, 6, 1)).unwrap();
    assert_eq!(projection.amounts.len(), 13);
    assert_eq!(projection.months.len(), 13);
    assert!(projection.amounts.iter().all(|a| *a == 0.0));
}

// =============================================================================
// Reminders
// =============================================================================

#[test]
fn test_reminder_pass_is_idempotent() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "payer");
    let today = date(2024, 4, 10);

    db.create_recurring_payment(user_id, &recurring("Rent", 1200.0, today, Frequency::Monthly))
        .unwrap();
    db.create_recurring_payment(
        user_id,
        &recurring("Internet", 40.0, date(2024, 4, 12), Frequency::Monthly),
    )
    .unwrap();
    db.create_recurring_payment(
        user_id,
        &recurring("Gym", 30.0, date(2024, 4, 20), Frequency::Monthly),
    )
    .unwrap();

    let first = run_reminder_pass(&db, today, 3).unwrap();
    assert_eq!(first.sent, 2);

    let second = run_reminder_pass(&db, today, 3).unwrap();
    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 2);

    let notes = db.list_notifications(user_id, true).unwrap();
    assert_eq!(notes.len(), 2);
    let messages: Vec<_> = notes.iter().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"Reminder: Rent payment of ₹1200.00 is due today!"));
    assert!(messages.contains(&"Reminder: Internet bill of ₹40.00 is due in 2 days."));
}

#[test]
fn test_failed_reminder_is_retried_next_pass() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "retry");
    let today = date(2024, 4, 10);

    db.create_recurring_payment(
        user_id,
        &recurring("Internet", 40.0, date(2024, 4, 12), Frequency::Monthly),
    )
    .unwrap();

    // Make notification inserts fail for one pass
    db.conn()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER fail_notifications BEFORE INSERT ON notifications
             BEGIN SELECT RAISE(ABORT, 'transient'); END;",
        )
        .unwrap();

    let failed = run_reminder_pass(&db, today, 3).unwrap();
    assert_eq!(failed.sent, 0);
    assert_eq!(failed.skipped, 0);

    db.conn()
        .unwrap()
        .execute_batch("DROP TRIGGER fail_notifications;")
        .unwrap();

    let retried = run_reminder_pass(&db, today, 3).unwrap();
    assert_eq!(retried.sent, 1);
    assert_eq!(retried.skipped, 0);

    let notes = db.list_notifications(user_id, true).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "Reminder: Internet bill of ₹40.00 is due in 2 days.");
}

#[test]
fn test_overdue_payments_roll_forward() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "late");
    let today = date(2024, 4, 10);

    let weekly = db
        .create_recurring_payment(
            user_id,
            &recurring("Cleaner", 25.0, date(2024, 3, 25), Frequency::Weekly),
        )
        .unwrap();

    let report = run_reminder_pass(&db, today, 3).unwrap();
    assert_eq!(report.rolled_forward, 1);

    let rolled = db.get_recurring_payment(user_id, weekly.id).unwrap().unwrap();
    // 03-25 -> 04-01 -> 04-08 -> 04-15
    assert_eq!(rolled.next_payment_date, date(2024, 4, 15));
}

// =============================================================================
// Budget history
// =============================================================================

#[test]
fn test_snapshot_uses_previous_month_spend() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "snap");

    db.create_budget(user_id, "Food", 100.0).unwrap();
    db.create_budget(user_id, "Fun", 200.0).unwrap();
    add(&db, user_id, Some("Food"), CategoryType::Expense, 150.0, date(2024, 2, 10), None);
    add(&db, user_id, Some("Fun"), CategoryType::Expense, 50.0, date(2024, 2, 11), None);
    // Current month spend is not part of the snapshot
    add(&db, user_id, Some("Food"), CategoryType::Expense, 999.0, date(2024, 3, 2), None);

    let rows = snapshot_user(&db, user_id, date(2024, 3, 5)).unwrap();
    assert_eq!(rows, 2);

    let history = db.list_budget_history(user_id, Some(3), Some(2024)).unwrap();
    let food = history.iter().find(|h| h.category == "Food").unwrap();
    assert_eq!(food.actual_spent, 150.0);
    assert_eq!(food.suggested_limit, 110.0);
    let fun = history.iter().find(|h| h.category == "Fun").unwrap();
    assert_eq!(fun.suggested_limit, 180.0);

    // Re-running replaces rather than duplicates
    let report = snapshot_all(&db, date(2024, 3, 6)).unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(db.list_budget_history(user_id, None, None).unwrap().len(), 2);
}

// =============================================================================
// Analytics
// =============================================================================

#[test]
fn test_financial_summary() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "summary");
    let today = date(2024, 5, 20);

    add(&db, user_id, Some("Salary"), CategoryType::Income, 1000.0, date(2024, 4, 1), None);
    add(&db, user_id, Some("Food"), CategoryType::Expense, 500.0, date(2024, 4, 3), None);
    add(&db, user_id, Some("Salary"), CategoryType::Income, 2000.0, date(2024, 5, 1), None);
    add(&db, user_id, Some("Food"), CategoryType::Expense, 1000.0, date(2024, 5, 3), None);
    add(&db, user_id, Some("Loans"), CategoryType::Expense, 200.0, date(2024, 5, 4), Some("Car loan EMI"));

    let goal = db
        .create_goal(
            user_id,
            &NewSavingsGoal {
                name: "Trip".into(),
                target_amount: 1000.0,
                saved_amount: 0.0,
                deadline: None,
            },
        )
        .unwrap();
    add(&db, user_id, Some(SAVINGS_CATEGORY), CategoryType::Expense, 250.0, date(2024, 5, 5), None);
    db.recompute_goal_progress(user_id).unwrap();
    assert_eq!(db.get_goal(user_id, goal.id).unwrap().unwrap().saved_amount, 250.0);

    let summary = financial_summary(&db, user_id, today).unwrap();
    assert_eq!(summary.monthly_income, 2000.0);
    assert_eq!(summary.monthly_expenses, 1450.0);
    assert_eq!(summary.savings, 550.0);
    assert_eq!(summary.income_change, 100.0);
    assert_eq!(summary.expense_change, 190.0);
    assert_eq!(summary.savings_change, 10.0);
    assert_eq!(summary.savings_rate, 27.5);
    assert_eq!(summary.debt_ratio, 10.0);
    assert_eq!(summary.financial_health, "Excellent");
    assert_eq!(summary.financial_health_score, 100);
    assert_eq!(summary.savings_progress, 25.0);
    assert_eq!(summary.total_balance, 1050.0);
}

#[test]
fn test_summary_without_transactions_is_undefined() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "empty");
    let summary = financial_summary(&db, user_id, date(2024, 5, 20)).unwrap();
    assert_eq!(summary.financial_health, "Undefined");
    assert_eq!(summary.financial_health_score, 0);
    assert_eq!(summary.savings_progress, 0.0);
}

#[test]
fn test_spending_analysis_month() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "charts");
    let today = date(2024, 5, 20);

    add(&db, user_id, Some("Food"), CategoryType::Expense, 30.0, date(2024, 5, 2), None);
    add(&db, user_id, None, CategoryType::Expense, 20.0, date(2024, 5, 2), None);
    add(&db, user_id, Some("Salary"), CategoryType::Income, 900.0, date(2024, 5, 3), None);
    add(&db, user_id, Some("Food"), CategoryType::Expense, 70.0, date(2024, 4, 28), None);

    let analysis = spending_analysis(&db, user_id, Period::Month, today).unwrap();
    assert_eq!(analysis.dates, vec!["2024-05-02", "2024-05-03"]);
    assert_eq!(analysis.expenses, vec![50.0, 0.0]);
    assert_eq!(analysis.income, vec![0.0, 900.0]);
    assert_eq!(analysis.expense_categories.len(), 2);
    assert_eq!(analysis.expense_categories[0].category, "Food");
    assert_eq!(analysis.expense_categories[1].category, "Uncategorized");
    assert_eq!(analysis.months, vec!["Month 5"]);
    assert_eq!(analysis.monthly_expenses, vec![50.0]);
    assert_eq!(analysis.bar_months.len(), 6);
    assert_eq!(analysis.bar_months[5], "May 2024");
    assert_eq!(analysis.bar_months[0], "Dec 2023");
    assert_eq!(analysis.bar_expenses[4], 70.0);
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_auto_categorization_never_leaves_null() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "auto");
    let chain = CategorizerChain::standard(Some(AIClient::mock()));

    for description in ["Uber home", "weekly groceries", "mystery purchase"] {
        let tx = create_with_category(
            &db,
            &chain,
            user_id,
            NewTransaction {
                amount: 10.0,
                category_id: None,
                category_type: CategoryType::Expense,
                description: Some(description.to_string()),
                date: date(2024, 1, 1),
            },
        )
        .await
        .unwrap();
        assert!(tx.category_id.is_some(), "{} left uncategorized", description);
    }

    let names: Vec<_> = db
        .list_categories(user_id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Groceries".to_string()));
}

#[test]
fn test_delete_archives_exactly_once() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "deleter");
    add(&db, user_id, Some("Food"), CategoryType::Expense, 42.0, date(2024, 1, 5), Some("Tacos"));
    let tx = db.recent_transactions(user_id, 1).unwrap().remove(0);

    assert!(db.delete_transaction(user_id, tx.id).unwrap());
    assert!(!db.delete_transaction(user_id, tx.id).unwrap());

    let archive = db.list_deleted_transactions(user_id).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].amount, 42.0);
    assert_eq!(archive[0].category_name.as_deref(), Some("Food"));
    assert!(db.get_transaction(user_id, tx.id).unwrap().is_none());
}

// =============================================================================
// Insights + exports
// =============================================================================

#[tokio::test]
async fn test_insights_end_to_end() {
    let db = Database::in_memory().unwrap();
    let user_id = make_user(&db, "advisor");
    for d in 1..=10 {
        add(&db, user_id, Some("Food"), CategoryType::Expense, 40.0, date(2024, 3, d), None);
    }

    let ctx = AnalysisContext::load(&db, None, user_id, date(2024, 3, 10)).unwrap();
    let shown = InsightEngine::new().run_and_persist(&ctx).await.unwrap();
    assert!(shown.iter().any(|i| i.kind == InsightKind::Forecast));
    assert!(shown.iter().all(|i| i.description.contains('₹') || i.kind == InsightKind::General));
    assert_eq!(db.list_budget_insights(user_id).unwrap().len(), 1);
}

#[test]
fn test_admin_transaction_export_covers_all_users() {
    let db = Database::in_memory().unwrap();
    let a = make_user(&db, "a");
    let b = make_user(&db, "b");
    add(&db, a, None, CategoryType::Expense, 1.0, date(2024, 1, 1), None);
    add(&db, b, None, CategoryType::Expense, 2.0, date(2024, 1, 2), None);

    let csv = db.export_transactions_csv(None).unwrap();
    assert_eq!(csv.lines().count(), 3);
    let own = db.export_transactions_csv(Some(a)).unwrap();
    assert_eq!(own.lines().count(), 2);
}
