//! Domain models for fintrack

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Round a monetary amount to two decimal places
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Display symbol for a currency code (falls back to the code itself)
pub fn currency_symbol(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "INR" => "₹".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        other => format!("{} ", other),
    }
}

// ============================================================================
// Users
// ============================================================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub phone_no: Option<String>,
    pub role: Role,
    /// Inactive users are treated as banned
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Argon2 PHC string, never the plain password
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone_no: Option<String>,
    pub role: Role,
}

/// Admin-side user edits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Filters for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Substring match on username or email
    pub query: Option<String>,
    /// "active" or "banned"
    pub status: Option<String>,
    /// username, email, last_login or date_joined
    pub sort: Option<String>,
    /// asc or desc
    pub order: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Per-user preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub preferred_currency: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Student, Employee, Business, Retired
    pub occupation: Option<String>,
    /// <10K, 10K-50K, 50K-100K, 100K+
    pub annual_income: Option<String>,
    /// Savings, Investment, Budgeting, Debt Management
    pub financial_goal: Option<String>,
    /// Low, Medium, High
    pub investment_risk: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub preferred_currency: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub occupation: Option<String>,
    pub annual_income: Option<String>,
    pub financial_goal: Option<String>,
    pub investment_risk: Option<String>,
}

/// Self-reported income, savings and debt figures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialData {
    pub user_id: i64,
    pub monthly_income_salary: f64,
    pub monthly_income_business: f64,
    pub monthly_income_freelance: f64,
    pub monthly_income_other: f64,
    pub savings_cash: f64,
    pub savings_stocks: f64,
    pub savings_crypto: f64,
    pub savings_real_estate: f64,
    pub total_debt: f64,
}

impl FinancialData {
    pub fn monthly_income(&self) -> f64 {
        self.monthly_income_salary
            + self.monthly_income_business
            + self.monthly_income_freelance
            + self.monthly_income_other
    }

    pub fn total_savings(&self) -> f64 {
        self.savings_cash + self.savings_stocks + self.savings_crypto + self.savings_real_estate
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialDataUpdate {
    pub monthly_income_salary: Option<f64>,
    pub monthly_income_business: Option<f64>,
    pub monthly_income_freelance: Option<f64>,
    pub monthly_income_other: Option<f64>,
    pub savings_cash: Option<f64>,
    pub savings_stocks: Option<f64>,
    pub savings_crypto: Option<f64>,
    pub savings_real_estate: Option<f64>,
    pub total_debt: Option<f64>,
}

// ============================================================================
// Categories & transactions
// ============================================================================

/// A user-owned transaction category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// Categories created for a user the first time they list categories
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Salary",
    "Entertainment",
    "Other",
];

/// Label used for transactions without a category in aggregates
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Whether a transaction adds or removes money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    #[default]
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category type: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub category_id: Option<i64>,
    /// Joined from categories for display
    pub category_name: Option<String>,
    pub category_type: CategoryType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_type: CategoryType,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    pub amount: Option<f64>,
    pub category_id: Option<i64>,
    pub category_type: Option<CategoryType>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Snapshot written when a transaction is deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedTransaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub category_name: Option<String>,
    pub category_type: CategoryType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub deleted_at: DateTime<Utc>,
}

/// Filters and paging for transaction listing
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub min_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    /// date, -date, amount, -amount
    pub ordering: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Budgets
// ============================================================================

/// Monthly spending limit for a category label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub monthly_limit: f64,
    pub created_at: DateTime<Utc>,
}

/// Per-period snapshot of a budget against actual spend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetHistory {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub month: u32,
    pub year: i32,
    pub previous_limit: f64,
    pub actual_spent: f64,
    pub suggested_limit: f64,
}

/// BudgetHistory summed over all categories of one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBudgetTotals {
    pub month: u32,
    pub total_budget: f64,
    pub total_spent: f64,
}

/// One row of the monthly savings history report
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySavingsHistory {
    /// "%b %Y" label
    pub month: String,
    pub total_saved: f64,
    pub actual_spent: f64,
    pub previous_limit: f64,
}

/// Cached advisory record produced by the insights pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInsight {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub average_spending: f64,
    pub forecasted_spending: f64,
    pub savings_recommendation: String,
    pub created_at: DateTime<Utc>,
}

/// Input for the budget insight cache
#[derive(Debug, Clone)]
pub struct NewBudgetInsight {
    pub category: String,
    pub average_spending: f64,
    pub forecasted_spending: f64,
    pub savings_recommendation: String,
}

// ============================================================================
// Savings goals
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: f64,
    /// Only authoritative right after a recompute pass
    pub saved_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub saved_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavingsGoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub saved_amount: Option<f64>,
    pub deadline: Option<NaiveDate>,
}

/// Category whose expense transactions count toward savings goals
pub const SAVINGS_CATEGORY: &str = "Savings";

// ============================================================================
// Recurring payments & notifications
// ============================================================================

/// How often a recurring payment repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// The next due date after `date`
    ///
    /// Month and year steps clamp to the last day of shorter months.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date + Duration::days(1),
            Self::Weekly => date + Duration::days(7),
            Self::Monthly => add_months(date, 1),
            Self::Yearly => add_months(date, 12),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let mut day = date.day();
    loop {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return d;
        }
        day -= 1;
    }
}

/// Lifecycle of a recurring payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurringStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl RecurringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for RecurringStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown recurring payment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPayment {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub category: Option<String>,
    pub frequency: Frequency,
    pub next_payment_date: NaiveDate,
    pub status: RecurringStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecurringPayment {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    pub next_payment_date: NaiveDate,
    #[serde(default)]
    pub status: RecurringStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecurringPaymentUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub frequency: Option<Frequency>,
    pub next_payment_date: Option<NaiveDate>,
    pub status: Option<RecurringStatus>,
}

/// A payment due inside a reminder window, with the owner details needed to notify
#[derive(Debug, Clone)]
pub struct DuePayment {
    pub payment: RecurringPayment,
    pub user_email: String,
    pub currency: String,
}

/// An upcoming bill as shown on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingBill {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub category: Option<String>,
    pub frequency: Frequency,
    pub days_remaining: i64,
    pub next_payment_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub message: String,
    pub status: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Payments (admin revenue reporting)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// UUID v4
    pub payment_id: String,
    pub user_id: i64,
    pub username: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(10.005_1), 10.01);
        assert_eq!(round_currency(99.994), 99.99);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_frequency_advance() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(jan31),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            Frequency::Weekly.advance(jan31),
            NaiveDate::from_ymd_opt(2024, 2, 7).unwrap()
        );
        assert_eq!(
            Frequency::Yearly.advance(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        let dec15 = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(dec15),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_financial_data_totals() {
        let data = FinancialData {
            monthly_income_salary: 1000.0,
            monthly_income_freelance: 250.0,
            savings_cash: 100.0,
            savings_crypto: 50.0,
            ..Default::default()
        };
        assert_eq!(data.monthly_income(), 1250.0);
        assert_eq!(data.total_savings(), 150.0);
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol("inr"), "₹");
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("JPY"), "JPY ");
    }
}
