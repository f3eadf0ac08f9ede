//! Financial health scoring
//!
//! Two ratios drive a four-level label: the savings rate and the debt ratio,
//! both as percentages of the month's income.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{round_currency, CategoryType};

/// Debt-related words in a transaction description
const DEBT_PATTERN: &str = r"(?i)\b(loan|emi|mortgage|credit)\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthLabel {
    Excellent,
    Good,
    Poor,
    Undefined,
}

impl HealthLabel {
    pub fn score(&self) -> u8 {
        match self {
            Self::Excellent => 100,
            Self::Good => 70,
            Self::Poor => 30,
            Self::Undefined => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Poor => "Poor",
            Self::Undefined => "Undefined",
        }
    }
}

/// `value ÷ income × 100`, rounded; 0 without income
pub fn ratio_of_income(value: f64, income: f64) -> f64 {
    if income > 0.0 {
        round_currency(value / income * 100.0)
    } else {
        0.0
    }
}

/// Percent change against a previous value, rounded; 0 when `previous` is 0
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        round_currency((current - previous) / previous.abs() * 100.0)
    }
}

pub fn classify(savings_rate: f64, debt_ratio: f64, has_transactions: bool) -> HealthLabel {
    if !has_transactions {
        HealthLabel::Undefined
    } else if savings_rate > 20.0 && debt_ratio < 30.0 {
        HealthLabel::Excellent
    } else if savings_rate > 10.0 && debt_ratio < 40.0 {
        HealthLabel::Good
    } else {
        HealthLabel::Poor
    }
}

/// Stored debt baseline plus debt-like expenses within `[start, end]`
pub fn debt_total(db: &Database, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<f64> {
    let re = Regex::new(DEBT_PATTERN)?;
    let baseline = db.get_or_create_financial_data(user_id)?.total_debt;
    let payments: f64 = db
        .transactions_between(user_id, start, end, Some(CategoryType::Expense))?
        .iter()
        .filter(|t| t.description.as_deref().is_some_and(|d| re.is_match(d)))
        .map(|t| t.amount)
        .sum();
    Ok(baseline + payments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(25.0, 10.0, true), HealthLabel::Excellent);
        assert_eq!(classify(25.0, 35.0, true), HealthLabel::Good);
        assert_eq!(classify(15.0, 39.9, true), HealthLabel::Good);
        assert_eq!(classify(20.0, 0.0, true), HealthLabel::Good);
        assert_eq!(classify(10.0, 0.0, true), HealthLabel::Poor);
        assert_eq!(classify(50.0, 45.0, true), HealthLabel::Poor);
        assert_eq!(classify(50.0, 0.0, false), HealthLabel::Undefined);
    }

    #[test]
    fn test_score_is_one_of_four() {
        for s in [-100.0, 0.0, 10.5, 20.5, 99.0] {
            for d in [0.0, 29.0, 35.0, 80.0] {
                for has in [true, false] {
                    let score = classify(s, d, has).score();
                    assert!([0, 30, 70, 100].contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_ratios_and_changes() {
        assert_eq!(ratio_of_income(250.0, 1000.0), 25.0);
        assert_eq!(ratio_of_income(250.0, 0.0), 0.0);
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(150.0, 0.0), 0.0);
        assert_eq!(percent_change(-50.0, -100.0), 50.0);
    }

    #[test]
    fn test_debt_pattern_matches_whole_words() {
        let re = Regex::new(DEBT_PATTERN).unwrap();
        assert!(re.is_match("Home Loan EMI"));
        assert!(re.is_match("credit card bill"));
        assert!(!re.is_match("accreditation fee"));
        assert!(!re.is_match("loaned book"));
    }
}
