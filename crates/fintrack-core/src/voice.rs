//! Free-text ("voice") transaction entry
//!
//! Turns a dictated sentence such as "paid 450 for uber yesterday" into a
//! draft transaction the user confirms before it is saved.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::CategoryType;

/// Keyword to category label
pub const KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("salary", "Salary"),
    ("deposit", "Salary"),
    ("bonus", "Salary"),
    ("food", "Food"),
    ("restaurant", "Food"),
    ("dining", "Food"),
    ("rent", "Rent"),
    ("shopping", "Shopping"),
    ("groceries", "Groceries"),
    ("supermarket", "Groceries"),
    ("subscription", "Subscription"),
    ("netflix", "Subscription"),
    ("spotify", "Subscription"),
    ("electricity", "Bills"),
    ("water", "Bills"),
    ("internet", "Bills"),
    ("insurance", "Insurance"),
    ("health", "Insurance"),
    ("fuel", "Transport"),
    ("car", "Transport"),
    ("bus", "Transport"),
    ("taxi", "Transport"),
    ("uber", "Transport"),
    ("loan", "Loans"),
    ("emi", "Loans"),
    ("mortgage", "Loans"),
    ("gift", "Gift"),
    ("donation", "Donation"),
    ("charity", "Donation"),
    ("entertainment", "Entertainment"),
    ("movie", "Entertainment"),
    ("concert", "Entertainment"),
    ("travel", "Travel"),
    ("flight", "Travel"),
    ("hotel", "Travel"),
    ("vacation", "Travel"),
];

/// Category whose keywords mark a transaction as income
pub const INCOME_CATEGORY: &str = "Salary";

const AMOUNT_PATTERN: &str = r"\b\d+(?:\.\d{2})?\b";

/// Structured draft parsed from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub amount: f64,
    pub transaction_type: CategoryType,
    pub category: String,
}

/// Category for free text by keyword; the last matching word wins
pub fn keyword_category(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter_map(|word| {
            KEYWORD_CATEGORIES
                .iter()
                .find(|(keyword, _)| *keyword == word)
                .map(|(_, category)| *category)
        })
        .last()
}

/// Parse a dictated sentence into a draft transaction
///
/// The amount is the first number in the text (0 when there is none).
/// Unknown text is an `Other` expense.
pub fn parse_voice_entry(text: &str) -> Result<VoiceEntry> {
    let amount_re = Regex::new(AMOUNT_PATTERN)?;
    let amount = amount_re
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let category = keyword_category(text).unwrap_or("Other");
    let transaction_type = if category == INCOME_CATEGORY {
        CategoryType::Income
    } else {
        CategoryType::Expense
    };

    Ok(VoiceEntry {
        amount,
        transaction_type,
        category: category.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_entry() {
        let entry = parse_voice_entry("Spent 250 on dinner at a restaurant").unwrap();
        assert_eq!(entry.amount, 250.0);
        assert_eq!(entry.category, "Food");
        assert_eq!(entry.transaction_type, CategoryType::Expense);
    }

    #[test]
    fn test_income_entry() {
        let entry = parse_voice_entry("got my salary of 50000.00 today").unwrap();
        assert_eq!(entry.amount, 50000.0);
        assert_eq!(entry.category, "Salary");
        assert_eq!(entry.transaction_type, CategoryType::Income);
    }

    #[test]
    fn test_last_keyword_wins() {
        let entry = parse_voice_entry("bonus spent on a flight").unwrap();
        assert_eq!(entry.category, "Travel");
        assert_eq!(entry.transaction_type, CategoryType::Expense);
    }

    #[test]
    fn test_first_amount_and_defaults() {
        let entry = parse_voice_entry("paid 120 then 80 for something").unwrap();
        assert_eq!(entry.amount, 120.0);
        assert_eq!(entry.category, "Other");

        let none = parse_voice_entry("no numbers here").unwrap();
        assert_eq!(none.amount, 0.0);
    }

    #[test]
    fn test_punctuation_is_ignored() {
        assert_eq!(keyword_category("Took an Uber, then a bus."), Some("Transport"));
        assert_eq!(keyword_category("nothing relevant"), None);
    }
}
