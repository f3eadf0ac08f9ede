//! Dashboard analytics: the financial summary card and spending charts

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::db::{CategoryTotal, Database};
use crate::error::{Error, Result};
use crate::health::{classify, debt_total, percent_change, ratio_of_income};
use crate::models::round_currency;

/// First and last day of a calendar month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next - Duration::days(1)))
}

/// (year, month) of the calendar month before `date`
pub fn previous_month(date: NaiveDate) -> (i32, u32) {
    if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    }
}

fn bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    month_bounds(year, month)
        .ok_or_else(|| Error::InvalidData(format!("Invalid month {}-{}", year, month)))
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub total_balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings: f64,
    pub income_change: f64,
    pub expense_change: f64,
    pub balance_change: f64,
    pub savings_change: f64,
    pub savings_rate: f64,
    pub debt_ratio: f64,
    pub financial_health: String,
    pub financial_health_score: u8,
    pub savings_progress: f64,
}

/// Summary card figures for the month containing `today`
pub fn financial_summary(db: &Database, user_id: i64, today: NaiveDate) -> Result<FinancialSummary> {
    let (month_start, month_end) = bounds(today.year(), today.month())?;
    let (prev_year, prev_month) = previous_month(today);
    let (prev_start, prev_end) = bounds(prev_year, prev_month)?;

    let all_time = db.type_totals(user_id, None, None)?;
    let current = db.type_totals(user_id, Some(month_start), Some(month_end))?;
    let previous = db.type_totals(user_id, Some(prev_start), Some(prev_end))?;
    let before_month = db.type_totals(user_id, None, Some(prev_end))?;

    let savings = current.income - current.expenses;
    let previous_savings = previous.income - previous.expenses;

    let debt = debt_total(db, user_id, month_start, month_end)?;
    let savings_rate = ratio_of_income(savings, current.income);
    let debt_ratio = ratio_of_income(debt, current.income);
    let health = classify(savings_rate, debt_ratio, db.count_transactions(user_id)? > 0);

    let goals = db.list_goals(user_id)?;
    let target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let saved: f64 = goals.iter().map(|g| g.saved_amount).sum();
    let savings_progress = if target > 0.0 {
        round_currency(saved / target * 100.0)
    } else {
        0.0
    };

    Ok(FinancialSummary {
        total_balance: round_currency(all_time.income - all_time.expenses),
        monthly_income: round_currency(current.income),
        monthly_expenses: round_currency(current.expenses),
        savings: round_currency(savings),
        income_change: percent_change(current.income, previous.income),
        expense_change: percent_change(current.expenses, previous.expenses),
        balance_change: percent_change(
            all_time.income - all_time.expenses,
            before_month.income - before_month.expenses,
        ),
        savings_change: percent_change(savings, previous_savings),
        savings_rate,
        debt_ratio,
        financial_health: health.as_str().to_string(),
        financial_health_score: health.score(),
        savings_progress,
    })
}

/// Chart window for spending analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// First day of the period containing `today`
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Week => today - Duration::days(today.weekday().num_days_from_monday() as i64),
            Self::Month => today.with_day(1).unwrap_or(today),
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendingAnalysis {
    pub dates: Vec<String>,
    pub income: Vec<f64>,
    pub expenses: Vec<f64>,
    pub expense_categories: Vec<CategoryTotal>,
    pub months: Vec<String>,
    pub monthly_expenses: Vec<f64>,
    pub bar_months: Vec<String>,
    pub bar_income: Vec<f64>,
    pub bar_expenses: Vec<f64>,
}

/// Number of calendar months in the income-vs-expense bar chart
const BAR_MONTHS: u32 = 6;

/// Chart data from the start of `period` through `today`
pub fn spending_analysis(
    db: &Database,
    user_id: i64,
    period: Period,
    today: NaiveDate,
) -> Result<SpendingAnalysis> {
    let start = period.start(today);

    let daily = db.daily_totals(user_id, start, today)?;
    let expense_categories = db.expense_by_category(user_id, start, today)?;

    let mut months: Vec<String> = Vec::new();
    let mut monthly_expenses: Vec<f64> = Vec::new();
    for day in &daily {
        if day.expenses == 0.0 {
            continue;
        }
        let label = format!("Month {}", day.date.month());
        match months.iter().position(|m| *m == label) {
            Some(i) => monthly_expenses[i] += day.expenses,
            None => {
                months.push(label);
                monthly_expenses.push(day.expenses);
            }
        }
    }

    let mut bar_months = Vec::new();
    let mut bar_income = Vec::new();
    let mut bar_expenses = Vec::new();
    let (mut year, mut month) = (today.year(), today.month());
    let mut window = Vec::new();
    for _ in 0..BAR_MONTHS {
        window.push((year, month));
        (year, month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
    }
    for (year, month) in window.into_iter().rev() {
        let (m_start, m_end) = bounds(year, month)?;
        let totals = db.type_totals(user_id, Some(m_start), Some(m_end))?;
        bar_months.push(m_start.format("%b %Y").to_string());
        bar_income.push(round_currency(totals.income));
        bar_expenses.push(round_currency(totals.expenses));
    }

    Ok(SpendingAnalysis {
        dates: daily.iter().map(|d| d.date.format("%Y-%m-%d").to_string()).collect(),
        income: daily.iter().map(|d| round_currency(d.income)).collect(),
        expenses: daily.iter().map(|d| round_currency(d.expenses)).collect(),
        expense_categories,
        months,
        monthly_expenses: monthly_expenses.into_iter().map(round_currency).collect(),
        bar_months,
        bar_income,
        bar_expenses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_bounds(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_bounds(2023, 13), None);
    }

    #[test]
    fn test_previous_month_wraps_year() {
        assert_eq!(previous_month(date(2024, 1, 15)), (2023, 12));
        assert_eq!(previous_month(date(2024, 7, 1)), (2024, 6));
    }

    #[test]
    fn test_period_starts() {
        // 2024-05-16 is a Thursday
        let today = date(2024, 5, 16);
        assert_eq!(Period::Week.start(today), date(2024, 5, 13));
        assert_eq!(Period::Month.start(today), date(2024, 5, 1));
        assert_eq!(Period::Year.start(today), date(2024, 1, 1));
        assert_eq!("YEAR".parse::<Period>().unwrap(), Period::Year);
        assert!("decade".parse::<Period>().is_err());
    }
}
