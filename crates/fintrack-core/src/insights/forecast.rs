//! Forecast stage
//!
//! Fits a least-squares trend to each category's daily spend and sums the
//! next 30 days of predictions. When the fit is unusable the stage falls back
//! to the observed daily run rate.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;

use super::engine::{AnalysisContext, InsightStage};
use super::types::{Insight, InsightKind};

/// Categories with fewer daily points are skipped
pub const MIN_POINTS: usize = 5;

/// Days projected forward
pub const HORIZON_DAYS: i64 = 30;

pub struct ForecastStage {
    horizon_days: i64,
}

impl ForecastStage {
    pub fn new() -> Self {
        Self {
            horizon_days: HORIZON_DAYS,
        }
    }
}

impl Default for ForecastStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightStage for ForecastStage {
    fn kind(&self) -> InsightKind {
        InsightKind::Forecast
    }

    fn name(&self) -> &'static str {
        "forecast"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let mut insights = vec![];

        for (category, series) in ctx.daily_by_category() {
            if series.len() < MIN_POINTS {
                continue;
            }

            let projected = match project_trend(&series, self.horizon_days) {
                Some(total) => total,
                None => {
                    tracing::debug!(category, "Trend fit unusable, using run rate");
                    run_rate(&series, self.horizon_days)
                }
            };

            if projected > 0.0 {
                insights.push(Insight::new(
                    InsightKind::Forecast,
                    format!("Spending Forecast: {}", category),
                    format!(
                        "Based on your trends, we project you will spend {}{:.2} on {} in the next 30 days.",
                        ctx.currency_symbol, projected, category
                    ),
                    category,
                    projected,
                ));
            }
        }

        Ok(insights)
    }
}

/// Sum of the fitted line over the `horizon` days after the last observation
///
/// `None` when the series is degenerate or the result is not finite.
pub fn project_trend(series: &[(NaiveDate, f64)], horizon: i64) -> Option<f64> {
    let (first, _) = series.first()?;
    let (last, _) = series.last()?;

    let xs: Vec<f64> = series
        .iter()
        .map(|(d, _)| (*d - *first).num_days() as f64)
        .collect();
    let ys: Vec<f64> = series.iter().map(|(_, y)| *y).collect();
    let n = xs.len() as f64;

    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let last_x = (*last - *first).num_days() as f64;
    let total: f64 = (1..=horizon)
        .map(|i| intercept + slope * (last_x + i as f64))
        .sum();

    total.is_finite().then_some(total)
}

/// (total ÷ calendar span in days) × horizon
pub fn run_rate(series: &[(NaiveDate, f64)], horizon: i64) -> f64 {
    let (Some((first, _)), Some((last, _))) = (series.first(), series.last()) else {
        return 0.0;
    };
    let span_days = (*last - *first).num_days() + 1;
    let total: f64 = series.iter().map(|(_, y)| y).sum();
    total / span_days as f64 * horizon as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_flat_series_projects_level() {
        let series: Vec<_> = (1..=6).map(|d| (day(d), 10.0)).collect();
        let total = project_trend(&series, 30).unwrap();
        assert!((total - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_rising_series() {
        // y = x + 1 over x = 0..4, next 30 days are x = 5..34
        let series: Vec<_> = (1..=5).map(|d| (day(d), d as f64)).collect();
        let total = project_trend(&series, 30).unwrap();
        let expected: f64 = (5..35).map(|x| x as f64 + 1.0).sum();
        assert!((total - expected).abs() < 1e-6);
    }

    #[test]
    fn test_single_day_is_degenerate() {
        assert!(project_trend(&[(day(1), 5.0)], 30).is_none());
    }

    #[test]
    fn test_run_rate_uses_calendar_span() {
        // 100 spent across a 10-day span
        let series = vec![(day(1), 40.0), (day(10), 60.0)];
        assert!((run_rate(&series, 30) - 300.0).abs() < 1e-9);
        assert_eq!(run_rate(&[], 30), 0.0);
    }
}
