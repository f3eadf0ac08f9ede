//! Anomaly stage
//!
//! Scores each day's total spend with an isolation forest and reports the
//! top-scoring ~5% of days, naming the category that drove each spike.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;

use super::engine::{AnalysisContext, InsightStage};
use super::types::{Insight, InsightKind};

/// Fewer transactions than this and the stage stays quiet
pub const MIN_TRANSACTIONS: usize = 10;

const TREES: usize = 100;
const MAX_SAMPLES: usize = 256;
const CONTAMINATION: f64 = 0.05;
const SEED: u64 = 42;

pub struct AnomalyStage {
    contamination: f64,
    seed: u64,
}

impl AnomalyStage {
    pub fn new() -> Self {
        Self {
            contamination: CONTAMINATION,
            seed: SEED,
        }
    }
}

impl Default for AnomalyStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightStage for AnomalyStage {
    fn kind(&self) -> InsightKind {
        InsightKind::Anomaly
    }

    fn name(&self) -> &'static str {
        "anomaly"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        if ctx.records.len() < MIN_TRANSACTIONS {
            return Ok(vec![]);
        }

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in &ctx.records {
            *daily.entry(r.date).or_default() += r.amount;
        }
        let days: Vec<NaiveDate> = daily.keys().copied().collect();
        let values: Vec<f64> = daily.values().copied().collect();

        let flagged = flag_outliers(&values, self.contamination, self.seed);

        let mut insights = vec![];
        for (day, _) in days.iter().zip(flagged).filter(|(_, f)| *f) {
            let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
            for r in ctx.records.iter().filter(|r| r.date == *day) {
                *by_category.entry(r.category.as_str()).or_default() += r.amount;
            }
            let Some((category, amount)) = by_category
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
            else {
                continue;
            };

            insights.push(Insight::new(
                InsightKind::Anomaly,
                format!("Unusual Spending Spike: {}", category),
                format!(
                    "You spent {}{:.2} on {} on {}, which is unusually high.",
                    ctx.currency_symbol,
                    amount,
                    category,
                    day.format("%b %d")
                ),
                category,
                amount,
            ));
        }
        Ok(insights)
    }
}

/// Mark the points whose anomaly score lies above the `1 - contamination` quantile
pub fn flag_outliers(values: &[f64], contamination: f64, seed: u64) -> Vec<bool> {
    if values.len() < 2 {
        return vec![false; values.len()];
    }

    let scores = IsolationForest::fit(values, TREES, MAX_SAMPLES, seed).scores(values);
    let threshold = percentile(&scores, 100.0 * (1.0 - contamination));
    scores.iter().map(|s| *s > threshold).collect()
}

/// Linear-interpolated percentile (`q` in 0..=100)
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + 0.577_215_664_9) - 2.0 * (n - 1.0) / n
        }
    }
}

enum Node {
    Leaf { size: usize },
    Split { at: f64, left: Box<Node>, right: Box<Node> },
}

impl Node {
    fn build(values: Vec<f64>, depth: usize, limit: usize, rng: &mut StdRng) -> Self {
        if values.len() <= 1 || depth >= limit {
            return Node::Leaf { size: values.len() };
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min >= max {
            return Node::Leaf { size: values.len() };
        }

        let at = rng.gen_range(min..max);
        let (left, right): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|v| *v < at);
        Node::Split {
            at,
            left: Box::new(Node::build(left, depth + 1, limit, rng)),
            right: Box::new(Node::build(right, depth + 1, limit, rng)),
        }
    }

    fn path_length(&self, value: f64, depth: usize) -> f64 {
        match self {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split { at, left, right } => {
                if value < *at {
                    left.path_length(value, depth + 1)
                } else {
                    right.path_length(value, depth + 1)
                }
            }
        }
    }
}

/// One-dimensional isolation forest
struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    fn fit(values: &[f64], trees: usize, max_samples: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = values.len().min(max_samples);
        let limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..trees)
            .map(|_| {
                let sample: Vec<f64> = rand::seq::index::sample(&mut rng, values.len(), sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                Node::build(sample, 0, limit, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Higher is more anomalous, in (0, 1]
    fn scores(&self, values: &[f64]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size);
        values
            .iter()
            .map(|v| {
                let mean = self.trees.iter().map(|t| t.path_length(*v, 0)).sum::<f64>()
                    / self.trees.len() as f64;
                if norm > 0.0 {
                    2f64.powf(-mean / norm)
                } else {
                    0.5
                }
            })
            .collect()
    }
}
