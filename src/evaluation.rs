use crate::collaborative::CollaborativeScorer;
use crate::config::{EvaluationConfig, HybridConfig};
use crate::datasets::split_holdout;
use crate::error::Result;
use crate::matrix::LabeledMatrix;
use crate::metrics::{precision_at_k, rmse};
use crate::recommenders::top_n;
use crate::types::Rating;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Offline quality of a score matrix. `None` means the metric had nothing to measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub rmse: Option<f32>,
    pub precision_at_k: Option<f32>,
    pub k: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub evaluated_predictions: usize,
    pub evaluated_users: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    pub evaluation: EvaluationConfig,
    pub positive_threshold: f32,
    pub include_self: bool,
}

impl Evaluator {
    pub fn from_config(config: &HybridConfig) -> Self {
        Self {
            evaluation: config.evaluation,
            positive_threshold: config.positive_threshold,
            include_self: config.include_self_similarity,
        }
    }

    /// RMSE comes from a CF-only model retrained on the seeded training split and
    /// checked against the held-out ratings. Precision@K ranks `hybrid` and checks the
    /// top K against each user's positively rated items in the full rating set.
    pub fn evaluate(&self, ratings: &[Rating], hybrid: &LabeledMatrix) -> Result<EvaluationReport> {
        let (train, test) = split_holdout(ratings, self.evaluation.holdout_fraction, self.evaluation.seed);
        let (rmse, evaluated_predictions) = self.held_out_rmse(&train, &test)?;
        let (precision_at_k, evaluated_users) = self.precision(ratings, hybrid)?;

        let report = EvaluationReport {
            rmse,
            precision_at_k,
            k: self.evaluation.k,
            train_size: train.len(),
            test_size: test.len(),
            evaluated_predictions,
            evaluated_users,
        };
        info!(
            rmse = ?report.rmse,
            precision_at_k = ?report.precision_at_k,
            k = report.k,
            train = report.train_size,
            test = report.test_size,
            "Evaluation finished"
        );
        Ok(report)
    }

    /// Held-out records whose user or item the training split never saw are skipped.
    fn held_out_rmse(&self, train: &[Rating], test: &[Rating]) -> Result<(Option<f32>, usize)> {
        if train.is_empty() || test.is_empty() {
            return Ok((None, 0));
        }
        let train_scores = CollaborativeScorer::new(self.include_self).score(train)?;

        let mut labels = Vec::new();
        let mut predictions = Vec::new();
        for record in test {
            if train_scores.rows().contains(&record.user_id) && train_scores.cols().contains(&record.item_id) {
                predictions.push(train_scores.get(&record.user_id, &record.item_id)?);
                labels.push(record.rating);
            }
        }
        Ok((rmse(&labels, &predictions)?, predictions.len()))
    }

    fn precision(&self, ratings: &[Rating], hybrid: &LabeledMatrix) -> Result<(Option<f32>, usize)> {
        let k = self.evaluation.k;
        let mut relevant: HashMap<&str, HashSet<&str>> = HashMap::new();
        for record in ratings.iter().filter(|r| r.is_positive(self.positive_threshold)) {
            relevant
                .entry(record.user_id.as_str())
                .or_default()
                .insert(record.item_id.as_str());
        }

        let empty = HashSet::new();
        let mut precision_sum = 0f32;
        let mut user_count = 0usize;
        for user_id in hybrid.rows().labels() {
            let recommended: Vec<String> = top_n(hybrid, user_id, k)?
                .into_iter()
                .map(|c| c.item_id)
                .collect();
            let user_relevant = relevant.get(user_id.as_str()).unwrap_or(&empty);
            precision_sum += precision_at_k(&recommended, user_relevant, k);
            user_count += 1;
        }

        if user_count == 0 {
            return Ok((None, 0));
        }
        Ok((Some(precision_sum / user_count as f32), user_count))
    }
}

/// Evaluates with the given seed and K, other settings at their defaults.
pub fn evaluate(ratings: &[Rating], hybrid: &LabeledMatrix, seed: u64, k: usize) -> Result<EvaluationReport> {
    let mut config = HybridConfig::default();
    config.evaluation.seed = seed;
    config.evaluation.k = k;
    Evaluator::from_config(&config).evaluate(ratings, hybrid)
}
