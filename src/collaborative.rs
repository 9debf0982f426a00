use crate::error::Result;
use crate::matrix::{build_interaction_matrix, LabeledMatrix};
use crate::similarity::cosine_similarity;
use crate::types::Rating;
use candle_core::Tensor;
use tracing::debug;

/// User-user neighbourhood collaborative filtering.
///
/// `score[u, i] = Σ_v sim(u, v) · r(v, i) / Σ_v |sim(u, v)|`, where `v` ranges over the
/// other users (or all users, including `u`, when `include_self` is set). A zero
/// denominator is replaced by 1, so a user with no similar neighbours scores 0.
/// Items the user already rated are scored too; callers mask them if they need to.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollaborativeScorer {
    pub include_self: bool,
}

impl CollaborativeScorer {
    pub fn new(include_self: bool) -> Self {
        Self { include_self }
    }

    pub fn predict(&self, interactions: &LabeledMatrix, similarity: &LabeledMatrix) -> Result<LabeledMatrix> {
        let n_users = interactions.rows().len();
        if similarity.rows() != interactions.rows() || similarity.cols() != interactions.rows() {
            return Err(candle_core::Error::Msg(
                "similarity matrix is not indexed by the interaction matrix users".to_string(),
            )
            .into());
        }

        let mut weights = similarity.values().clone();
        if !self.include_self {
            let off_diagonal: Vec<f32> = (0..n_users * n_users)
                .map(|k| if k / n_users == k % n_users { 0.0 } else { 1.0 })
                .collect();
            let mask = Tensor::from_vec(off_diagonal, (n_users, n_users), weights.device())?;
            weights = weights.mul(&mask)?;
        }

        let weighted_sum = weights.matmul(interactions.values())?;
        let sim_sums: Vec<f32> = weights
            .abs()?
            .sum_keepdim(1)?
            .flatten_all()?
            .to_vec1::<f32>()?
            .into_iter()
            .map(|sum| if sum == 0.0 { 1.0 } else { sum })
            .collect();
        let sim_sums = Tensor::from_vec(sim_sums, (n_users, 1), weights.device())?;
        let scores = weighted_sum.broadcast_div(&sim_sums)?;

        debug!(users = n_users, items = interactions.cols().len(), "CF scores predicted");
        interactions.with_values(scores)
    }

    /// Builds the interaction and similarity matrices from `ratings` and predicts.
    pub fn score(&self, ratings: &[Rating]) -> Result<LabeledMatrix> {
        let interactions = build_interaction_matrix(ratings)?;
        let similarity = cosine_similarity(&interactions)?;
        self.predict(&interactions, &similarity)
    }
}

/// CF scores over the users and items present in `ratings`, excluding self-similarity.
pub fn cf_scores(ratings: &[Rating]) -> Result<LabeledMatrix> {
    CollaborativeScorer::default().score(ratings)
}
