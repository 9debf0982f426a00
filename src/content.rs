use crate::error::Result;
use crate::matrix::LabeledMatrix;
use crate::similarity::pairwise_cosine;
use tracing::debug;

/// Spreads narrower than this are treated as a constant matrix.
const DEGENERATE_RANGE: f32 = 1e-6;

/// Content-based scores: cosine between user and item profiles, min-max rescaled
/// onto `[0, scale_upper]` so they are comparable with CF scores.
#[derive(Debug, Clone, Copy)]
pub struct ContentScorer {
    pub scale_upper: f32,
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self { scale_upper: 2.0 }
    }
}

impl ContentScorer {
    pub fn new(scale_upper: f32) -> Self {
        Self { scale_upper }
    }

    /// Raw user×item cosine in [-1, 1].
    pub fn similarity(&self, user_profiles: &LabeledMatrix, item_profiles: &LabeledMatrix) -> Result<LabeledMatrix> {
        pairwise_cosine(user_profiles, item_profiles)
    }

    /// Global min maps to 0 and global max to `scale_upper`. A constant matrix
    /// rescales to all zeros.
    pub fn rescale(&self, scores: &LabeledMatrix) -> Result<LabeledMatrix> {
        if scores.is_empty() {
            return Ok(scores.clone());
        }
        let flat = scores.values().flatten_all()?;
        let min = flat.min(0)?.to_scalar::<f32>()?;
        let max = flat.max(0)?.to_scalar::<f32>()?;
        let range = max - min;
        if range < DEGENERATE_RANGE {
            debug!(min, max, "Degenerate content score range, rescaling to zero");
            return LabeledMatrix::zeros(scores.rows().clone(), scores.cols().clone());
        }
        let scale = (self.scale_upper / range) as f64;
        let rescaled = scores.values().affine(1.0, -(min as f64))?.affine(scale, 0.0)?;
        scores.with_values(rescaled)
    }

    pub fn score(&self, user_profiles: &LabeledMatrix, item_profiles: &LabeledMatrix) -> Result<LabeledMatrix> {
        let raw = self.similarity(user_profiles, item_profiles)?;
        self.rescale(&raw)
    }
}

/// Rescaled CBF scores on the default CF scale of [0, 2].
pub fn content_scores(user_profiles: &LabeledMatrix, item_profiles: &LabeledMatrix) -> Result<LabeledMatrix> {
    ContentScorer::default().score(user_profiles, item_profiles)
}
