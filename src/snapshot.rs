use crate::collaborative::CollaborativeScorer;
use crate::config::HybridConfig;
use crate::content::ContentScorer;
use crate::datasets::Dataset;
use crate::error::{RecError, Result};
use crate::evaluation::{EvaluationReport, Evaluator};
use crate::features::{fit_encoder, FeatureVocabulary};
use crate::hybrid::blend;
use crate::matrix::{build_interaction_matrix, LabeledMatrix};
use crate::profiles::{ContentProfileBuilder, ContentProfiles};
use crate::recommenders::{top_n, Recommender};
use crate::similarity::cosine_similarity;
use crate::types::{Candidate, Rating};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Every matrix derived from one load of the dataset. Immutable once built; a reload
/// produces a new snapshot and leaves existing ones untouched.
#[derive(Debug)]
pub struct Snapshot {
    pub config: HybridConfig,
    pub ratings: Vec<Rating>,
    pub interactions: LabeledMatrix,
    pub similarity: LabeledMatrix,
    pub cf: LabeledMatrix,
    pub vocabulary: Option<Arc<FeatureVocabulary>>,
    pub profiles: Option<ContentProfiles>,
    pub cbf: Option<LabeledMatrix>,
    pub hybrid: LabeledMatrix,
}

impl Snapshot {
    pub fn build(dataset: &Dataset, config: &HybridConfig) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();

        let interactions = build_interaction_matrix(&dataset.ratings)?;
        let similarity = cosine_similarity(&interactions)?;
        let cf = CollaborativeScorer::new(config.include_self_similarity).predict(&interactions, &similarity)?;
        info!(
            users = interactions.rows().len(),
            items = interactions.cols().len(),
            "Collaborative scores ready"
        );

        let (vocabulary, profiles, cbf) = if !config.weights.uses_content() {
            (None, None, None)
        } else if dataset.items.is_empty() {
            warn!("No item features available, blending without content scores");
            (None, None, None)
        } else {
            let vocabulary = Arc::new(fit_encoder(&dataset.items)?);
            let builder = ContentProfileBuilder::new(Arc::clone(&vocabulary), config.positive_threshold);
            let profiles = builder.build(&dataset.ratings, &dataset.items, interactions.rows())?;
            let cbf = ContentScorer::new(config.cf_scale_upper).score(&profiles.users, &profiles.items)?;
            info!(
                width = vocabulary.width(),
                items = profiles.items.rows().len(),
                "Content scores ready"
            );
            (Some(vocabulary), Some(profiles), Some(cbf))
        };

        let hybrid = blend(&cf, cbf.as_ref(), &config.weights)?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Snapshot built");

        Ok(Self {
            config: config.clone(),
            ratings: dataset.ratings.clone(),
            interactions,
            similarity,
            cf,
            vocabulary,
            profiles,
            cbf,
            hybrid,
        })
    }

    pub fn users(&self) -> &[String] {
        self.hybrid.rows().labels()
    }

    pub fn score(&self, user_id: &str, item_id: &str) -> Result<f32> {
        self.hybrid.get(user_id, item_id)
    }

    /// Items `user_id` has a rating record for, in item id order.
    pub fn rated_items(&self, user_id: &str) -> Result<Vec<String>> {
        if !self.interactions.rows().contains(user_id) {
            return Err(RecError::UserNotFound(user_id.to_string()));
        }
        let mut items: Vec<String> = self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.item_id.clone())
            .collect();
        items.sort();
        items.dedup();
        Ok(items)
    }

    pub fn evaluate(&self) -> Result<EvaluationReport> {
        Evaluator::from_config(&self.config).evaluate(&self.ratings, &self.hybrid)
    }
}

impl Recommender for Snapshot {
    fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Candidate>> {
        top_n(&self.hybrid, user_id, n)
    }
}

/// Builds the snapshot on first use and hands out the same one until [`Self::reset`].
pub struct SnapshotLoader {
    dataset: Dataset,
    config: HybridConfig,
    loaded: Option<Arc<Snapshot>>,
}

impl SnapshotLoader {
    pub fn new(dataset: Dataset, config: HybridConfig) -> Self {
        Self {
            dataset,
            config,
            loaded: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn get(&mut self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = &self.loaded {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(Snapshot::build(&self.dataset, &self.config)?);
        self.loaded = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Swaps in new data. The next `get` rebuilds; snapshots already handed out stay valid.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.loaded = None;
    }
}
