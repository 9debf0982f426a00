use crate::datasets::IdIndex;
use crate::error::Result;
use crate::features::FeatureVocabulary;
use crate::matrix::LabeledMatrix;
use crate::types::{ItemFeatures, Rating};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// User and item profile vectors living in the same encoded feature space.
#[derive(Debug, Clone)]
pub struct ContentProfiles {
    pub users: LabeledMatrix,
    pub items: LabeledMatrix,
}

pub struct ContentProfileBuilder {
    vocabulary: Arc<FeatureVocabulary>,
    positive_threshold: f32,
}

impl ContentProfileBuilder {
    pub fn new(vocabulary: Arc<FeatureVocabulary>, positive_threshold: f32) -> Self {
        Self {
            vocabulary,
            positive_threshold,
        }
    }

    pub fn vocabulary(&self) -> &Arc<FeatureVocabulary> {
        &self.vocabulary
    }

    /// One encoded row per item in `universe`. Items without a feature row get a zero vector.
    pub fn item_profiles(&self, items: &[ItemFeatures], universe: &IdIndex) -> Result<LabeledMatrix> {
        let encoded = self.vocabulary.encode_matrix(items)?;
        encoded.reindex(universe, encoded.cols(), 0.0)
    }

    /// Each user's profile is the mean encoding of the items they rated above the
    /// positivity threshold. Positively rated items with no feature row are skipped;
    /// a user left with nothing gets the zero vector.
    pub fn user_profiles(
        &self,
        ratings: &[Rating],
        items: &[ItemFeatures],
        users: &IdIndex,
    ) -> Result<LabeledMatrix> {
        let width = self.vocabulary.width();
        let mut features_by_item: HashMap<&str, &ItemFeatures> = HashMap::new();
        for item in items {
            features_by_item.entry(item.item_id.as_str()).or_insert(item);
        }

        let mut liked: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for record in ratings.iter().filter(|r| r.is_positive(self.positive_threshold)) {
            if features_by_item.contains_key(record.item_id.as_str()) {
                liked
                    .entry(record.user_id.as_str())
                    .or_default()
                    .insert(record.item_id.as_str());
            }
        }

        let mut data = vec![0f32; users.len() * width];
        let mut with_history = 0usize;
        for (u, user) in users.labels().iter().enumerate() {
            let Some(item_ids) = liked.get(user.as_str()) else {
                continue;
            };
            let profile = &mut data[u * width..(u + 1) * width];
            for item_id in item_ids {
                let encoded = self.vocabulary.encode(features_by_item[item_id]);
                for (acc, value) in profile.iter_mut().zip(encoded) {
                    *acc += value;
                }
            }
            let n = item_ids.len() as f32;
            profile.iter_mut().for_each(|v| *v /= n);
            with_history += 1;
        }

        debug!(
            users = users.len(),
            with_history,
            width,
            "User profiles built"
        );
        LabeledMatrix::from_vec(users.clone(), self.vocabulary.column_index(), data)
    }

    /// Profiles for every user in `users` and for every item that is either rated or
    /// has a feature row.
    pub fn build(&self, ratings: &[Rating], items: &[ItemFeatures], users: &IdIndex) -> Result<ContentProfiles> {
        let item_universe = IdIndex::new(
            items
                .iter()
                .map(|item| &item.item_id)
                .chain(ratings.iter().map(|r| &r.item_id)),
        );
        Ok(ContentProfiles {
            users: self.user_profiles(ratings, items, users)?,
            items: self.item_profiles(items, &item_universe)?,
        })
    }
}
