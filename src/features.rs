use crate::datasets::IdIndex;
use crate::error::{RecError, Result};
use crate::matrix::LabeledMatrix;
use crate::types::{ItemFeatures, UNKNOWN_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Price,
    Alcohol,
    Ambience,
    Cuisine,
}

impl Feature {
    pub const ALL: [Feature; 4] = [Feature::Price, Feature::Alcohol, Feature::Ambience, Feature::Cuisine];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Price => "price",
            Feature::Alcohol => "alcohol",
            Feature::Ambience => "Rambience",
            Feature::Cuisine => "Rcuisine",
        }
    }

    /// The row's value for this feature, with missing values mapped to `Unknown`.
    pub fn value<'a>(&self, row: &'a ItemFeatures) -> &'a str {
        let value = match self {
            Feature::Price => row.price.as_deref(),
            Feature::Alcohol => row.alcohol.as_deref(),
            Feature::Ambience => row.ambience.as_deref(),
            Feature::Cuisine => row.cuisine.as_deref(),
        };
        value.unwrap_or(UNKNOWN_CATEGORY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FeatureColumns {
    feature: Feature,
    /// Sorted categories seen at fit time.
    categories: Vec<String>,
    offset: usize,
}

/// A fitted one-hot vocabulary. Width and column order are frozen at fit time, and
/// the same vocabulary encodes both items and users so their vectors are comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVocabulary {
    columns: Vec<FeatureColumns>,
    width: usize,
}

impl FeatureVocabulary {
    pub fn fit(rows: &[ItemFeatures], features: &[Feature]) -> Result<Self> {
        if rows.is_empty() {
            return Err(RecError::EmptyInput("item features"));
        }
        let mut columns = Vec::with_capacity(features.len());
        let mut offset = 0;
        for &feature in features {
            let categories: BTreeSet<&str> = rows.iter().map(|row| feature.value(row)).collect();
            let categories: Vec<String> = categories.into_iter().map(str::to_string).collect();
            let n_categories = categories.len();
            columns.push(FeatureColumns {
                feature,
                categories,
                offset,
            });
            offset += n_categories;
        }
        debug!(features = features.len(), width = offset, "Feature vocabulary fitted");
        Ok(Self { columns, width: offset })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `feature=category` names in encoded column order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |category| format!("{}={}", c.feature.name(), category))
            })
            .collect()
    }

    /// Column index for the names returned by [`Self::column_names`].
    ///
    /// Names are zero-padded by position so the sorted index keeps encoder order.
    pub fn column_index(&self) -> IdIndex {
        let names: Vec<String> = self
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| format!("{idx:05}:{name}"))
            .collect();
        IdIndex::from_labels(&names)
    }

    /// One-hot encodes a row. Categories not seen at fit time contribute nothing.
    pub fn encode(&self, row: &ItemFeatures) -> Vec<f32> {
        let mut vector = vec![0f32; self.width];
        for column in &self.columns {
            let value = column.feature.value(row);
            if let Ok(pos) = column.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                vector[column.offset + pos] = 1.0;
            }
        }
        vector
    }

    pub fn encode_all(&self, rows: &[ItemFeatures]) -> Vec<Vec<f32>> {
        rows.iter().map(|row| self.encode(row)).collect()
    }

    /// Encodes rows into a matrix labelled by item id. Later duplicates of an id are ignored.
    pub fn encode_matrix(&self, rows: &[ItemFeatures]) -> Result<LabeledMatrix> {
        let index = IdIndex::new(rows.iter().map(|r| &r.item_id));
        let mut data = vec![0f32; index.len() * self.width];
        let mut filled = vec![false; index.len()];
        for row in rows {
            if let Some(r) = index.encode(&row.item_id) {
                if !filled[r] {
                    data[r * self.width..(r + 1) * self.width].copy_from_slice(&self.encode(row));
                    filled[r] = true;
                }
            }
        }
        LabeledMatrix::from_vec(index, self.column_index(), data)
    }
}

pub fn fit_encoder(item_features: &[ItemFeatures]) -> Result<FeatureVocabulary> {
    FeatureVocabulary::fit(item_features, &Feature::ALL)
}

pub fn encode(encoder: &FeatureVocabulary, rows: &[ItemFeatures]) -> Vec<Vec<f32>> {
    encoder.encode_all(rows)
}
