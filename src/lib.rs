//! Hybrid restaurant recommender: user-user collaborative filtering blended with
//! content-based scores over categorical item features, plus offline evaluation.
//!
//! Every stage is a batch recompute over dense [`LabeledMatrix`] values; a
//! [`Snapshot`] holds the full set of matrices for one load of the data.

pub mod collaborative;
pub mod config;
pub mod content;
pub mod datasets;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod hybrid;
pub mod matrix;
pub mod metrics;
pub mod profiles;
pub mod recommenders;
pub mod similarity;
pub mod snapshot;
pub mod types;

pub use collaborative::{cf_scores, CollaborativeScorer};
pub use config::{BlendWeights, EvaluationConfig, HybridConfig};
pub use content::{content_scores, ContentScorer};
pub use datasets::{Dataset, IdIndex};
pub use error::{RecError, Result};
pub use evaluation::{evaluate, EvaluationReport, Evaluator};
pub use features::{encode, fit_encoder, Feature, FeatureVocabulary};
pub use hybrid::{blend, hybrid_scores};
pub use matrix::{build_interaction_matrix, LabeledMatrix};
pub use profiles::{ContentProfileBuilder, ContentProfiles};
pub use recommenders::{top_n, Recommender};
pub use similarity::{cosine_similarity, pairwise_cosine};
pub use snapshot::{Snapshot, SnapshotLoader};
pub use types::{Candidate, ItemFeatures, Rating};
