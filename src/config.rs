use crate::error::{RecError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub collaborative: f32,
    pub content: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.6,
            content: 0.4,
        }
    }
}

impl BlendWeights {
    /// Weights for a pipeline that ignores content features entirely.
    pub fn collaborative_only() -> Self {
        Self {
            collaborative: 1.0,
            content: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.collaborative < 0.0 || self.content < 0.0 {
            return Err(RecError::InvalidConfig(format!(
                "blend weights must be non-negative (got {} / {})",
                self.collaborative, self.content
            )));
        }
        let sum = self.collaborative + self.content;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(RecError::InvalidConfig(format!(
                "blend weights must sum to 1.0 (got {sum})"
            )));
        }
        Ok(())
    }

    pub fn uses_content(&self) -> bool {
        self.content > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub holdout_fraction: f32,
    pub k: usize,
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            k: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub weights: BlendWeights,
    /// A rating counts as a preference signal when strictly above this value.
    pub positive_threshold: f32,
    /// Upper bound of the CF score scale; rescaled CBF scores land in [0, cf_scale_upper].
    pub cf_scale_upper: f32,
    pub include_self_similarity: bool,
    pub evaluation: EvaluationConfig,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            weights: BlendWeights::default(),
            positive_threshold: 1.0,
            cf_scale_upper: 2.0,
            include_self_similarity: false,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl HybridConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json_string = std::fs::read_to_string(path)?;
        let config: HybridConfig = serde_json::from_str(json_string.as_str())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.cf_scale_upper > 0.0) {
            return Err(RecError::InvalidConfig(format!(
                "cf_scale_upper must be positive (got {})",
                self.cf_scale_upper
            )));
        }
        let fraction = self.evaluation.holdout_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(RecError::InvalidConfig(format!(
                "holdout_fraction must be in [0, 1) (got {fraction})"
            )));
        }
        if self.evaluation.k == 0 {
            return Err(RecError::InvalidConfig("k must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HybridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.weights.collaborative, 0.6);
        assert_eq!(config.weights.content, 0.4);
        assert_eq!(config.evaluation.k, 10);
        assert_eq!(config.evaluation.seed, 42);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = BlendWeights {
            collaborative: 0.5,
            content: 0.4,
        };
        assert!(matches!(weights.validate(), Err(RecError::InvalidConfig(_))));
        assert!(BlendWeights::collaborative_only().validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: HybridConfig =
            serde_json::from_str(r#"{"evaluation": {"k": 5}, "cf_scale_upper": 5.0}"#).unwrap();
        assert_eq!(config.evaluation.k, 5);
        assert_eq!(config.evaluation.seed, 42);
        assert_eq!(config.cf_scale_upper, 5.0);
        assert_eq!(config.weights, BlendWeights::default());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("hybrid-rec-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;

        let valid = dir.join("valid.json");
        std::fs::write(&valid, r#"{"weights": {"collaborative": 0.7, "content": 0.3}, "evaluation": {"seed": 7}}"#)?;
        let config = HybridConfig::load(&valid)?;
        assert_eq!(config.weights.collaborative, 0.7);
        assert_eq!(config.evaluation.seed, 7);
        assert_eq!(config.evaluation.k, 10);

        let invalid = dir.join("invalid.json");
        std::fs::write(&invalid, r#"{"weights": {"collaborative": 0.7, "content": 0.7}}"#)?;
        assert!(matches!(HybridConfig::load(&invalid), Err(RecError::InvalidConfig(_))));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_rejects_bad_holdout_fraction() {
        let mut config = HybridConfig::default();
        config.evaluation.holdout_fraction = 1.0;
        assert!(config.validate().is_err());
    }
}
