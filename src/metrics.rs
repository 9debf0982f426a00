use crate::error::Result;
use candle_core::{Device, Tensor};
use std::collections::HashSet;

/// Root-mean-square error, or `None` when there is nothing to compare.
pub fn rmse(labels: &[f32], predictions: &[f32]) -> Result<Option<f32>> {
    if labels.is_empty() || labels.len() != predictions.len() {
        return Ok(None);
    }
    let labels = Tensor::new(labels, &Device::Cpu)?;
    let predictions = Tensor::new(predictions, &Device::Cpu)?;
    let mse = (labels - predictions)?.sqr()?.mean_all()?;
    Ok(Some(mse.sqrt()?.to_scalar::<f32>()?))
}

/// Hits among the first `k` recommendations, divided by `k` (not by how many were
/// actually recommended).
pub fn precision_at_k(recommended: &[String], relevant: &HashSet<&str>, k: usize) -> f32 {
    if k == 0 {
        return 0.0;
    }
    let hits = recommended
        .iter()
        .take(k)
        .filter(|item| relevant.contains(item.as_str()))
        .count();
    hits as f32 / k as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_precision() {
        let predictions = ids(&["1", "2", "3"]);
        let labels: HashSet<&str> = ["3", "5"].into_iter().collect();

        let actual = precision_at_k(&predictions, &labels, 3);
        assert_eq!(actual, 1.0 / 3.0);
    }

    #[test]
    fn test_precision_divides_by_k() {
        let predictions = ids(&["3", "5"]);
        let labels: HashSet<&str> = ["3", "5"].into_iter().collect();
        assert_eq!(precision_at_k(&predictions, &labels, 10), 0.2);
    }

    #[test]
    fn test_precision_when_prediction_is_nothing() {
        let labels: HashSet<&str> = ["3", "5"].into_iter().collect();
        assert_eq!(precision_at_k(&[], &labels, 10), 0.0);
    }

    #[test]
    fn test_rmse() -> Result<()> {
        let actual = rmse(&[1.0, 2.0, 3.0], &[1.0, 1.0, 2.0])?.unwrap();
        let expected = (2.0f32 / 3.0).sqrt();
        assert!((actual - expected).abs() <= 0.0001);
        Ok(())
    }

    #[test]
    fn test_rmse_without_predictions() -> Result<()> {
        assert_eq!(rmse(&[], &[])?, None);
        Ok(())
    }
}
