use crate::datasets::IdIndex;
use crate::error::{RecError, Result};
use crate::types::Rating;
use candle_core::{DType, Device, Tensor};
use std::collections::HashMap;
use tracing::debug;

/// A dense f32 matrix with labelled rows and columns.
///
/// Matrices are never mutated after construction; every transformation returns a
/// new one.
#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    rows: IdIndex,
    cols: IdIndex,
    values: Tensor,
}

impl LabeledMatrix {
    pub fn new(rows: IdIndex, cols: IdIndex, values: Tensor) -> Result<Self> {
        let (n_rows, n_cols) = values.dims2()?;
        if n_rows != rows.len() || n_cols != cols.len() {
            return Err(candle_core::Error::Msg(format!(
                "matrix shape ({n_rows}, {n_cols}) does not match labels ({}, {})",
                rows.len(),
                cols.len()
            ))
            .into());
        }
        let values = values.to_dtype(DType::F32)?;
        Ok(Self { rows, cols, values })
    }

    /// Builds a matrix from row-major data.
    pub fn from_vec(rows: IdIndex, cols: IdIndex, data: Vec<f32>) -> Result<Self> {
        let shape = (rows.len(), cols.len());
        let values = Tensor::from_vec(data, shape, &Device::Cpu)?;
        Self::new(rows, cols, values)
    }

    pub fn zeros(rows: IdIndex, cols: IdIndex) -> Result<Self> {
        let values = Tensor::zeros((rows.len(), cols.len()), DType::F32, &Device::Cpu)?;
        Ok(Self { rows, cols, values })
    }

    pub fn rows(&self) -> &IdIndex {
        &self.rows
    }

    pub fn cols(&self) -> &IdIndex {
        &self.cols
    }

    pub fn values(&self) -> &Tensor {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Same labels, new values.
    pub fn with_values(&self, values: Tensor) -> Result<Self> {
        Self::new(self.rows.clone(), self.cols.clone(), values)
    }

    pub fn get(&self, row: &str, col: &str) -> Result<f32> {
        let r = self
            .rows
            .encode(row)
            .ok_or_else(|| RecError::UserNotFound(row.to_string()))?;
        let c = self
            .cols
            .encode(col)
            .ok_or_else(|| RecError::ItemNotFound(col.to_string()))?;
        Ok(self.values.get(r)?.get(c)?.to_scalar::<f32>()?)
    }

    pub fn row(&self, row: &str) -> Result<Vec<f32>> {
        let r = self
            .rows
            .encode(row)
            .ok_or_else(|| RecError::UserNotFound(row.to_string()))?;
        Ok(self.values.get(r)?.to_vec1::<f32>()?)
    }

    pub fn to_vec2(&self) -> Result<Vec<Vec<f32>>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.values.to_vec2::<f32>()?)
    }

    /// Projects this matrix onto another label universe. Cells whose row or column
    /// is absent here take `fill`.
    pub fn reindex(&self, rows: &IdIndex, cols: &IdIndex, fill: f32) -> Result<Self> {
        let source = self.to_vec2()?;
        let col_map: Vec<Option<usize>> = cols.labels().iter().map(|c| self.cols.encode(c)).collect();

        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for row in rows.labels() {
            match self.rows.encode(row) {
                Some(r) => data.extend(col_map.iter().map(|c| c.map_or(fill, |c| source[r][c]))),
                None => data.extend(std::iter::repeat(fill).take(cols.len())),
            }
        }
        Self::from_vec(rows.clone(), cols.clone(), data)
    }
}

/// Pivots ratings into a dense user×item matrix. Unobserved pairs are 0, which is
/// indistinguishable from an observed rating of 0. Repeated (user, item) pairs are
/// averaged.
pub fn build_interaction_matrix(ratings: &[Rating]) -> Result<LabeledMatrix> {
    if ratings.is_empty() {
        return Err(RecError::EmptyInput("ratings"));
    }
    let users = IdIndex::new(ratings.iter().map(|r| &r.user_id));
    let items = IdIndex::new(ratings.iter().map(|r| &r.item_id));

    let mut cells: HashMap<(usize, usize), (f32, usize)> = HashMap::new();
    for record in ratings {
        if let (Some(u), Some(i)) = (users.encode(&record.user_id), items.encode(&record.item_id)) {
            let cell = cells.entry((u, i)).or_insert((0.0, 0));
            cell.0 += record.rating;
            cell.1 += 1;
        }
    }

    let n_items = items.len();
    let mut data = vec![0f32; users.len() * n_items];
    for ((u, i), (sum, count)) in cells {
        data[u * n_items + i] = sum / count as f32;
    }

    debug!(users = users.len(), items = n_items, "Interaction matrix built");
    LabeledMatrix::from_vec(users, items, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario() -> Vec<Rating> {
        vec![
            Rating::new("u1", "i1", 2.0),
            Rating::new("u1", "i2", 0.0),
            Rating::new("u2", "i1", 1.0),
            Rating::new("u2", "i2", 2.0),
        ]
    }

    #[test]
    fn test_build_interaction_matrix() -> Result<()> {
        let matrix = build_interaction_matrix(&scenario())?;
        assert_eq!(matrix.rows().labels(), &["u1", "u2"]);
        assert_eq!(matrix.cols().labels(), &["i1", "i2"]);
        assert_eq!(matrix.to_vec2()?, vec![vec![2.0, 0.0], vec![1.0, 2.0]]);
        Ok(())
    }

    #[test]
    fn test_unobserved_and_zero_ratings_are_both_zero() -> Result<()> {
        let ratings = vec![
            Rating::new("u1", "i1", 0.0),
            Rating::new("u2", "i2", 1.0),
        ];
        let matrix = build_interaction_matrix(&ratings)?;
        assert_eq!(matrix.get("u1", "i1")?, 0.0);
        assert_eq!(matrix.get("u1", "i2")?, 0.0);
        Ok(())
    }

    #[test]
    fn test_duplicate_pairs_are_averaged() -> Result<()> {
        let ratings = vec![
            Rating::new("u1", "i1", 2.0),
            Rating::new("u1", "i1", 1.0),
        ];
        let matrix = build_interaction_matrix(&ratings)?;
        assert_eq!(matrix.get("u1", "i1")?, 1.5);
        Ok(())
    }

    #[test]
    fn test_empty_ratings_fail() {
        let result = build_interaction_matrix(&[]);
        assert!(matches!(result, Err(RecError::EmptyInput(_))));
    }

    #[test]
    fn test_lookup_misses() -> Result<()> {
        let matrix = build_interaction_matrix(&scenario())?;
        assert!(matches!(matrix.get("u9", "i1"), Err(RecError::UserNotFound(_))));
        assert!(matches!(matrix.get("u1", "i9"), Err(RecError::ItemNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_reindex_fills_missing() -> Result<()> {
        let matrix = build_interaction_matrix(&scenario())?;
        let rows = IdIndex::from_labels(&["u2", "u3"]);
        let cols = IdIndex::from_labels(&["i0", "i2"]);
        let reindexed = matrix.reindex(&rows, &cols, 0.0)?;
        assert_eq!(reindexed.to_vec2()?, vec![vec![0.0, 2.0], vec![0.0, 0.0]]);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_cells_match_ratings(
            pairs in proptest::collection::btree_map((0u8..6, 0u8..6), 0u8..3, 1..30)
        ) {
            let ratings: Vec<Rating> = pairs
                .iter()
                .map(|(&(u, i), &r)| Rating::new(&format!("u{u}"), &format!("i{i}"), r as f32))
                .collect();
            let matrix = build_interaction_matrix(&ratings).unwrap();
            for user in matrix.rows().labels() {
                for item in matrix.cols().labels() {
                    let expected = ratings
                        .iter()
                        .find(|r| &r.user_id == user && &r.item_id == item)
                        .map_or(0.0, |r| r.rating);
                    prop_assert_eq!(matrix.get(user, item).unwrap(), expected);
                }
            }
        }
    }
}
