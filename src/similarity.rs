use crate::error::Result;
use crate::matrix::LabeledMatrix;
use candle_core::Tensor;

/// Divides each row by its L2 norm. Zero rows stay zero instead of turning into NaN.
fn normalize_rows(values: &Tensor) -> Result<Tensor> {
    let (n_rows, _) = values.dims2()?;
    let norms = values.sqr()?.sum_keepdim(1)?.sqrt()?;
    let guarded: Vec<f32> = norms
        .flatten_all()?
        .to_vec1::<f32>()?
        .into_iter()
        .map(|norm| if norm > 0.0 { norm } else { 1.0 })
        .collect();
    let norms = Tensor::from_vec(guarded, (n_rows, 1), values.device())?;
    Ok(values.broadcast_div(&norms)?)
}

/// Cosine similarity between every row of `a` and every row of `b`.
///
/// Both matrices must share the same column space. The result is labelled with
/// `a`'s rows and `b`'s rows; a zero vector has similarity 0 with anything.
pub fn pairwise_cosine(a: &LabeledMatrix, b: &LabeledMatrix) -> Result<LabeledMatrix> {
    let (_, width_a) = a.shape();
    let (_, width_b) = b.shape();
    if width_a != width_b {
        return Err(candle_core::Error::Msg(format!(
            "cannot compare vectors of width {width_a} and {width_b}"
        ))
        .into());
    }
    if a.rows().is_empty() || b.rows().is_empty() || width_a == 0 {
        return LabeledMatrix::zeros(a.rows().clone(), b.rows().clone());
    }

    let a_unit = normalize_rows(a.values())?;
    let b_unit = normalize_rows(b.values())?;
    let sims = a_unit.matmul(&b_unit.t()?.contiguous()?)?;
    LabeledMatrix::new(a.rows().clone(), b.rows().clone(), sims)
}

/// Square row-row cosine similarity. Symmetric exactly, not just up to rounding.
pub fn cosine_similarity(matrix: &LabeledMatrix) -> Result<LabeledMatrix> {
    let sims = pairwise_cosine(matrix, matrix)?;
    if sims.is_empty() {
        return Ok(sims);
    }
    let values = sims.values();
    let symmetric = values.add(&values.t()?.contiguous()?)?.affine(0.5, 0.0)?;
    sims.with_values(symmetric)
}
