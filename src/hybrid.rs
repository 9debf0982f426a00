use crate::config::BlendWeights;
use crate::error::Result;
use crate::matrix::LabeledMatrix;

/// `w_cf · cf + w_cbf · cbf`, on the CF matrix's users and items. CBF cells the CF
/// universe has but `cbf` lacks count as 0.
pub fn blend(cf: &LabeledMatrix, cbf: Option<&LabeledMatrix>, weights: &BlendWeights) -> Result<LabeledMatrix> {
    weights.validate()?;
    let cf_part = cf.values().affine(weights.collaborative as f64, 0.0)?;
    let blended = match cbf {
        Some(cbf) if weights.uses_content() => {
            let aligned = cbf.reindex(cf.rows(), cf.cols(), 0.0)?;
            let cbf_part = aligned.values().affine(weights.content as f64, 0.0)?;
            cf_part.add(&cbf_part)?
        }
        _ => cf_part,
    };
    cf.with_values(blended)
}

/// Hybrid scores with the default 0.6 / 0.4 weights.
pub fn hybrid_scores(cf: &LabeledMatrix, cbf: &LabeledMatrix) -> Result<LabeledMatrix> {
    blend(cf, Some(cbf), &BlendWeights::default())
}
