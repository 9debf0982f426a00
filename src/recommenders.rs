use crate::datasets::compare_ids;
use crate::error::Result;
use crate::matrix::LabeledMatrix;
use crate::types::Candidate;

pub trait Recommender {
    fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Candidate>>;
}

/// The `n` highest-scoring items for `user_id`, best first. Ties go to the smaller
/// item id, in [`compare_ids`] order.
pub fn top_n(scores: &LabeledMatrix, user_id: &str, n: usize) -> Result<Vec<Candidate>> {
    let row = scores.row(user_id)?;
    let mut results: Vec<Candidate> = row
        .into_iter()
        .zip(scores.cols().labels())
        .map(|(score, item_id)| Candidate {
            item_id: item_id.clone(),
            score,
        })
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| compare_ids(&a.item_id, &b.item_id)));
    results.truncate(n);
    Ok(results)
}

/// Ranks straight off a precomputed score matrix.
pub struct MatrixRecommender {
    pub scores: LabeledMatrix,
}

impl Recommender for MatrixRecommender {
    fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Candidate>> {
        top_n(&self.scores, user_id, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::IdIndex;
    use crate::error::RecError;
    use proptest::prelude::*;

    fn scores() -> LabeledMatrix {
        LabeledMatrix::from_vec(
            IdIndex::from_labels(&["u1", "u2"]),
            IdIndex::from_labels(&["1", "2", "3", "4"]),
            vec![0.5, 1.5, 0.5, 1.0, 0.0, 0.0, 0.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_ranking_recommender() {
        let recommender = MatrixRecommender { scores: scores() };
        let actual = recommender.recommend("u1", 10).unwrap();
        let actual: Vec<String> = actual.iter().map(|x| x.item_id.clone()).collect();
        let expected = vec!["2".to_string(), "4".to_string(), "1".to_string(), "3".to_string()];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_top_n_truncates() -> Result<()> {
        let actual = top_n(&scores(), "u2", 2)?;
        assert_eq!(actual.len(), 2);
        assert_eq!(actual[0], Candidate { item_id: "4".to_string(), score: 2.0 });
        assert_eq!(actual[1].item_id, "1");
        Ok(())
    }

    #[test]
    fn test_top_n_unknown_user() {
        let result = top_n(&scores(), "u9", 3);
        assert!(matches!(result, Err(RecError::UserNotFound(id)) if id == "u9"));
    }

    #[test]
    fn test_ties_break_on_numeric_item_order() -> Result<()> {
        let scores = LabeledMatrix::from_vec(
            IdIndex::from_labels(&["u1"]),
            IdIndex::from_labels(&["100", "99", "7"]),
            vec![1.0, 1.0, 0.5],
        )?;
        let ranked: Vec<String> = top_n(&scores, "u1", 3)?.into_iter().map(|c| c.item_id).collect();
        assert_eq!(ranked, vec!["99", "100", "7"]);
        Ok(())
    }

    #[test]
    fn test_top_n_zero() -> Result<()> {
        assert!(top_n(&scores(), "u1", 0)?.is_empty());
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_top_n_is_sorted_and_sized(
            data in proptest::collection::vec(0u8..4, 5),
            n in 0usize..8
        ) {
            let cols = ["a", "b", "c", "d", "e"];
            let matrix = LabeledMatrix::from_vec(
                IdIndex::from_labels(&["u"]),
                IdIndex::from_labels(&cols),
                data.iter().map(|&v| v as f32).collect(),
            ).unwrap();
            let ranked = top_n(&matrix, "u", n).unwrap();
            prop_assert_eq!(ranked.len(), n.min(cols.len()));
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(compare_ids(&pair[0].item_id, &pair[1].item_id) == std::cmp::Ordering::Less);
                }
            }
        }
    }
}
