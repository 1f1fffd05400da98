use super::matrix::SimilarityMatrix;
use super::tokenize::token_set;

pub fn jaccard_similarity(left: &str, right: &str) -> f64 {
    let left = token_set(left);
    let right = token_set(right);

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

/// Statement-level word-set Jaccard for every (generated, gold) pair.
pub fn jaccard_matrix(generated: &[String], gold: &[String]) -> SimilarityMatrix {
    SimilarityMatrix::from_fn(generated.len(), gold.len(), |row, col| {
        jaccard_similarity(&generated[row], &gold[col])
    })
}
