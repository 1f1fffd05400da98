use serde::Serialize;

use super::error::SimilarityError;
use super::matrix::SimilarityMatrix;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRecord {
    pub generated: String,
    pub gold: String,
    pub cosine: f64,
    pub jaccard: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub mean_cosine: f64,
    pub max_cosine: f64,
    pub mean_jaccard: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledPercentage {
    pub label: &'static str,
    pub percentage: f64,
}

impl AggregateSummary {
    /// Summary scores as human-readable labels mapped to percentages.
    pub fn percentages(&self) -> Vec<LabelledPercentage> {
        vec![
            LabelledPercentage {
                label: "Average Cosine Similarity",
                percentage: self.mean_cosine * 100.0,
            },
            LabelledPercentage {
                label: "Max Cosine Similarity",
                percentage: self.max_cosine * 100.0,
            },
            LabelledPercentage {
                label: "Average Jaccard Similarity",
                percentage: self.mean_jaccard * 100.0,
            },
        ]
    }
}

/// Flattens the two matrices into records, generated index outer and gold
/// index inner.
pub fn flatten_records(
    generated: &[String],
    gold: &[String],
    cosine: &SimilarityMatrix,
    jaccard: &SimilarityMatrix,
) -> Vec<SimilarityRecord> {
    let mut records = Vec::with_capacity(generated.len() * gold.len());
    for (row, generated_statement) in generated.iter().enumerate() {
        for (col, gold_statement) in gold.iter().enumerate() {
            records.push(SimilarityRecord {
                generated: generated_statement.clone(),
                gold: gold_statement.clone(),
                cosine: cosine.get(row, col),
                jaccard: jaccard.get(row, col),
            });
        }
    }
    records
}

pub fn summarize_records(records: &[SimilarityRecord]) -> Result<AggregateSummary, SimilarityError> {
    if records.is_empty() {
        return Err(SimilarityError::InvalidInput(
            "cannot aggregate an empty set of similarity records".to_string(),
        ));
    }

    let count = records.len() as f64;
    let cosine_total = records.iter().map(|record| record.cosine).sum::<f64>();
    let jaccard_total = records.iter().map(|record| record.jaccard).sum::<f64>();
    let max_cosine = records
        .iter()
        .map(|record| record.cosine)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(AggregateSummary {
        mean_cosine: cosine_total / count,
        max_cosine,
        mean_jaccard: jaccard_total / count,
    })
}

/// Top `top_n` records by descending cosine. The sort is stable, so ties keep
/// their flattening order.
pub fn rank_records(records: &[SimilarityRecord], top_n: usize) -> Vec<SimilarityRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|left, right| right.cosine.total_cmp(&left.cosine));
    ranked.truncate(top_n);
    ranked
}
