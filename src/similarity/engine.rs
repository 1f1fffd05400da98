use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use super::aggregate::{
    AggregateSummary, SimilarityRecord, flatten_records, rank_records, summarize_records,
};
use super::cosine::cosine_matrix;
use super::error::SimilarityError;
use super::jaccard::jaccard_matrix;
use super::matrix::SimilarityMatrix;
use super::prompt::build_analysis_prompt;
use super::segment::segment_statements;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Cosine,
    Jaccard,
    Llm,
    All,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Jaccard => "jaccard",
            Self::Llm => "llm",
            Self::All => "all",
        }
    }

    pub fn includes_cosine(self) -> bool {
        matches!(self, Self::Cosine | Self::All)
    }

    pub fn includes_jaccard(self) -> bool {
        matches!(self, Self::Jaccard | Self::All)
    }

    pub fn includes_llm(self) -> bool {
        matches!(self, Self::Llm | Self::All)
    }
}

impl FromStr for Mode {
    type Err = SimilarityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "jaccard" => Ok(Self::Jaccard),
            "llm" => Ok(Self::Llm),
            "all" => Ok(Self::All),
            _ => Err(SimilarityError::UnknownMode(value.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one comparison produces. Matrices and the ranked selection are
/// only present when the mode surfaces them; the summary always is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityOutcome {
    pub mode: Mode,
    pub gold_statements: Vec<String>,
    pub generated_statements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cosine_matrix: Option<SimilarityMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jaccard_matrix: Option<SimilarityMatrix>,
    pub summary: AggregateSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked_selection: Option<Vec<SimilarityRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_prompt: Option<String>,
    pub degenerate_vocabulary: bool,
}

pub fn compute_similarity(
    gold_text: &str,
    generated_text: &str,
    mode: Mode,
    top_n: usize,
) -> Result<SimilarityOutcome, SimilarityError> {
    let gold = segment_statements(gold_text);
    if gold.is_empty() {
        return Err(SimilarityError::InvalidInput(
            "gold standard text contains no statements".to_string(),
        ));
    }

    let generated = segment_statements(generated_text);
    if generated.is_empty() {
        return Err(SimilarityError::InvalidInput(
            "generated text contains no statements".to_string(),
        ));
    }

    let (cosine, degenerate_vocabulary) = cosine_matrix(&generated, &gold);
    if degenerate_vocabulary {
        warn!(
            gold = gold.len(),
            generated = generated.len(),
            "empty vocabulary across both statement sets; cosine scores are zero"
        );
    }
    let jaccard = jaccard_matrix(&generated, &gold);

    let records = flatten_records(&generated, &gold, &cosine, &jaccard);
    let summary = summarize_records(&records)?;

    debug!(
        mode = %mode,
        gold = gold.len(),
        generated = generated.len(),
        mean_cosine = summary.mean_cosine,
        max_cosine = summary.max_cosine,
        mean_jaccard = summary.mean_jaccard,
        "computed similarity"
    );

    let (ranked_selection, analysis_prompt) = if mode.includes_llm() {
        let selection = rank_records(&records, top_n);
        let prompt = build_analysis_prompt(&summary, &selection);
        (Some(selection), Some(prompt))
    } else {
        (None, None)
    };

    Ok(SimilarityOutcome {
        mode,
        gold_statements: gold,
        generated_statements: generated,
        cosine_matrix: mode.includes_cosine().then_some(cosine),
        jaccard_matrix: mode.includes_jaccard().then_some(jaccard),
        summary,
        ranked_selection,
        analysis_prompt,
        degenerate_vocabulary,
    })
}
