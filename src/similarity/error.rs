use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown mode '{0}' (expected one of: cosine, jaccard, llm, all)")]
    UnknownMode(String),
}
