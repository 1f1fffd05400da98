//! Similarity scoring between gold-standard and generated competency questions.
//!
//! Everything here is pure computation: no I/O, no network, no state kept
//! between calls.

mod aggregate;
mod cosine;
mod engine;
mod error;
mod jaccard;
mod matrix;
mod prompt;
mod segment;
mod tokenize;

pub use aggregate::{AggregateSummary, DEFAULT_TOP_N, LabelledPercentage};
pub use engine::{Mode, SimilarityOutcome, compute_similarity};
pub use matrix::SimilarityMatrix;
pub use prompt::ANALYSIS_SYSTEM_PROMPT;
