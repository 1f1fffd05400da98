use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::heatmap::{HeatmapMetric, write_heatmap};
use crate::input::format_labelled_input;
use crate::llm::TextGenerator;
use crate::report::ComparisonArtifacts;
use crate::similarity::{Mode, SimilarityOutcome, compute_similarity};

/// Collaborators wired around one comparison.
pub(crate) struct PairContext<'a> {
    pub(crate) mode: Mode,
    pub(crate) top_n: usize,
    pub(crate) heatmap_folder: Option<&'a Path>,
    pub(crate) generator: Option<&'a dyn TextGenerator>,
}

/// Scores one pair, then runs the side effects its mode asks for. Similarity
/// and heatmap failures are errors; a failed analysis call is kept on the
/// artifacts so the scores survive.
pub(crate) fn evaluate_pair(
    gold_text: &str,
    generated_text: &str,
    context: &PairContext<'_>,
) -> Result<(SimilarityOutcome, ComparisonArtifacts)> {
    let outcome = compute_similarity(gold_text, generated_text, context.mode, context.top_n)?;
    let mut artifacts = ComparisonArtifacts::default();

    if let Some(folder) = context.heatmap_folder {
        let input_text = format_labelled_input(gold_text, generated_text);
        if let Some(matrix) = &outcome.cosine_matrix {
            artifacts.cosine_heatmap =
                Some(write_heatmap(matrix, HeatmapMetric::Cosine, folder, &input_text)?);
        }
        if let Some(matrix) = &outcome.jaccard_matrix {
            artifacts.jaccard_heatmap =
                Some(write_heatmap(matrix, HeatmapMetric::Jaccard, folder, &input_text)?);
        }
    }

    if let Some(prompt) = &outcome.analysis_prompt {
        match context.generator {
            Some(generator) => match generator.generate(prompt) {
                Ok(analysis) => artifacts.analysis = Some(analysis),
                Err(err) => {
                    warn!(error = %err, "LLM analysis failed");
                    artifacts.analysis_error = Some(format!("LLM analysis failed: {err:#}"));
                }
            },
            None => warn!("no LLM API key configured; skipping analysis"),
        }
    }

    Ok((outcome, artifacts))
}
