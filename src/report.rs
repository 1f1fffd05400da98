use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::similarity::{AggregateSummary, LabelledPercentage, Mode, SimilarityOutcome};
use crate::util::ensure_directory;

/// Artifacts produced around one comparison by the collaborators.
#[derive(Debug, Clone, Default)]
pub struct ComparisonArtifacts {
    pub analysis: Option<String>,
    pub cosine_heatmap: Option<PathBuf>,
    pub jaccard_heatmap: Option<PathBuf>,
    pub analysis_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub generated_at: String,
    pub input_hash: String,
    #[serde(flatten)]
    pub outcome: &'a SimilarityOutcome,
    pub percentages: Vec<LabelledPercentage>,
    pub llm_analysis: Option<String>,
    pub cosine_heatmap: Option<String>,
    pub jaccard_heatmap: Option<String>,
}

/// Header of the batch result file, in `ValidationResultRow` field order.
pub const RESULT_COLUMNS: [&str; 9] = [
    "Gold Standard",
    "Generated",
    "Average Cosine Similarity",
    "Max Cosine Similarity",
    "Average Jaccard Similarity",
    "Cosine Heatmap",
    "Jaccard Heatmap",
    "LLM Analysis",
    "Error",
];

/// One row of the batch result file. Field names double as CSV headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResultRow {
    #[serde(rename = "Gold Standard")]
    pub gold_standard: String,
    #[serde(rename = "Generated")]
    pub generated: String,
    #[serde(rename = "Average Cosine Similarity")]
    pub average_cosine_similarity: Option<f64>,
    #[serde(rename = "Max Cosine Similarity")]
    pub max_cosine_similarity: Option<f64>,
    #[serde(rename = "Average Jaccard Similarity")]
    pub average_jaccard_similarity: Option<f64>,
    #[serde(rename = "Cosine Heatmap")]
    pub cosine_heatmap: Option<String>,
    #[serde(rename = "Jaccard Heatmap")]
    pub jaccard_heatmap: Option<String>,
    #[serde(rename = "LLM Analysis")]
    pub llm_analysis: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl ValidationResultRow {
    pub fn from_outcome(
        gold_standard: &str,
        generated: &str,
        outcome: &SimilarityOutcome,
        artifacts: ComparisonArtifacts,
    ) -> Self {
        let summary = outcome.summary;
        let mode = outcome.mode;
        Self {
            gold_standard: gold_standard.to_string(),
            generated: generated.to_string(),
            average_cosine_similarity: (mode.includes_cosine()).then_some(summary.mean_cosine),
            max_cosine_similarity: (mode.includes_cosine()).then_some(summary.max_cosine),
            average_jaccard_similarity: (mode.includes_jaccard()).then_some(summary.mean_jaccard),
            cosine_heatmap: display_path(artifacts.cosine_heatmap.as_deref()),
            jaccard_heatmap: display_path(artifacts.jaccard_heatmap.as_deref()),
            llm_analysis: artifacts.analysis.map(|text| remove_html_tags(&text)),
            error: artifacts.analysis_error,
        }
    }

    pub fn failed(gold_standard: &str, generated: &str, error: String) -> Self {
        Self {
            gold_standard: gold_standard.to_string(),
            generated: generated.to_string(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn remove_html_tags(text: &str) -> String {
    match Regex::new(r"<[^>]+>") {
        Ok(pattern) => pattern.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|value| value.display().to_string())
}

fn path_or_na(path: Option<&Path>) -> String {
    display_path(path).unwrap_or_else(|| "N/A".to_string())
}

fn cosine_section(summary: &AggregateSummary, heatmap: Option<&Path>) -> String {
    format!(
        "<h2>Cosine Similarity Metrics</h2><p>Average cosine: {:.2}, Max cosine: {:.2}</p><p>Cosine heatmap saved to: {}</p>",
        summary.mean_cosine,
        summary.max_cosine,
        path_or_na(heatmap)
    )
}

fn jaccard_section(summary: &AggregateSummary, heatmap: Option<&Path>) -> String {
    format!(
        "<h2>Jaccard Similarity Metrics</h2><p>Average jaccard: {:.2}</p><p>Jaccard heatmap saved to: {}</p>",
        summary.mean_jaccard,
        path_or_na(heatmap)
    )
}

fn analysis_section(analysis: Option<&str>) -> String {
    format!(
        "<h2>LLM Analysis</h2><p>{}</p>",
        analysis.unwrap_or("N/A")
    )
}

/// HTML fragment with the sections the comparison mode asks for.
pub fn render_html(outcome: &SimilarityOutcome, artifacts: &ComparisonArtifacts) -> String {
    let summary = &outcome.summary;
    let cosine_heatmap = artifacts.cosine_heatmap.as_deref();
    let jaccard_heatmap = artifacts.jaccard_heatmap.as_deref();
    let analysis = artifacts.analysis.as_deref();

    match outcome.mode {
        Mode::Llm => format!("<div>{}</div>", analysis_section(analysis)),
        Mode::Cosine => format!("<div>{}</div>", cosine_section(summary, cosine_heatmap)),
        Mode::Jaccard => format!("<div>{}</div>", jaccard_section(summary, jaccard_heatmap)),
        Mode::All => format!(
            "<div style=\"font-family: monospace; white-space: pre-wrap;\">\n{}\n{}\n{}\n</div>",
            analysis_section(analysis),
            cosine_section(summary, cosine_heatmap),
            jaccard_section(summary, jaccard_heatmap)
        ),
    }
}

pub fn write_results_csv(path: &Path, rows: &[ValidationResultRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create results csv: {}", path.display()))?;
    // serialize() only emits the header alongside the first row
    if rows.is_empty() {
        writer
            .write_record(RESULT_COLUMNS)
            .with_context(|| format!("failed to write results header: {}", path.display()))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write results row: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush results csv: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{
        ComparisonArtifacts, RESULT_COLUMNS, ValidationResultRow, remove_html_tags, render_html,
        write_results_csv,
    };
    use crate::similarity::{DEFAULT_TOP_N, Mode, compute_similarity};

    #[test]
    fn strips_html_tags() {
        assert_eq!(
            remove_html_tags("<div><h2>LLM Analysis</h2><p>Pairs <b>match</b>.</p></div>"),
            "LLM AnalysisPairs match."
        );
    }

    #[test]
    fn html_for_cosine_mode_reports_metrics_and_missing_heatmap() {
        let outcome = compute_similarity("What is X?", "What is X?", Mode::Cosine, DEFAULT_TOP_N)
            .expect("comparison should succeed");
        let html = render_html(&outcome, &ComparisonArtifacts::default());
        assert!(html.contains("Average cosine: 1.00, Max cosine: 1.00"), "{html}");
        assert!(html.contains("Cosine heatmap saved to: N/A"), "{html}");
        assert!(!html.contains("Jaccard"));
    }

    #[test]
    fn html_for_all_mode_has_every_section() {
        let outcome = compute_similarity("What is X?", "What is Y?", Mode::All, DEFAULT_TOP_N)
            .expect("comparison should succeed");
        let artifacts = ComparisonArtifacts {
            analysis: Some("Looks close.".to_string()),
            cosine_heatmap: Some(PathBuf::from("heatmaps/cosine.svg")),
            jaccard_heatmap: None,
            analysis_error: None,
        };
        let html = render_html(&outcome, &artifacts);
        assert!(html.contains("<h2>LLM Analysis</h2><p>Looks close.</p>"));
        assert!(html.contains("Cosine heatmap saved to: heatmaps/cosine.svg"));
        assert!(html.contains("Average jaccard: 0.50"));
        assert!(html.contains("Jaccard heatmap saved to: N/A"));
    }

    #[test]
    fn result_row_only_carries_metrics_of_its_mode() {
        let outcome = compute_similarity("What is X?", "What is X?", Mode::Jaccard, DEFAULT_TOP_N)
            .expect("comparison should succeed");
        let row = ValidationResultRow::from_outcome(
            "What is X?",
            "What is X?",
            &outcome,
            ComparisonArtifacts::default(),
        );
        assert_eq!(row.average_cosine_similarity, None);
        assert_eq!(row.average_jaccard_similarity, Some(1.0));
        assert!(!row.is_error());
    }

    #[test]
    fn results_csv_has_expected_headers_and_error_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results").join("validation_results.csv");
        let rows = vec![
            ValidationResultRow {
                gold_standard: "What is X?".to_string(),
                generated: "What is X?".to_string(),
                average_cosine_similarity: Some(1.0),
                max_cosine_similarity: Some(1.0),
                average_jaccard_similarity: Some(1.0),
                ..ValidationResultRow::default()
            },
            ValidationResultRow::failed("", "x?", "invalid input".to_string()),
        ];
        write_results_csv(&path, &rows).expect("csv should be written");

        let raw = std::fs::read_to_string(&path).expect("read csv");
        let mut lines = raw.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Gold Standard,Generated,Average Cosine Similarity,Max Cosine Similarity,Average Jaccard Similarity,Cosine Heatmap,Jaccard Heatmap,LLM Analysis,Error"
            )
        );
        assert_eq!(lines.next(), Some("What is X?,What is X?,1.0,1.0,1.0,,,,"));
        assert_eq!(lines.next(), Some(",x?,,,,,,,invalid input"));
    }

    #[test]
    fn empty_results_csv_still_has_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("validation_results.csv");
        write_results_csv(&path, &[]).expect("csv should be written");

        let raw = std::fs::read_to_string(&path).expect("read csv");
        assert_eq!(raw.trim_end(), RESULT_COLUMNS.join(","));
    }
}
