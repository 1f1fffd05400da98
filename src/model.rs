use serde::Serialize;

use crate::report::ValidationResultRow;

/// Benchmark CSV row reduced to the two compared text columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    pub gold_standard: String,
    pub generated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    pub message: String,
    pub results_saved_to: Option<String>,
    pub validation_results: Vec<ValidationResultRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub mode: String,
    pub top_n: usize,
    pub dataset_path: String,
    pub gold_column: String,
    pub llm_model: Option<String>,
    pub heatmap_folder: String,
    pub results_csv_path: Option<String>,
    pub row_count: usize,
    pub error_count: usize,
    pub warnings: Vec<String>,
}
