use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::evaluate::{PairContext, evaluate_pair};
use crate::cli::ValidateArgs;
use crate::config::{
    resolve_dataset_path, resolve_heatmap_folder, resolve_llm_settings, resolve_results_dir,
};
use crate::llm::{ChatCompletionClient, TextGenerator};
use crate::model::{DatasetRow, ValidationResponse, ValidationRunManifest};
use crate::report::{ValidationResultRow, write_results_csv};
use crate::similarity::Mode;
use crate::store::{RunRecord, open_ledger, record_run};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

const GOLD_COLUMNS: [&str; 2] = ["gold standard", "Competency Question"];
const GENERATED_COLUMN: &str = "generated";

/// A row that could not be read carries its read error instead.
type DatasetRecord = Result<DatasetRow, String>;

#[derive(Debug)]
struct Dataset {
    gold_column: String,
    rows: Vec<DatasetRecord>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let mode = Mode::from(args.mode);
    let dataset_path = resolve_dataset_path(args.dataset_path.clone());
    let heatmap_folder = resolve_heatmap_folder(args.output_folder.clone());
    let results_dir = resolve_results_dir(args.results_dir.clone());

    info!(run_id = %run_id, dataset = %dataset_path.display(), mode = %mode, "starting validation");

    let dataset = load_dataset(&dataset_path, args.limit)?;
    let mut warnings = Vec::<String>::new();

    let client = if mode.includes_llm() {
        let settings = resolve_llm_settings(args.llm.api_key.as_deref(), args.llm.model.as_deref());
        let client = ChatCompletionClient::from_settings(&settings)?;
        if client.is_none() {
            warnings.push("no LLM API key configured; analysis skipped".to_string());
        }
        client
    } else {
        None
    };

    let context = PairContext {
        mode,
        top_n: args.top_n,
        heatmap_folder: Some(heatmap_folder.as_path()),
        generator: client.as_ref().map(|value| value as &dyn TextGenerator),
    };
    let results = validate_rows(&dataset.rows, &context);
    let error_count = results.iter().filter(|row| row.is_error()).count();

    let results_csv_path = if args.no_save {
        None
    } else {
        let path = results_dir.join(format!(
            "validation_results_{}.csv",
            utc_compact_string(started_ts)
        ));
        write_results_csv(&path, &results)?;
        info!(path = %path.display(), "wrote validation results");
        Some(path)
    };

    if !args.no_save {
        let manifest = ValidationRunManifest {
            manifest_version: 1,
            run_id: run_id.clone(),
            started_at: started_at.clone(),
            finished_at: now_utc_string(),
            mode: mode.to_string(),
            top_n: args.top_n,
            dataset_path: dataset_path.display().to_string(),
            gold_column: dataset.gold_column.clone(),
            llm_model: client.as_ref().map(|value| value.model().to_string()),
            heatmap_folder: heatmap_folder.display().to_string(),
            results_csv_path: results_csv_path.as_ref().map(|path| path.display().to_string()),
            row_count: results.len(),
            error_count,
            warnings,
        };
        let manifest_path = results_dir.join(format!(
            "validation_run_{}.json",
            utc_compact_string(started_ts)
        ));
        write_json_pretty(&manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote validation run manifest");
    }

    if let Some(db_path) = &args.db_path {
        let mut connection = open_ledger(db_path)?;
        let run = RunRecord {
            run_id: run_id.clone(),
            started_at,
            mode: mode.to_string(),
            dataset_path: dataset_path.display().to_string(),
            results_path: results_csv_path.as_ref().map(|path| path.display().to_string()),
        };
        record_run(&mut connection, &run, &results)?;
        info!(path = %db_path.display(), run_id = %run_id, "recorded run in ledger");
    }

    info!(
        run_id = %run_id,
        rows = results.len(),
        errors = error_count,
        "validation completed"
    );

    if args.json {
        let response = ValidationResponse {
            message: "Processing complete".to_string(),
            results_saved_to: results_csv_path.map(|path| path.display().to_string()),
            validation_results: results,
        };
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize validation json output")?;
        writeln!(output)?;
        output.flush()?;
    }

    Ok(())
}

/// Evaluates every row on its own; a failing row becomes an error entry and
/// the batch carries on.
fn validate_rows(rows: &[DatasetRecord], context: &PairContext<'_>) -> Vec<ValidationResultRow> {
    let mut results = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(row = index, error = %err, "skipping unreadable dataset row");
                results.push(ValidationResultRow::failed("", "", err.clone()));
                continue;
            }
        };
        match evaluate_pair(&row.gold_standard, &row.generated, context) {
            Ok((outcome, artifacts)) => results.push(ValidationResultRow::from_outcome(
                &row.gold_standard,
                &row.generated,
                &outcome,
                artifacts,
            )),
            Err(err) => {
                warn!(row = index, error = %err, "row validation failed");
                results.push(ValidationResultRow::failed(
                    &row.gold_standard,
                    &row.generated,
                    format!("{err:#}"),
                ));
            }
        }
    }
    results
}

fn load_dataset(path: &Path, limit: Option<usize>) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open dataset: {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read dataset headers: {}", path.display()))?
        .iter()
        .map(|value| value.trim().to_string())
        .collect::<Vec<String>>();

    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    };

    let Some((gold_column, gold_index)) = GOLD_COLUMNS
        .iter()
        .find_map(|name| find(name).map(|index| (headers[index].clone(), index)))
    else {
        bail!(
            "dataset must contain a '{}' or '{}' column: {}",
            GOLD_COLUMNS[0],
            GOLD_COLUMNS[1],
            path.display()
        );
    };
    let Some(generated_index) = find(GENERATED_COLUMN) else {
        bail!(
            "dataset must contain a '{GENERATED_COLUMN}' column: {}",
            path.display()
        );
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let row_number = rows.len() + 1;
        rows.push(
            record
                .map(|record| DatasetRow {
                    gold_standard: record.get(gold_index).unwrap_or_default().to_string(),
                    generated: record.get(generated_index).unwrap_or_default().to_string(),
                })
                .map_err(|err| format!("failed to read dataset row {row_number}: {err}")),
        );
    }

    info!(rows = rows.len(), gold_column = %gold_column, "loaded dataset");
    Ok(Dataset { gold_column, rows })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{load_dataset, run, validate_rows};
    use crate::cli::{LlmArgs, ModeArg, ValidateArgs};
    use crate::commands::evaluate::PairContext;
    use crate::commands::evaluate::tests::FakeGenerator;
    use crate::model::DatasetRow;
    use crate::similarity::{DEFAULT_TOP_N, Mode};
    use crate::store::{ledger_counts, open_ledger_read_only};

    fn write_csv(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("benchmark.csv");
        fs::write(&path, contents).expect("write dataset");
        (dir, path)
    }

    #[test]
    fn loads_gold_standard_and_generated_columns() {
        let (_dir, path) = write_csv(
            "id,gold standard,generated\n\
             1,\"What is X? What is Y?\",\"What is X?\"\n\
             2,Who owns Z?,Who runs Z?\n",
        );
        let dataset = load_dataset(&path, None).expect("dataset should load");
        assert_eq!(dataset.gold_column, "gold standard");
        assert_eq!(dataset.rows.len(), 2);
        let rows = ok_rows(&dataset.rows);
        assert_eq!(rows[0].gold_standard, "What is X? What is Y?");
        assert_eq!(rows[1].generated, "Who runs Z?");
    }

    #[test]
    fn falls_back_to_competency_question_column_and_honours_limit() {
        let (_dir, path) = write_csv(
            "Competency Question,generated\n\
             a?,a?\n\
             b?,b?\n\
             c?,c?\n",
        );
        let dataset = load_dataset(&path, Some(2)).expect("dataset should load");
        assert_eq!(dataset.gold_column, "Competency Question");
        assert_eq!(dataset.rows.len(), 2);
    }

    #[test]
    fn missing_columns_fail_before_processing() {
        let (_dir, path) = write_csv("question,answer\na?,b?\n");
        let error = load_dataset(&path, None).expect_err("gold column required");
        assert!(error.to_string().contains("'gold standard'"), "{error}");

        let (_dir, path) = write_csv("gold standard,answer\na?,b?\n");
        let error = load_dataset(&path, None).expect_err("generated column required");
        assert!(error.to_string().contains("'generated'"), "{error}");
    }

    #[test]
    fn failing_rows_are_isolated() {
        let rows = vec![
            Ok(DatasetRow {
                gold_standard: "What is X?".to_string(),
                generated: "What is X?".to_string(),
            }),
            Ok(DatasetRow {
                gold_standard: String::new(),
                generated: "x?".to_string(),
            }),
            Ok(DatasetRow {
                gold_standard: "Who is Y?".to_string(),
                generated: "Who is Z?".to_string(),
            }),
            Err("failed to read dataset row 4: invalid utf-8".to_string()),
        ];
        let generator = FakeGenerator::replying("<b>close</b> match");
        let context = PairContext {
            mode: Mode::All,
            top_n: DEFAULT_TOP_N,
            heatmap_folder: None,
            generator: Some(&generator),
        };

        let results = validate_rows(&rows, &context);
        assert_eq!(results.len(), 4);
        assert!(!results[0].is_error());
        assert!(
            results[0]
                .average_cosine_similarity
                .is_some_and(|value| (value - 1.0).abs() < 1e-9)
        );
        assert_eq!(results[0].llm_analysis.as_deref(), Some("close match"));
        assert!(
            results[1]
                .error
                .as_deref()
                .is_some_and(|error| error.contains("invalid input"))
        );
        assert_eq!(results[1].average_cosine_similarity, None);
        assert!(!results[2].is_error());
        assert_eq!(
            results[3].error.as_deref(),
            Some("failed to read dataset row 4: invalid utf-8")
        );
        assert_eq!(generator.prompts.borrow().len(), 2);
    }

    fn ok_rows(rows: &[super::DatasetRecord]) -> Vec<&DatasetRow> {
        rows.iter()
            .map(|row| row.as_ref().expect("row should be readable"))
            .collect()
    }

    #[test]
    fn malformed_records_do_not_abort_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("benchmark.csv");
        let mut contents = b"gold standard,generated\na?,a?\nb?,b?,extra\n".to_vec();
        contents.extend_from_slice(b"\xff?,broken?\n");
        contents.extend_from_slice(b"c?\nd?,d?\n");
        fs::write(&path, contents).expect("write dataset");

        let dataset = load_dataset(&path, None).expect("dataset should load");
        assert_eq!(dataset.rows.len(), 5);
        assert_eq!(dataset.rows[1].as_ref().map(|row| row.generated.as_str()), Ok("b?"));
        assert!(dataset.rows[2].is_err());
        assert_eq!(dataset.rows[3].as_ref().map(|row| row.generated.as_str()), Ok(""));
        assert_eq!(dataset.rows[4].as_ref().map(|row| row.gold_standard.as_str()), Ok("d?"));

        let context = PairContext {
            mode: Mode::Cosine,
            top_n: DEFAULT_TOP_N,
            heatmap_folder: None,
            generator: None,
        };
        let results = validate_rows(&dataset.rows, &context);
        let errors = results.iter().map(|row| row.is_error()).collect::<Vec<bool>>();
        assert_eq!(errors, vec![false, false, true, true, false]);
    }

    fn validate_args(root: &Path, dataset_path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            dataset_path: Some(dataset_path),
            mode: ModeArg::Cosine,
            top_n: DEFAULT_TOP_N,
            output_folder: Some(root.join("heatmaps")),
            results_dir: Some(root.join("results")),
            no_save: false,
            limit: None,
            db_path: Some(root.join("results").join("runs.sqlite")),
            json: false,
            llm: LlmArgs {
                api_key: None,
                model: None,
            },
        }
    }

    fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
        let mut files = fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("dir entry").path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .collect::<Vec<PathBuf>>();
        files.sort();
        files
    }

    #[test]
    fn run_writes_results_manifest_and_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset_path = dir.path().join("benchmark.csv");
        fs::write(
            &dataset_path,
            "gold standard,generated\n\
             What is X?,What is X?\n\
             ,x?\n",
        )
        .expect("write dataset");

        run(validate_args(dir.path(), dataset_path)).expect("validation should run");

        let results_dir = dir.path().join("results");
        let csv_files = files_with_prefix(&results_dir, "validation_results_");
        assert_eq!(csv_files.len(), 1);
        let raw = fs::read_to_string(&csv_files[0]).expect("read results");
        assert_eq!(raw.lines().count(), 3);
        assert!(raw.contains("invalid input"), "{raw}");

        let manifests = files_with_prefix(&results_dir, "validation_run_");
        assert_eq!(manifests.len(), 1);
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifests[0]).expect("read manifest"))
                .expect("manifest json");
        assert_eq!(manifest["mode"], "cosine");
        assert_eq!(manifest["gold_column"], "gold standard");
        assert_eq!(manifest["row_count"], 2);
        assert_eq!(manifest["error_count"], 1);
        assert!(manifest["llm_model"].is_null());

        assert_eq!(files_with_prefix(&dir.path().join("heatmaps"), "cosine_heatmap_").len(), 1);

        let ledger = open_ledger_read_only(&results_dir.join("runs.sqlite")).expect("ledger");
        let counts = ledger_counts(&ledger).expect("counts");
        assert_eq!((counts.runs, counts.results, counts.errors), (1, 2, 1));
    }

    #[test]
    fn run_with_empty_dataset_writes_header_only_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset_path = dir.path().join("benchmark.csv");
        fs::write(&dataset_path, "gold standard,generated\n").expect("write dataset");

        let mut args = validate_args(dir.path(), dataset_path);
        args.db_path = None;
        run(args).expect("validation should run");

        let csv_files = files_with_prefix(&dir.path().join("results"), "validation_results_");
        assert_eq!(csv_files.len(), 1);
        let raw = fs::read_to_string(&csv_files[0]).expect("read results");
        assert!(raw.starts_with("Gold Standard,Generated,"), "{raw}");
        assert_eq!(raw.lines().count(), 1);
    }

    #[test]
    fn run_without_saving_leaves_results_dir_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset_path = dir.path().join("benchmark.csv");
        fs::write(&dataset_path, "gold standard,generated\nWhat is X?,What is Y?\n")
            .expect("write dataset");

        let mut args = validate_args(dir.path(), dataset_path);
        args.no_save = true;
        args.db_path = None;
        run(args).expect("validation should run");

        assert!(!dir.path().join("results").exists());
    }
}
