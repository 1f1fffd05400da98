//! Inter-annotator agreement over CSV annotation sheets.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::warn;

pub const MISSING_LABEL: &str = "N/A";
pub const YES_LABEL: &str = "yes";

/// Annotation sheet: column name to one value per row.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementEntry {
    pub label: String,
    pub value: Option<f64>,
}

impl AnnotationTable {
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open annotation csv: {}", path.display()))?;
        Self::from_reader(&mut reader)
            .with_context(|| format!("failed to read annotation csv: {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()
            .context("failed to read csv headers")?
            .iter()
            .map(|value| value.trim().to_string())
            .collect::<Vec<String>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read csv record")?;
            rows.push(record.iter().map(ToOwned::to_owned).collect());
        }

        Ok(Self { headers, rows })
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| header == name.trim())
            .with_context(|| format!("annotation column not found: {name}"))
    }

    fn value(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).map(String::as_str).unwrap_or("")
    }
}

/// Cohen's kappa between two label sequences. `None` when undefined: no
/// pairs, or chance agreement of 1 (a single label used throughout).
pub fn cohens_kappa(left: &[&str], right: &[&str]) -> Option<f64> {
    if left.is_empty() || left.len() != right.len() {
        return None;
    }

    let total = left.len() as f64;
    let labels = left
        .iter()
        .chain(right.iter())
        .copied()
        .collect::<BTreeSet<&str>>();

    let mut left_counts = HashMap::<&str, f64>::new();
    let mut right_counts = HashMap::<&str, f64>::new();
    let mut observed = 0.0_f64;
    for (left_label, right_label) in left.iter().zip(right.iter()) {
        *left_counts.entry(*left_label).or_insert(0.0) += 1.0;
        *right_counts.entry(*right_label).or_insert(0.0) += 1.0;
        if left_label == right_label {
            observed += 1.0;
        }
    }

    let observed = observed / total;
    let expected = labels
        .iter()
        .map(|label| {
            let left_share = left_counts.get(label).copied().unwrap_or(0.0) / total;
            let right_share = right_counts.get(label).copied().unwrap_or(0.0) / total;
            left_share * right_share
        })
        .sum::<f64>();

    if (1.0 - expected).abs() < f64::EPSILON {
        return None;
    }

    Some((observed - expected) / (1.0 - expected))
}

/// Pairwise kappa within each annotator set, the overall mean, the mean
/// mapped to an agreement percentage, and the share of rows where both sets
/// have a `yes` majority.
pub fn annotator_agreement(
    table: &AnnotationTable,
    source_columns: &[String],
    target_columns: &[String],
) -> Result<Vec<AgreementEntry>> {
    if source_columns.len() < 2 || target_columns.len() < 2 {
        bail!("each annotator set needs at least two columns");
    }

    let source_indices = resolve_columns(table, source_columns)?;
    let target_indices = resolve_columns(table, target_columns)?;

    let mut entries = Vec::<AgreementEntry>::new();
    let mut defined_kappas = Vec::<f64>::new();

    for (names, indices) in [
        (source_columns, &source_indices),
        (target_columns, &target_indices),
    ] {
        for first in 0..indices.len() {
            for second in (first + 1)..indices.len() {
                let kappa = pair_kappa(table, indices[first], indices[second]);
                let label = format!("{} vs {}", names[first], names[second]);
                match kappa {
                    Some(value) => defined_kappas.push(value),
                    None => warn!(pair = %label, "kappa undefined for annotator pair"),
                }
                entries.push(AgreementEntry { label, value: kappa });
            }
        }
    }

    let overall = if defined_kappas.is_empty() {
        None
    } else {
        Some(defined_kappas.iter().sum::<f64>() / defined_kappas.len() as f64)
    };
    entries.push(AgreementEntry {
        label: "Overall Average Kappa".to_string(),
        value: overall,
    });
    entries.push(AgreementEntry {
        label: "Agreement Percentage".to_string(),
        value: overall.map(|kappa| (kappa + 1.0) / 2.0 * 100.0),
    });
    entries.push(AgreementEntry {
        label: "Majority Yes Agreement Percentage (Same Row)".to_string(),
        value: Some(majority_yes_percentage(table, &source_indices, &target_indices)),
    });

    Ok(entries)
}

fn resolve_columns(table: &AnnotationTable, names: &[String]) -> Result<Vec<usize>> {
    names.iter().map(|name| table.column_index(name)).collect()
}

fn pair_kappa(table: &AnnotationTable, first: usize, second: usize) -> Option<f64> {
    let mut left = Vec::<&str>::new();
    let mut right = Vec::<&str>::new();
    for row in 0..table.rows.len() {
        let left_value = table.value(row, first).trim();
        let right_value = table.value(row, second).trim();
        if left_value == MISSING_LABEL || right_value == MISSING_LABEL {
            continue;
        }
        left.push(left_value);
        right.push(right_value);
    }
    cohens_kappa(&left, &right)
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == MISSING_LABEL
}

fn majority_yes_percentage(
    table: &AnnotationTable,
    source_indices: &[usize],
    target_indices: &[usize],
) -> f64 {
    let complete_rows = (0..table.rows.len())
        .filter(|row| {
            source_indices
                .iter()
                .chain(target_indices.iter())
                .all(|column| !is_missing(table.value(*row, *column)))
        })
        .collect::<Vec<usize>>();

    if complete_rows.is_empty() {
        return 0.0;
    }

    let has_majority = |row: usize, columns: &[usize]| {
        let yes = columns
            .iter()
            .filter(|column| table.value(row, **column).trim() == YES_LABEL)
            .count();
        yes as f64 > columns.len() as f64 / 2.0
    };

    let agreeing = complete_rows
        .iter()
        .filter(|row| has_majority(**row, source_indices) && has_majority(**row, target_indices))
        .count();

    agreeing as f64 / complete_rows.len() as f64 * 100.0
}
