use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::KappaArgs;
use crate::kappa::{AgreementEntry, AnnotationTable, annotator_agreement};

pub fn run(args: KappaArgs) -> Result<()> {
    let table = AnnotationTable::from_csv_path(&args.csv_path)?;
    info!(
        path = %args.csv_path.display(),
        source_columns = args.source_columns.len(),
        target_columns = args.target_columns.len(),
        "computing annotator agreement"
    );

    let entries = annotator_agreement(&table, &args.source_columns, &args.target_columns)?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &entries)
            .context("failed to serialize kappa json output")?;
        writeln!(output)?;
    } else {
        for entry in &entries {
            writeln!(output, "{}", format_entry(entry))?;
        }
    }
    output.flush()?;

    Ok(())
}

fn format_entry(entry: &AgreementEntry) -> String {
    match entry.value {
        Some(value) if entry.label.contains("Percentage") => {
            format!("{}: {value:.2}%", entry.label)
        }
        Some(value) => format!("{}: {value:.4}", entry.label),
        None => format!("{}: undefined", entry.label),
    }
}
