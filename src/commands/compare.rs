use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::evaluate::{PairContext, evaluate_pair};
use crate::cli::CompareArgs;
use crate::config::{resolve_heatmap_folder, resolve_llm_settings};
use crate::input::{LabelledInput, format_labelled_input, parse_labelled_input};
use crate::llm::{ChatCompletionClient, TextGenerator};
use crate::report::{ComparisonReport, remove_html_tags, render_html};
use crate::similarity::Mode;
use crate::util::{content_hash, now_utc_string};

pub fn run(args: CompareArgs) -> Result<()> {
    let mode = Mode::from(args.mode);
    let input = resolve_input(&args)?;

    let heatmap_folder = if args.no_heatmaps {
        None
    } else {
        Some(resolve_heatmap_folder(args.output_folder.clone()))
    };

    let client = if mode.includes_llm() {
        let settings = resolve_llm_settings(args.llm.api_key.as_deref(), args.llm.model.as_deref());
        ChatCompletionClient::from_settings(&settings)?
    } else {
        None
    };
    if let Some(client) = &client {
        info!(model = %client.model(), "LLM analysis enabled");
    }

    let context = PairContext {
        mode,
        top_n: args.top_n,
        heatmap_folder: heatmap_folder.as_deref(),
        generator: client.as_ref().map(|value| value as &dyn TextGenerator),
    };

    info!(mode = %mode, top_n = args.top_n, "comparing competency questions");
    let (outcome, artifacts) = evaluate_pair(&input.gold_text, &input.generated_text, &context)?;
    info!(
        gold = outcome.gold_statements.len(),
        generated = outcome.generated_statements.len(),
        mean_cosine = outcome.summary.mean_cosine,
        max_cosine = outcome.summary.max_cosine,
        mean_jaccard = outcome.summary.mean_jaccard,
        "comparison complete"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        let report = ComparisonReport {
            generated_at: now_utc_string(),
            input_hash: content_hash(&format_labelled_input(
                &input.gold_text,
                &input.generated_text,
            )),
            outcome: &outcome,
            percentages: outcome.summary.percentages(),
            llm_analysis: artifacts.analysis.as_deref().map(remove_html_tags),
            cosine_heatmap: artifacts
                .cosine_heatmap
                .as_ref()
                .map(|path| path.display().to_string()),
            jaccard_heatmap: artifacts
                .jaccard_heatmap
                .as_ref()
                .map(|path| path.display().to_string()),
        };
        serde_json::to_writer_pretty(&mut output, &report)
            .context("failed to serialize comparison json output")?;
        writeln!(output)?;
    } else {
        writeln!(output, "{}", render_html(&outcome, &artifacts))?;
    }
    output.flush()?;

    Ok(())
}

fn resolve_input(args: &CompareArgs) -> Result<LabelledInput> {
    if let Some(path) = &args.input_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return parse_labelled_input(&raw)
            .with_context(|| format!("failed to parse {}", path.display()));
    }

    match (&args.gold, &args.generated) {
        (Some(gold), Some(generated)) => Ok(LabelledInput {
            gold_text: gold.clone(),
            generated_text: generated.clone(),
        }),
        _ => bail!("provide --input-file or both --gold and --generated"),
    }
}
