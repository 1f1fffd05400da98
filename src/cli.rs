use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::similarity::{DEFAULT_TOP_N, Mode};

#[derive(Parser, Debug)]
#[command(
    name = "cqval",
    version,
    about = "Competency question similarity validation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare one gold-standard CQ list against one generated list.
    Compare(CompareArgs),
    /// Validate every row of a benchmark CSV.
    Validate(ValidateArgs),
    /// Inter-annotator agreement (Cohen's kappa) over an annotation CSV.
    Kappa(KappaArgs),
    /// Summarize the validation run ledger.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Cosine,
    Jaccard,
    Llm,
    All,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Cosine => Mode::Cosine,
            ModeArg::Jaccard => Mode::Jaccard,
            ModeArg::Llm => Mode::Llm,
            ModeArg::All => Mode::All,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, conflicts_with = "input_file", requires = "generated")]
    pub gold: Option<String>,

    #[arg(long, conflicts_with = "input_file", requires = "gold")]
    pub generated: Option<String>,

    /// File holding a `Gold standard: ... Generated: ...` block.
    #[arg(long)]
    pub input_file: Option<PathBuf>,

    #[arg(long, value_enum, ignore_case = true, default_value_t = ModeArg::All)]
    pub mode: ModeArg,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_heatmaps: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub dataset_path: Option<PathBuf>,

    #[arg(long, value_enum, ignore_case = true, default_value_t = ModeArg::All)]
    pub mode: ModeArg,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_save: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct KappaArgs {
    #[arg(long)]
    pub csv_path: PathBuf,

    #[arg(long = "source-col", required = true)]
    pub source_columns: Vec<String>,

    #[arg(long = "target-col", required = true)]
    pub target_columns: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "results/cqval_runs.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub recent: usize,
}
