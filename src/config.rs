use std::path::PathBuf;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const LLM_BASE_URL_ENV: &str = "CQVAL_LLM_BASE_URL";
pub const LLM_MODEL_ENV: &str = "CQVAL_LLM_MODEL";
pub const LLM_TIMEOUT_ENV: &str = "CQVAL_LLM_TIMEOUT_SECS";
pub const DEFAULT_DATASET_ENV: &str = "DEFAULT_DATASET";
pub const HEATMAP_OUTPUT_FOLDER_ENV: &str = "HEATMAP_OUTPUT_FOLDER";
pub const RESULTS_DIR_ENV: &str = "RESULTS_DIR";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DATASET: &str = "benchmarkdataset.csv";
pub const DEFAULT_HEATMAP_OUTPUT_FOLDER: &str = "heatmaps";
pub const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// CLI values win over the environment, which wins over built-in defaults.
pub fn resolve_llm_settings(cli_api_key: Option<&str>, cli_model: Option<&str>) -> LlmSettings {
    let env_api_key = env_value(API_KEY_ENV);
    let env_model = env_value(LLM_MODEL_ENV);
    parse_llm_settings(
        cli_api_key.or(env_api_key.as_deref()),
        env_value(LLM_BASE_URL_ENV).as_deref(),
        cli_model.or(env_model.as_deref()),
        env_value(LLM_TIMEOUT_ENV).as_deref(),
    )
}

pub fn resolve_dataset_path(cli_value: Option<PathBuf>) -> PathBuf {
    resolve_path(cli_value, DEFAULT_DATASET_ENV, DEFAULT_DATASET)
}

pub fn resolve_heatmap_folder(cli_value: Option<PathBuf>) -> PathBuf {
    resolve_path(cli_value, HEATMAP_OUTPUT_FOLDER_ENV, DEFAULT_HEATMAP_OUTPUT_FOLDER)
}

pub fn resolve_results_dir(cli_value: Option<PathBuf>) -> PathBuf {
    resolve_path(cli_value, RESULTS_DIR_ENV, DEFAULT_RESULTS_DIR)
}

fn resolve_path(cli_value: Option<PathBuf>, env_key: &str, default: &str) -> PathBuf {
    parse_path(cli_value, env_value(env_key).as_deref(), default)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_path(cli_value: Option<PathBuf>, env_value: Option<&str>, default: &str) -> PathBuf {
    cli_value
        .or_else(|| non_blank(env_value).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

fn parse_llm_settings(
    api_key: Option<&str>,
    base_url: Option<&str>,
    model: Option<&str>,
    timeout_secs: Option<&str>,
) -> LlmSettings {
    LlmSettings {
        api_key: non_blank(api_key).map(ToOwned::to_owned),
        base_url: non_blank(base_url)
            .unwrap_or(DEFAULT_LLM_BASE_URL)
            .trim_end_matches('/')
            .to_string(),
        model: non_blank(model).unwrap_or(DEFAULT_LLM_MODEL).to_string(),
        timeout_secs: non_blank(timeout_secs)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
    }
}
