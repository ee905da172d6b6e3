use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const JOB_METADATA_DIR: &str = "job_metadata";
pub const JOB_RESULTS_DIR: &str = "job_results";
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub metadata_options: MetadataOptionsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            limits: LimitsConfig::default(),
            search: SearchConfig::default(),
            metrics: MetricsConfig::default(),
            metadata_options: MetadataOptionsConfig::default(),
        }
    }
}

impl Config {
    /// A default config rooted at `data_directory`.
    pub fn with_data_directory<P: Into<PathBuf>>(data_directory: P) -> Self {
        Self {
            data_directory: data_directory.into(),
            ..Self::default()
        }
    }

    pub fn job_metadata_dir(&self) -> PathBuf {
        self.data_directory.join(JOB_METADATA_DIR)
    }

    pub fn job_results_dir(&self) -> PathBuf {
        self.data_directory.join(JOB_RESULTS_DIR)
    }

    pub fn metrics_file(&self) -> PathBuf {
        self.data_directory.join(METRICS_FILE)
    }
}

fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("docusearch"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages_per_document: u32,
    /// MIME type to short file type label.
    #[serde(default = "default_supported_file_types")]
    pub supported_file_types: BTreeMap<String, String>,
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_max_pages() -> u32 {
    500
}

fn default_supported_file_types() -> BTreeMap<String, String> {
    [
        ("application/pdf", "PDF"),
        (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "DOCX",
        ),
        ("text/plain", "TXT"),
        ("text/html", "HTML"),
    ]
    .into_iter()
    .map(|(mime, label)| (mime.to_string(), label.to_string()))
    .collect()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_pages_per_document: default_max_pages(),
            supported_file_types: default_supported_file_types(),
        }
    }
}

impl LimitsConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    /// Hard cap applied to any requested limit.
    #[serde(default = "default_results_limit")]
    pub results_limit: usize,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
}

fn default_search_limit() -> usize {
    10
}

fn default_results_limit() -> usize {
    50
}

fn default_snippet_length() -> usize {
    200
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            results_limit: default_results_limit(),
            snippet_length: default_snippet_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_job_latency_capacity")]
    pub job_latency_capacity: usize,
    #[serde(default = "default_document_latency_capacity")]
    pub document_latency_capacity: usize,
    /// Parser names bucketed as LLM-class in the document counters.
    #[serde(default = "default_llm_parser_classes")]
    pub llm_parser_classes: Vec<String>,
}

fn default_job_latency_capacity() -> usize {
    1000
}

fn default_document_latency_capacity() -> usize {
    10_000
}

fn default_llm_parser_classes() -> Vec<String> {
    vec![
        "llm".to_string(),
        "llm_fallback".to_string(),
        "auto_local".to_string(),
    ]
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            job_latency_capacity: default_job_latency_capacity(),
            document_latency_capacity: default_document_latency_capacity(),
            llm_parser_classes: default_llm_parser_classes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataOptionsConfig {
    #[serde(default = "default_available_options")]
    pub available: Vec<String>,
    /// Used when a batch is started without explicit options.
    #[serde(default = "default_selected_options")]
    pub defaults: Vec<String>,
}

fn default_available_options() -> Vec<String> {
    ["title", "author", "published_date", "topic", "abstract"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_selected_options() -> Vec<String> {
    ["title", "author", "topic"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for MetadataOptionsConfig {
    fn default() -> Self {
        Self {
            available: default_available_options(),
            defaults: default_selected_options(),
        }
    }
}
