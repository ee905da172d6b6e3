use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "docusearch",
    version,
    about = "Inspect docusearch jobs and processing metrics"
)]
pub struct Cli {
    /// JSON config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all jobs, newest first.
    Jobs,
    /// Show one job.
    Job(JobArgs),
    /// Delete a job and its files.
    DeleteJob(DeleteJobArgs),
    /// Print the metrics summary.
    Metrics(MetricsArgs),
    /// Clear all metrics and delete the snapshot.
    ResetMetrics,
}

#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    pub job_id: String,

    /// Include per-file results, reloading them from the results log.
    #[arg(long, default_value_t = false)]
    pub results: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteJobArgs {
    pub job_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Prometheus text format instead of JSON.
    #[arg(long, default_value_t = false)]
    pub prometheus: bool,
}
