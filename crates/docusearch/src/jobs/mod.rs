//! Batch job ledger: lifecycle, per-file results and on-disk reconstruction.

pub mod model;
pub mod results_log;
pub mod store;

pub use model::{
    progress_percentage, DataSource, FileResult, Job, JobDetails, JobStatus, JobSummary,
    Metadata, SkipReason, SkippedReasons,
};
pub use results_log::ResultsLogSummary;
pub use store::JobStore;
