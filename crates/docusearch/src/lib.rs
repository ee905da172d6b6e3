pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod search;
pub mod services;
pub mod storage;
mod sync;

pub use config::{load_config, Config, FileLimits, FileRejection};
pub use error::{ConfigError, DocusearchError, Result, StorageError};
pub use jobs::{
    DataSource, FileResult, Job, JobDetails, JobStatus, JobStore, JobSummary, Metadata,
};
pub use metrics::{MetricsAggregator, MetricsSummary};
pub use search::{DocumentId, ScoredDocument, SearchIndex};
pub use services::Services;
