//! Job ledger records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::timestamp;

/// Opaque field map produced by the document parser.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Status of a batch job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Processing may move to either terminal state; terminal states never move.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the files of a batch came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSource {
    #[default]
    Local,
    S3,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local => f.write_str("Local"),
            DataSource::S3 => f.write_str("S3"),
        }
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(DataSource::Local),
            "s3" => Ok(DataSource::S3),
            other => Err(format!("unknown data source '{}'", other)),
        }
    }
}

/// Skip reasons that have a bucket in the per-job histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    UnknownFormat,
    FileSizeLimit,
    PageLimit,
}

impl SkipReason {
    pub const ALL: [SkipReason; 3] = [
        SkipReason::UnknownFormat,
        SkipReason::FileSizeLimit,
        SkipReason::PageLimit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnknownFormat => "unknown_format",
            SkipReason::FileSizeLimit => "file_size_limit",
            SkipReason::PageLimit => "page_limit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.as_str() == key)
    }
}

/// Per-job skip histogram over the registered reasons.
///
/// Serializes as a JSON object with one key per reason, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedReasons {
    #[serde(default)]
    pub unknown_format: u32,
    #[serde(default)]
    pub file_size_limit: u32,
    #[serde(default)]
    pub page_limit: u32,
}

impl SkippedReasons {
    pub fn get(&self, reason: SkipReason) -> u32 {
        match reason {
            SkipReason::UnknownFormat => self.unknown_format,
            SkipReason::FileSizeLimit => self.file_size_limit,
            SkipReason::PageLimit => self.page_limit,
        }
    }

    /// Bumps the bucket for `key`. Returns false (and counts nothing) for
    /// keys without a bucket.
    pub fn record(&mut self, key: &str) -> bool {
        let Some(reason) = SkipReason::from_key(key) else {
            return false;
        };
        let slot = match reason {
            SkipReason::UnknownFormat => &mut self.unknown_format,
            SkipReason::FileSizeLimit => &mut self.file_size_limit,
            SkipReason::PageLimit => &mut self.page_limit,
        };
        *slot += 1;
        true
    }

    pub fn total(&self) -> u32 {
        self.unknown_format + self.file_size_limit + self.page_limit
    }
}

/// Outcome of one file within a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileResult {
    pub filename: String,
    pub success: bool,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

impl FileResult {
    pub fn success(filename: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            filename: filename.into(),
            success: true,
            timestamp: Utc::now(),
            metadata,
            error: None,
            skip_reason: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            success: false,
            timestamp: Utc::now(),
            metadata: Metadata::new(),
            error: Some(error.into()),
            skip_reason: None,
        }
    }

    /// A file that was refused before parsing. `reason` need not be a
    /// registered [`SkipReason`] key.
    pub fn skipped(
        filename: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            success: false,
            timestamp: Utc::now(),
            metadata: Metadata::new(),
            error: Some(message.into()),
            skip_reason: Some(reason.into()),
        }
    }

    /// True when the error text marks the file itself as unreadable.
    pub fn is_corrupt(&self) -> bool {
        let Some(error) = self.error.as_deref() else {
            return false;
        };
        let error = error.to_lowercase();
        error.contains("corrupt")
            || error.contains("not readable")
            || error.contains("not parsable")
    }
}

/// `floor(processed / total * 100)`, clamped to 100; 0 for an empty job.
pub fn progress_percentage(processed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u64::from(processed) * 100) / u64::from(total);
    pct.min(100) as u8
}

/// A batch-upload job with its per-file results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub total_files: u32,
    #[serde(default)]
    pub processed_files: u32,
    #[serde(default)]
    pub successful_files: u32,
    #[serde(default)]
    pub failed_files: u32,
    #[serde(default)]
    pub skipped_files: u32,
    #[serde(default)]
    pub skipped_reasons: SkippedReasons,
    #[serde(default)]
    pub corrupt_files: u32,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_file: Option<String>,
    #[serde(default)]
    pub progress_percentage: u8,
    #[serde(default)]
    pub metadata_options: Vec<String>,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub results: Vec<FileResult>,
}

impl Job {
    pub fn new(
        job_id: impl Into<String>,
        total_files: u32,
        metadata_options: &[String],
        data_source: DataSource,
    ) -> Self {
        let mut options: Vec<String> = Vec::with_capacity(metadata_options.len());
        for option in metadata_options {
            if !options.contains(option) {
                options.push(option.clone());
            }
        }

        Self {
            job_id: job_id.into(),
            status: JobStatus::Processing,
            total_files,
            processed_files: 0,
            successful_files: 0,
            failed_files: 0,
            skipped_files: 0,
            skipped_reasons: SkippedReasons::default(),
            corrupt_files: 0,
            start_time: Utc::now(),
            end_time: None,
            current_file: None,
            progress_percentage: 0,
            metadata_options: options,
            data_source,
            results: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Sum of the three outcome counters.
    pub fn outcome_count(&self) -> u32 {
        self.successful_files + self.failed_files + self.skipped_files
    }

    /// Seconds between start and end; 0 while the job is still running.
    pub fn processing_time(&self) -> f64 {
        match self.end_time {
            Some(end) => (end - self.start_time).num_microseconds().unwrap_or(0) as f64 / 1e6,
            None => 0.0,
        }
    }

    /// Overwrites the progress counters, keeping the ledger invariants intact.
    pub(crate) fn apply_progress(
        &mut self,
        current_file: &str,
        processed: u32,
        successful: u32,
        failed: u32,
    ) {
        self.processed_files = self.processed_files.max(processed).min(self.total_files);

        let room = self.total_files.saturating_sub(self.skipped_files);
        self.successful_files = successful.min(room);
        self.failed_files = failed.min(room - self.successful_files);

        self.current_file = Some(current_file.to_string());
        self.progress_percentage = progress_percentage(self.processed_files, self.total_files);
    }

    /// Appends `result` and folds it into the counters.
    pub(crate) fn apply_result(&mut self, result: FileResult) {
        if self.outcome_count() >= self.total_files {
            log::warn!(
                "Job {} already has {} outcomes for {} files; recording '{}' without counting it",
                self.job_id,
                self.outcome_count(),
                self.total_files,
                result.filename
            );
        } else if result.success {
            self.successful_files += 1;
        } else if let Some(reason) = result.skip_reason.as_deref().filter(|r| !r.is_empty()) {
            self.skipped_files += 1;
            if !self.skipped_reasons.record(reason) {
                log::debug!(
                    "Job {}: skip reason '{}' has no histogram bucket",
                    self.job_id,
                    reason
                );
            }
        } else {
            self.failed_files += 1;
            if result.is_corrupt() {
                self.corrupt_files += 1;
            }
        }

        self.results.push(result);
    }

    pub(crate) fn finish(&mut self, success: bool) {
        self.status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        self.end_time = Some(Utc::now());
        self.progress_percentage = 100;
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.job_id.clone(),
            status: self.status,
            progress_percentage: self.progress_percentage,
            current_file: self.current_file.clone(),
            total_files: self.total_files,
            processed_files: self.processed_files,
            successful_files: self.successful_files,
            failed_files: self.failed_files,
            skipped_files: self.skipped_files,
            skipped_reasons: self.skipped_reasons.clone(),
            corrupt_files: self.corrupt_files,
            processing_time: self.processing_time(),
            start_time: self.start_time,
            end_time: self.end_time,
            data_source: self.data_source,
        }
    }
}

/// Compact per-job view for listings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub progress_percentage: u8,
    pub current_file: Option<String>,
    pub total_files: u32,
    pub processed_files: u32,
    pub successful_files: u32,
    pub failed_files: u32,
    pub skipped_files: u32,
    pub skipped_reasons: SkippedReasons,
    pub corrupt_files: u32,
    pub processing_time: f64,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    pub data_source: DataSource,
}

/// A job as returned by status/results reads, with its derived processing time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobDetails {
    #[serde(flatten)]
    pub job: Job,
    pub processing_time: f64,
}

impl From<Job> for JobDetails {
    fn from(job: Job) -> Self {
        let processing_time = job.processing_time();
        Self {
            job,
            processing_time,
        }
    }
}
