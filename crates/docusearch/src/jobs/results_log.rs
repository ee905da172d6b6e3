//! Line-delimited JSON results log written when a job finishes.
//!
//! Line 1 is a [`ResultsLogSummary`]; every following line is one
//! [`FileResult`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::jobs::model::{
    progress_percentage, DataSource, FileResult, Job, JobStatus, SkippedReasons,
};
use crate::storage::{self, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsLogSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub total_files: u32,
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
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub metadata_options: Vec<String>,
}

impl ResultsLogSummary {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            total_files: job.total_files,
            successful_files: job.successful_files,
            failed_files: job.failed_files,
            skipped_files: job.skipped_files,
            skipped_reasons: job.skipped_reasons.clone(),
            corrupt_files: job.corrupt_files,
            start_time: job.start_time,
            end_time: job.end_time,
            processing_time_seconds: job.processing_time(),
            metadata_options: job.metadata_options.clone(),
        }
    }

    /// Rebuilds a job from the summary line. Fields the log does not carry
    /// are derived: every counted outcome is treated as processed.
    pub fn into_job(self, results: Vec<FileResult>) -> Job {
        let processed_files = (self.successful_files + self.failed_files + self.skipped_files)
            .min(self.total_files);
        let progress = if self.status.is_terminal() {
            100
        } else {
            progress_percentage(processed_files, self.total_files)
        };

        Job {
            job_id: self.job_id,
            status: self.status,
            total_files: self.total_files,
            processed_files,
            successful_files: self.successful_files,
            failed_files: self.failed_files,
            skipped_files: self.skipped_files,
            skipped_reasons: self.skipped_reasons,
            corrupt_files: self.corrupt_files,
            start_time: self.start_time,
            end_time: self.end_time,
            current_file: None,
            progress_percentage: progress,
            metadata_options: self.metadata_options,
            data_source: DataSource::default(),
            results,
        }
    }
}

fn encode_line<T: Serialize>(path: &Path, value: &T, out: &mut String) -> Result<(), StorageError> {
    let line = serde_json::to_string(value).map_err(|e| StorageError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    out.push_str(&line);
    out.push('\n');
    Ok(())
}

/// Writes the full log for `job`, replacing any previous one atomically.
pub fn write(path: &Path, job: &Job) -> Result<(), StorageError> {
    let mut content = String::new();
    encode_line(path, &ResultsLogSummary::from_job(job), &mut content)?;
    for result in &job.results {
        encode_line(path, result, &mut content)?;
    }
    storage::write_atomic(path, content.as_bytes())
}

/// Reads a results log.
///
/// A missing or malformed summary line fails the whole file. Malformed result
/// lines are skipped with a warning so one bad record does not hide the rest.
pub fn read(path: &Path) -> Result<(ResultsLogSummary, Vec<FileResult>), StorageError> {
    let content = storage::read_to_string(path)?;
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let first = lines.next().ok_or_else(|| StorageError::Empty {
        path: path.to_path_buf(),
    })?;
    let summary: ResultsLogSummary =
        serde_json::from_str(first).map_err(|e| StorageError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut results = Vec::new();
    for (index, line) in lines.enumerate() {
        match serde_json::from_str::<FileResult>(line) {
            Ok(result) => results.push(result),
            Err(e) => log::warn!(
                "Skipping malformed result line {} in {}: {}",
                index + 2,
                path.display(),
                e
            ),
        }
    }

    Ok((summary, results))
}
