//! Job and document processing metrics with a persisted snapshot.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, MetricsConfig};
use crate::error::StorageError;
use crate::metrics::latency::LatencyBuffer;
use crate::metrics::prometheus;
use crate::storage::{self, timestamp};
use crate::sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMetricStatus {
    Processing,
    Completed,
    Failed,
}

/// Timing and outcome counters of one job as seen by the metrics layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetric {
    pub job_id: String,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub successful_files: u32,
    #[serde(default)]
    pub failed_files: u32,
    #[serde(default)]
    pub skipped_files: u32,
    /// Seconds.
    #[serde(default)]
    pub processing_time: f64,
    pub status: JobMetricStatus,
}

/// Cumulative document counters.
///
/// The `total_*` fields are folded in from completed jobs; the `llm_*` and
/// `local_*` split is fed by individual document recordings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetricTotals {
    pub total_processed: u64,
    pub total_successful: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub total_processing_time: f64,
    pub llm_processed: u64,
    pub llm_successful: u64,
    pub llm_failed: u64,
    pub local_processed: u64,
    pub local_successful: u64,
    pub local_failed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParserClassCounts {
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobsSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub currently_processing: usize,
    pub p50_latency_seconds: f64,
    pub p95_latency_seconds: f64,
    pub avg_processing_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentsSummary {
    pub total_processed: u64,
    pub total_successful: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub p50_processing_time_seconds: f64,
    pub p95_processing_time_seconds: f64,
    pub avg_processing_time_seconds: f64,
    pub total_processing_time_seconds: f64,
    pub llm: ParserClassCounts,
    pub local: ParserClassCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSummary {
    pub uptime_seconds: f64,
    #[serde(with = "timestamp")]
    pub metrics_collection_start: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub jobs: JobsSummary,
    pub documents: DocumentsSummary,
    pub system: SystemSummary,
}

/// On-disk form. Active jobs are not persisted.
#[derive(Serialize)]
struct SnapshotOut<'a> {
    completed_jobs: &'a [JobMetric],
    document_metrics: &'a DocumentMetricTotals,
    job_latencies: Vec<f64>,
    document_latencies: Vec<f64>,
    #[serde(with = "timestamp")]
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default)]
    completed_jobs: Vec<JobMetric>,
    #[serde(default)]
    document_metrics: DocumentMetricTotals,
    #[serde(default)]
    job_latencies: Vec<f64>,
    #[serde(default)]
    document_latencies: Vec<f64>,
}

struct MetricsState {
    active: HashMap<String, JobMetric>,
    completed: Vec<JobMetric>,
    documents: DocumentMetricTotals,
    job_latencies: LatencyBuffer,
    document_latencies: LatencyBuffer,
}

impl MetricsState {
    fn empty(config: &MetricsConfig) -> Self {
        Self {
            active: HashMap::new(),
            completed: Vec::new(),
            documents: DocumentMetricTotals::default(),
            job_latencies: LatencyBuffer::new(config.job_latency_capacity),
            document_latencies: LatencyBuffer::new(config.document_latency_capacity),
        }
    }

    fn clear(&mut self) {
        self.active.clear();
        self.completed.clear();
        self.documents = DocumentMetricTotals::default();
        self.job_latencies.clear();
        self.document_latencies.clear();
    }

    /// Earliest start among completed and running jobs.
    fn collection_start(&self) -> Option<DateTime<Utc>> {
        self.completed
            .iter()
            .chain(self.active.values())
            .map(|job| job.start_time)
            .min()
    }

    fn summary(&self, now: DateTime<Utc>) -> MetricsSummary {
        let successful = self
            .completed
            .iter()
            .filter(|job| job.status == JobMetricStatus::Completed)
            .count();
        let failed = self
            .completed
            .iter()
            .filter(|job| job.status == JobMetricStatus::Failed)
            .count();

        let start = self.collection_start().unwrap_or(now);
        let docs = &self.documents;

        MetricsSummary {
            timestamp: now,
            jobs: JobsSummary {
                total: self.completed.len(),
                successful,
                failed,
                currently_processing: self.active.len(),
                p50_latency_seconds: self.job_latencies.percentile(50.0),
                p95_latency_seconds: self.job_latencies.percentile(95.0),
                avg_processing_time_seconds: self.job_latencies.mean(),
            },
            documents: DocumentsSummary {
                total_processed: docs.total_processed,
                total_successful: docs.total_successful,
                total_failed: docs.total_failed,
                total_skipped: docs.total_skipped,
                p50_processing_time_seconds: self.document_latencies.percentile(50.0),
                p95_processing_time_seconds: self.document_latencies.percentile(95.0),
                avg_processing_time_seconds: self.document_latencies.mean(),
                total_processing_time_seconds: docs.total_processing_time,
                llm: ParserClassCounts {
                    processed: docs.llm_processed,
                    successful: docs.llm_successful,
                    failed: docs.llm_failed,
                },
                local: ParserClassCounts {
                    processed: docs.local_processed,
                    successful: docs.local_successful,
                    failed: docs.local_failed,
                },
            },
            system: SystemSummary {
                uptime_seconds: seconds_between(start, now),
                metrics_collection_start: start,
            },
        }
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let micros = (end - start).num_microseconds().unwrap_or(0);
    (micros as f64 / 1e6).max(0.0)
}

/// Thread-safe metrics collector.
///
/// One mutex guards all state; each public call holds it for its whole
/// duration, including the snapshot write. Persistence failures are logged
/// and never surface to callers.
pub struct MetricsAggregator {
    path: PathBuf,
    llm_parser_classes: HashSet<String>,
    state: Mutex<MetricsState>,
}

impl MetricsAggregator {
    /// Opens the aggregator, restoring state from `path` when it holds a
    /// readable snapshot.
    pub fn open<P: AsRef<Path>>(path: P, config: &MetricsConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut state = MetricsState::empty(config);

        if path.exists() {
            match storage::read_json::<SnapshotIn>(&path) {
                Ok(snapshot) => {
                    state.completed = snapshot.completed_jobs;
                    state.documents = snapshot.document_metrics;
                    state.job_latencies = LatencyBuffer::from_samples(
                        config.job_latency_capacity,
                        snapshot.job_latencies,
                    );
                    state.document_latencies = LatencyBuffer::from_samples(
                        config.document_latency_capacity,
                        snapshot.document_latencies,
                    );
                    log::info!(
                        "Loaded metrics snapshot: {} completed jobs, {} document samples",
                        state.completed.len(),
                        state.document_latencies.len()
                    );
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable metrics snapshot: {}", e);
                    preserve_unreadable(&path);
                }
            }
        }

        Self {
            path,
            llm_parser_classes: config.llm_parser_classes.iter().cloned().collect(),
            state: Mutex::new(state),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::open(config.metrics_file(), &config.metrics)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    pub fn start_job(&self, job_id: &str, total_files: u32) {
        let mut state = sync::lock(&self.state, "Metrics");
        state.active.insert(
            job_id.to_string(),
            JobMetric {
                job_id: job_id.to_string(),
                start_time: Utc::now(),
                end_time: None,
                total_files,
                successful_files: 0,
                failed_files: 0,
                skipped_files: 0,
                processing_time: 0.0,
                status: JobMetricStatus::Processing,
            },
        );
        self.persist(&state);
    }

    pub fn update_job_progress(&self, job_id: &str, successful: u32, failed: u32, skipped: u32) {
        let mut state = sync::lock(&self.state, "Metrics");
        let Some(job) = state.active.get_mut(job_id) else {
            log::debug!("Metrics progress for inactive job {} ignored", job_id);
            return;
        };
        job.successful_files = successful;
        job.failed_files = failed;
        job.skipped_files = skipped;
        self.persist(&state);
    }

    /// Moves a running job to the completed list and folds its counters into
    /// the document totals.
    pub fn complete_job(&self, job_id: &str, success: bool) {
        let mut state = sync::lock(&self.state, "Metrics");
        let Some(mut job) = state.active.remove(job_id) else {
            log::debug!("Metrics completion for inactive job {} ignored", job_id);
            return;
        };

        let end = Utc::now();
        job.end_time = Some(end);
        job.processing_time = seconds_between(job.start_time, end);
        job.status = if success {
            JobMetricStatus::Completed
        } else {
            JobMetricStatus::Failed
        };

        state.job_latencies.push(job.processing_time);

        let docs = &mut state.documents;
        docs.total_processed += u64::from(job.total_files);
        docs.total_successful += u64::from(job.successful_files);
        docs.total_failed += u64::from(job.failed_files);
        docs.total_skipped += u64::from(job.skipped_files);
        docs.total_processing_time += job.processing_time;

        state.completed.push(job);
        self.persist(&state);
    }

    /// Records one document's processing time and outcome under its parser
    /// class.
    pub fn record_document_processing(
        &self,
        duration_seconds: f64,
        success: bool,
        parser_class: &str,
    ) {
        let mut state = sync::lock(&self.state, "Metrics");
        state.document_latencies.push(duration_seconds);

        let docs = &mut state.documents;
        if self.is_llm_class(parser_class) {
            docs.llm_processed += 1;
            if success {
                docs.llm_successful += 1;
            } else {
                docs.llm_failed += 1;
            }
        } else {
            docs.local_processed += 1;
            if success {
                docs.local_successful += 1;
            } else {
                docs.local_failed += 1;
            }
        }
        self.persist(&state);
    }

    pub fn is_llm_class(&self, parser_class: &str) -> bool {
        self.llm_parser_classes.contains(parser_class)
    }

    pub fn get_metrics_summary(&self) -> MetricsSummary {
        sync::lock(&self.state, "Metrics").summary(Utc::now())
    }

    /// Prometheus text exposition of the current summary.
    pub fn get_prometheus_metrics(&self) -> String {
        prometheus::render(&self.get_metrics_summary())
    }

    /// Drops all state, active jobs included, and deletes the snapshot file.
    pub fn reset_metrics(&self) {
        let mut state = sync::lock(&self.state, "Metrics");
        state.clear();
        if let Err(e) = storage::remove_if_exists(&self.path) {
            log::error!("Failed to delete metrics snapshot: {}", e);
        }
        log::info!("Metrics have been reset");
    }

    fn persist(&self, state: &MetricsState) {
        let _span = tracing::debug_span!("metrics.persist").entered();
        if let Err(e) = self.write_snapshot(state) {
            log::error!("Failed to save metrics: {}", e);
        }
    }

    fn write_snapshot(&self, state: &MetricsState) -> Result<(), StorageError> {
        let snapshot = SnapshotOut {
            completed_jobs: &state.completed,
            document_metrics: &state.documents,
            job_latencies: state.job_latencies.to_vec(),
            document_latencies: state.document_latencies.to_vec(),
            last_updated: Utc::now(),
        };
        storage::write_json_atomic(&self.path, &snapshot)
    }
}

/// Copies an unreadable snapshot to `<name>.bad` so the next persist does
/// not destroy it.
fn preserve_unreadable(path: &Path) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bad");
    let backup = PathBuf::from(backup);
    match std::fs::copy(path, &backup) {
        Ok(_) => log::warn!("Kept unreadable metrics snapshot as {}", backup.display()),
        Err(e) => log::error!(
            "Failed to keep unreadable metrics snapshot {}: {}",
            path.display(),
            e
        ),
    }
}
