//! Composition root wiring the job ledger, search index and metrics together.

use std::sync::Arc;

use crate::config::{Config, FileLimits, FileRejection};
use crate::error::Result;
use crate::jobs::{DataSource, FileResult, JobStore, Metadata};
use crate::metrics::MetricsAggregator;
use crate::search::{DocumentId, SearchIndex};

/// Service objects shared by every request handler.
///
/// Each service synchronizes internally, so a `Services` value can be shared
/// across threads by reference or cloned cheaply.
#[derive(Clone)]
pub struct Services {
    /// Loaded configuration.
    pub config: Arc<Config>,

    /// Batch job ledger.
    pub jobs: Arc<JobStore>,

    /// Keyword index over extracted metadata.
    pub search: Arc<SearchIndex>,

    /// Processing metrics.
    pub metrics: Arc<MetricsAggregator>,

    /// Upload admission limits.
    pub limits: FileLimits,
}

impl Services {
    /// Builds all services under `config.data_directory`, reconstructing the
    /// job ledger and metrics from disk.
    pub fn open(config: &Config) -> Result<Self> {
        let _span = tracing::info_span!("services.open").entered();

        let jobs = JobStore::from_config(config)?;
        let metrics = MetricsAggregator::from_config(config);
        let search = SearchIndex::new(&config.search);

        log::info!(
            "Services ready in {} ({} jobs restored)",
            config.data_directory.display(),
            jobs.len()
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            jobs: Arc::new(jobs),
            search: Arc::new(search),
            metrics: Arc::new(metrics),
            limits: FileLimits::from_config(&config.limits),
        })
    }

    /// Creates a job and registers it with metrics. An empty option list
    /// selects the configured default metadata fields.
    pub fn start_batch(
        &self,
        total_files: u32,
        metadata_options: &[String],
        data_source: DataSource,
    ) -> String {
        let options = if metadata_options.is_empty() {
            self.config.metadata_options.defaults.as_slice()
        } else {
            metadata_options
        };

        let job_id = self.jobs.create_job(total_files, options, data_source);
        self.metrics.start_job(&job_id, total_files);
        job_id
    }

    /// Marks `filename` as the file being worked on and advances the processed
    /// counter past it.
    pub fn begin_file(&self, job_id: &str, filename: &str) {
        let Some(details) = self.jobs.get_job_status(job_id) else {
            log::debug!("begin_file: unknown job {}", job_id);
            return;
        };
        let job = details.job;
        self.jobs.update_job_progress(
            job_id,
            filename,
            job.outcome_count() + 1,
            job.successful_files,
            job.failed_files,
        );
    }

    /// Checks a file against the admission limits.
    pub fn check_file(
        &self,
        size_bytes: u64,
        page_count: Option<u32>,
        mime_type: &str,
    ) -> std::result::Result<(), FileRejection> {
        self.limits.check(size_bytes, page_count, mime_type)
    }

    /// Indexes a parsed document under the job and records the success.
    ///
    /// Returns `None` without indexing when the job is unknown or finished.
    pub fn record_success(
        &self,
        job_id: &str,
        filename: &str,
        metadata: Metadata,
        duration_seconds: f64,
        parser_class: &str,
    ) -> Option<DocumentId> {
        if !self.jobs.accepts_results(job_id) {
            log::warn!(
                "Not indexing {}: job {} is unknown or finished",
                filename,
                job_id
            );
            return None;
        }
        let doc_id = self.search.index_job_document(&metadata, filename, job_id);
        self.jobs
            .add_file_result(job_id, FileResult::success(filename, metadata));
        self.metrics
            .record_document_processing(duration_seconds, true, parser_class);
        Some(doc_id)
    }

    /// Records a failed file. With a `skip_reason` the file counts as skipped
    /// rather than failed.
    pub fn record_failure(
        &self,
        job_id: &str,
        filename: &str,
        error: &str,
        skip_reason: Option<&str>,
        duration_seconds: f64,
        parser_class: &str,
    ) {
        let result = match skip_reason.filter(|r| !r.is_empty()) {
            Some(reason) => FileResult::skipped(filename, reason, error),
            None => FileResult::failure(filename, error),
        };
        self.jobs.add_file_result(job_id, result);
        self.metrics
            .record_document_processing(duration_seconds, false, parser_class);
    }

    /// Records a file refused by [`check_file`](Self::check_file). Nothing was
    /// parsed, so document metrics are left alone.
    pub fn record_rejection(&self, job_id: &str, filename: &str, rejection: &FileRejection) {
        self.jobs.add_file_result(
            job_id,
            FileResult::skipped(filename, rejection.reason_key(), rejection.message.clone()),
        );
    }

    /// Completes the job in the ledger and in metrics, handing metrics the
    /// final outcome counters first.
    pub fn finish_batch(&self, job_id: &str, success: bool) {
        if let Some(details) = self.jobs.get_job_status(job_id) {
            let job = details.job;
            self.metrics.update_job_progress(
                job_id,
                job.successful_files,
                job.failed_files,
                job.skipped_files,
            );
        }
        self.jobs.complete_job(job_id, success);
        self.metrics.complete_job(job_id, success);
    }

    /// Deletes a job's files, ledger entry and indexed documents.
    pub fn delete_job(&self, job_id: &str) -> bool {
        let removed_job = self.jobs.delete_job(job_id);
        let removed_docs = self.search.remove_job_documents(job_id);
        removed_job || removed_docs > 0
    }

    /// Deletes every known job. Returns how many were removed.
    pub fn delete_all_jobs(&self) -> usize {
        let removed = self
            .jobs
            .job_ids()
            .iter()
            .filter(|job_id| self.delete_job(job_id))
            .count();
        log::info!("Deleted {} jobs", removed);
        removed
    }
}
