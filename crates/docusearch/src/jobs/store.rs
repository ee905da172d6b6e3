//! Job store with file-backed snapshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::Config;
use crate::error::StorageError;
use crate::jobs::model::{DataSource, FileResult, Job, JobDetails, JobStatus, JobSummary};
use crate::jobs::results_log;
use crate::storage;
use crate::sync;

const METADATA_EXT: &str = "json";
const RESULTS_PREFIX: &str = "job_";
const RESULTS_SUFFIX: &str = "_results.jsonl";

/// In-memory job ledger mirrored to one JSON file per job.
///
/// Every mutation happens under the ledger write lock and the job's snapshot
/// is written before the lock is released, so snapshots of a job are never
/// written out of order.
pub struct JobStore {
    metadata_dir: PathBuf,
    results_dir: PathBuf,
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    /// Opens the store and reconstructs the ledger from disk.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        metadata_dir: P,
        results_dir: Q,
    ) -> Result<Self, StorageError> {
        let metadata_dir = metadata_dir.as_ref().to_path_buf();
        let results_dir = results_dir.as_ref().to_path_buf();
        storage::ensure_directory(&metadata_dir)?;
        storage::ensure_directory(&results_dir)?;

        let store = Self {
            metadata_dir,
            results_dir,
            jobs: RwLock::new(HashMap::new()),
        };
        store.load_existing_jobs();
        Ok(store)
    }

    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        Self::open(config.job_metadata_dir(), config.job_results_dir())
    }

    pub fn metadata_path(&self, job_id: &str) -> PathBuf {
        self.metadata_dir.join(format!("{}.{}", job_id, METADATA_EXT))
    }

    /// Location of the JSONL results log for `job_id` (may not exist yet).
    pub fn results_log_path(&self, job_id: &str) -> PathBuf {
        self.results_dir
            .join(format!("{}{}{}", RESULTS_PREFIX, job_id, RESULTS_SUFFIX))
    }

    /// Creates a job in `Processing` state and persists it. Returns its id.
    pub fn create_job(
        &self,
        total_files: u32,
        metadata_options: &[String],
        data_source: DataSource,
    ) -> String {
        let mut jobs = sync::write(&self.jobs, "Job store");

        let job_id = loop {
            let candidate = short_id();
            if !jobs.contains_key(&candidate) && !self.metadata_path(&candidate).exists() {
                break candidate;
            }
        };

        let job = Job::new(job_id.clone(), total_files, metadata_options, data_source);
        self.save_metadata(&job);
        jobs.insert(job_id.clone(), job);

        log::info!(
            "Created job {} ({} files, source {})",
            job_id,
            total_files,
            data_source
        );
        job_id
    }

    /// Overwrites the progress counters of a running job.
    pub fn update_job_progress(
        &self,
        job_id: &str,
        current_file: &str,
        processed: u32,
        successful: u32,
        failed: u32,
    ) {
        self.mutate(job_id, "update progress", |job| {
            job.apply_progress(current_file, processed, successful, failed);
        });
    }

    /// Appends a per-file outcome to a running job.
    pub fn add_file_result(&self, job_id: &str, result: FileResult) {
        self.mutate(job_id, "add file result", |job| job.apply_result(result));
    }

    /// Finalizes a job, writing its results log and final snapshot.
    pub fn complete_job(&self, job_id: &str, success: bool) {
        let mut jobs = sync::write(&self.jobs, "Job store");
        let Some(job) = jobs.get_mut(job_id) else {
            log::debug!("complete_job: unknown job {}", job_id);
            return;
        };
        let next = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        if !job.status.can_transition_to(next) {
            log::warn!("complete_job: job {} is already {}", job_id, job.status);
            return;
        }

        job.finish(success);

        let log_path = self.results_log_path(job_id);
        if let Err(e) = results_log::write(&log_path, job) {
            log::error!("Failed to write results log for job {}: {}", job_id, e);
        }
        self.save_metadata(job);

        log::info!(
            "Job {} {} ({} ok, {} failed, {} skipped in {:.2}s)",
            job_id,
            job.status,
            job.successful_files,
            job.failed_files,
            job.skipped_files,
            job.processing_time()
        );
    }

    /// Whether `job_id` names a job that is still processing.
    pub fn accepts_results(&self, job_id: &str) -> bool {
        let jobs = sync::read(&self.jobs, "Job store");
        jobs.get(job_id).is_some_and(|job| !job.is_finished())
    }

    /// Returns the live job, or `None` if it is unknown.
    pub fn get_job_status(&self, job_id: &str) -> Option<JobDetails> {
        let jobs = sync::read(&self.jobs, "Job store");
        jobs.get(job_id).cloned().map(JobDetails::from)
    }

    /// Like [`get_job_status`](Self::get_job_status), but reloads per-file
    /// results from the results log when none are held in memory.
    pub fn get_job_results(&self, job_id: &str) -> Option<JobDetails> {
        let needs_reload = {
            let jobs = sync::read(&self.jobs, "Job store");
            jobs.get(job_id)?.results.is_empty()
        };

        if needs_reload {
            let path = self.results_log_path(job_id);
            if path.exists() {
                match results_log::read(&path) {
                    Ok((_, results)) if !results.is_empty() => {
                        let mut jobs = sync::write(&self.jobs, "Job store");
                        if let Some(job) = jobs.get_mut(job_id) {
                            if job.results.is_empty() {
                                job.results = results;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Failed to reload results for job {}: {}", job_id, e),
                }
            }
        }

        self.get_job_status(job_id)
    }

    /// One summary per known job, newest first (ties by id).
    pub fn list_jobs(&self) -> Vec<JobSummary> {
        let jobs = sync::read(&self.jobs, "Job store");
        let mut summaries: Vec<JobSummary> = jobs.values().map(Job::summary).collect();
        summaries.sort_by(|a, b| {
            b.start_time
                .cmp(&a.start_time)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        summaries
    }

    pub fn job_ids(&self) -> Vec<String> {
        let jobs = sync::read(&self.jobs, "Job store");
        let mut ids: Vec<String> = jobs.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        sync::read(&self.jobs, "Job store").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a job from memory along with its metadata file and results
    /// log. Returns true if anything was removed.
    pub fn delete_job(&self, job_id: &str) -> bool {
        let mut jobs = sync::write(&self.jobs, "Job store");
        let mut removed = jobs.remove(job_id).is_some();

        for path in [self.metadata_path(job_id), self.results_log_path(job_id)] {
            match storage::remove_if_exists(&path) {
                Ok(existed) => removed |= existed,
                Err(e) => log::error!("Failed to delete {}: {}", path.display(), e),
            }
        }

        if removed {
            log::info!("Deleted job {}", job_id);
        }
        removed
    }

    /// Applies `f` to a running job and persists it. Unknown ids are ignored,
    /// as are jobs that already reached a terminal state.
    fn mutate<F>(&self, job_id: &str, action: &str, f: F)
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = sync::write(&self.jobs, "Job store");
        let Some(job) = jobs.get_mut(job_id) else {
            log::debug!("{}: unknown job {}", action, job_id);
            return;
        };
        if job.is_finished() {
            log::warn!("{}: job {} is already {}, ignoring", action, job_id, job.status);
            return;
        }

        f(job);
        self.save_metadata(job);
    }

    fn save_metadata(&self, job: &Job) {
        let path = self.metadata_path(&job.job_id);
        if let Err(e) = storage::write_json_atomic(&path, job) {
            log::error!("Failed to save metadata for job {}: {}", job.job_id, e);
        }
    }

    /// Loads every metadata snapshot, then rebuilds jobs that only have a
    /// results log. Snapshot state wins for ids present in both.
    fn load_existing_jobs(&self) {
        let _span = tracing::info_span!("jobs.reconstruct").entered();
        let mut jobs = sync::write(&self.jobs, "Job store");

        for (job_id, path) in list_files(&self.metadata_dir, |name| {
            name.strip_suffix(".json").map(str::to_string)
        }) {
            match storage::read_json::<Job>(&path) {
                Ok(mut job) => {
                    if job.job_id != job_id {
                        log::warn!(
                            "Job file {} declares id {}, using file name",
                            path.display(),
                            job.job_id
                        );
                        job.job_id = job_id.clone();
                    }
                    jobs.insert(job_id, job);
                }
                Err(e) => log::warn!("Skipping job metadata {}: {}", path.display(), e),
            }
        }
        let from_metadata = jobs.len();

        for (job_id, path) in list_files(&self.results_dir, |name| {
            name.strip_prefix(RESULTS_PREFIX)
                .and_then(|rest| rest.strip_suffix(RESULTS_SUFFIX))
                .map(str::to_string)
        }) {
            if jobs.contains_key(&job_id) {
                continue;
            }
            match results_log::read(&path) {
                Ok((summary, results)) => {
                    let mut job = summary.into_job(results);
                    job.job_id = job_id.clone();
                    jobs.insert(job_id, job);
                }
                Err(e) => log::warn!("Skipping results log {}: {}", path.display(), e),
            }
        }

        log::info!(
            "Loaded {} jobs ({} from snapshots, {} from results logs)",
            jobs.len(),
            from_metadata,
            jobs.len() - from_metadata
        );
    }
}

/// Lists `(key, path)` for files in `dir` whose name `key_of` accepts,
/// sorted by key.
fn list_files<F>(dir: &Path, key_of: F) -> Vec<(String, PathBuf)>
where
    F: Fn(&str) -> Option<String>,
{
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let key = path.file_name()?.to_str().and_then(&key_of)?;
            (!key.is_empty()).then_some((key, path))
        })
        .collect();
    files.sort();
    files
}

/// Eight hex characters from a fresh v4 UUID.
fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
