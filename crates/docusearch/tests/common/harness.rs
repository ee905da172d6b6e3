//! Test harness for isolated end-to-end runs.
//!
//! `TestHarness` owns a temporary data directory and a `Services` instance
//! opened on it. `restart` drops the services and reopens them from disk,
//! which is how reconstruction is exercised.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use docusearch::{Config, DataSource, Services};

pub struct TestHarness {
    /// Temporary directory used as the data directory.
    temp_dir: TempDir,
    /// Config rooted at `temp_dir`.
    pub config: Config,
    /// Services opened on `config`.
    pub services: Services,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self::with_config(temp_dir, |_| {})
    }

    /// Create a harness whose config is adjusted by `customize` before the
    /// services are opened.
    pub fn with_config<F: FnOnce(&mut Config)>(temp_dir: TempDir, customize: F) -> Self {
        let mut config = Config::with_data_directory(temp_dir.path());
        customize(&mut config);
        let services = Services::open(&config).expect("Failed to open services");
        Self {
            temp_dir,
            config,
            services,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Reopen all services from the files on disk. In-memory state that was
    /// never persisted (the search index, active metrics) is lost.
    pub fn restart(&mut self) {
        self.services = Services::open(&self.config).expect("Failed to reopen services");
    }

    /// Start a local batch with the given metadata options.
    pub fn start_batch(&self, total_files: u32, options: &[&str]) -> String {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        self.services
            .start_batch(total_files, &options, DataSource::Local)
    }

    pub fn metadata_file(&self, job_id: &str) -> PathBuf {
        self.services.jobs.metadata_path(job_id)
    }

    pub fn results_log(&self, job_id: &str) -> PathBuf {
        self.services.jobs.results_log_path(job_id)
    }

    /// Lines of a job's results log.
    pub fn read_results_log(&self, job_id: &str) -> Vec<serde_json::Value> {
        let content =
            std::fs::read_to_string(self.results_log(job_id)).expect("Failed to read results log");
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("Malformed results log line"))
            .collect()
    }

    /// Write raw bytes into the data directory.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}
