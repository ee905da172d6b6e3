//! Prometheus text exposition of a [`MetricsSummary`].
//!
//! Finite histogram buckets are emitted as 0: only `+Inf`, `_sum` and
//! `_count` carry values, matching what existing dashboards were built on.

use std::fmt::Display;
use std::fmt::Write;

use crate::metrics::aggregator::MetricsSummary;

const PREFIX: &str = "docuparse";
const JOB_BUCKETS: [&str; 5] = ["0.1", "1", "10", "60", "300"];
const DOCUMENT_BUCKETS: [&str; 5] = ["0.1", "1", "5", "10", "30"];

struct Exposition {
    out: String,
}

impl Exposition {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn header(&mut self, name: &str, kind: &str, help: &str) {
        let _ = writeln!(self.out, "# HELP {}_{} {}", PREFIX, name, help);
        let _ = writeln!(self.out, "# TYPE {}_{} {}", PREFIX, name, kind);
    }

    fn sample(&mut self, name: &str, value: impl Display) {
        let _ = writeln!(self.out, "{}_{} {}", PREFIX, name, value);
    }

    fn counter(&mut self, name: &str, help: &str, value: impl Display) {
        self.header(name, "counter", help);
        self.sample(name, value);
    }

    fn gauge(&mut self, name: &str, help: &str, value: impl Display) {
        self.header(name, "gauge", help);
        self.sample(name, value);
    }

    fn histogram(&mut self, name: &str, help: &str, buckets: &[&str], sum: f64, count: u64) {
        self.header(name, "histogram", help);
        for le in buckets {
            let _ = writeln!(self.out, "{}_{}_bucket{{le=\"{}\"}} 0", PREFIX, name, le);
        }
        let _ = writeln!(self.out, "{}_{}_bucket{{le=\"+Inf\"}} {}", PREFIX, name, count);
        let _ = writeln!(self.out, "{}_{}_sum {}", PREFIX, name, sum);
        let _ = writeln!(self.out, "{}_{}_count {}", PREFIX, name, count);
    }
}

pub fn render(summary: &MetricsSummary) -> String {
    let jobs = &summary.jobs;
    let docs = &summary.documents;
    let mut exp = Exposition::new();

    exp.counter("jobs_total", "Total number of jobs", jobs.total);
    exp.counter(
        "jobs_successful_total",
        "Total number of successful jobs",
        jobs.successful,
    );
    exp.counter("jobs_failed_total", "Total number of failed jobs", jobs.failed);
    exp.gauge(
        "jobs_processing_current",
        "Current number of jobs being processed",
        jobs.currently_processing,
    );
    exp.histogram(
        "job_processing_time_seconds",
        "Job processing time in seconds",
        &JOB_BUCKETS,
        jobs.avg_processing_time_seconds * jobs.total as f64,
        jobs.total as u64,
    );

    exp.counter(
        "documents_processed_total",
        "Total number of documents processed",
        docs.total_processed,
    );
    exp.counter(
        "documents_successful_total",
        "Total number of successfully processed documents",
        docs.total_successful,
    );
    exp.counter(
        "documents_failed_total",
        "Total number of failed document processing",
        docs.total_failed,
    );
    exp.counter(
        "documents_skipped_total",
        "Total number of skipped documents",
        docs.total_skipped,
    );
    exp.histogram(
        "document_processing_time_seconds",
        "Document processing time in seconds",
        &DOCUMENT_BUCKETS,
        docs.total_processing_time_seconds,
        docs.total_processed,
    );

    exp.gauge(
        "system_uptime_seconds",
        "System uptime in seconds",
        summary.system.uptime_seconds,
    );

    exp.out
}
