//! End-to-end batch flows through the job ledger, search index and metrics,
//! including reconstruction after a restart.

mod common;

use common::{MetadataBuilder, TestHarness};
use docusearch::jobs::SkipReason;
use docusearch::{DataSource, FileResult, JobStatus};

#[test]
fn test_job_lifecycle_writes_matching_results_log() {
    let harness = TestHarness::new();
    let jobs = &harness.services.jobs;

    let job_id = jobs.create_job(
        3,
        &["title".to_string(), "author".to_string()],
        DataSource::Local,
    );
    let job = jobs.get_job_status(&job_id).unwrap().job;
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.total_files, 3);
    assert!(harness.metadata_file(&job_id).exists());

    jobs.add_file_result(
        &job_id,
        FileResult::success("a.pdf", MetadataBuilder::new().title("X").build()),
    );
    assert_eq!(jobs.get_job_status(&job_id).unwrap().job.successful_files, 1);

    jobs.complete_job(&job_id, true);

    let details = jobs.get_job_status(&job_id).unwrap();
    assert_eq!(details.job.status, JobStatus::Completed);
    assert_eq!(details.job.progress_percentage, 100);
    assert!(details.job.end_time.is_some());
    assert!(details.processing_time >= 0.0);

    let lines = harness.read_results_log(&job_id);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["job_id"], job_id.as_str());
    assert_eq!(lines[0]["status"], "Completed");
    assert_eq!(lines[0]["total_files"], 3);
    assert_eq!(lines[0]["successful_files"], 1);
    assert_eq!(lines[0]["metadata_options"][1], "author");
    assert_eq!(lines[1]["filename"], "a.pdf");
    assert_eq!(lines[1]["metadata"]["title"], "X");
}

#[test]
fn test_metrics_scenario() {
    let harness = TestHarness::new();
    let metrics = &harness.services.metrics;

    metrics.start_job("j1", 5);
    for _ in 0..5 {
        metrics.record_document_processing(1.2, true, "local");
    }
    metrics.complete_job("j1", true);

    let summary = metrics.get_metrics_summary();
    assert_eq!(summary.documents.total_processed, 5);
    assert_eq!(summary.jobs.total, 1);
}

#[test]
fn test_full_batch_is_searchable_and_counted() {
    let harness = TestHarness::new();
    let services = &harness.services;

    let job_id = harness.start_batch(4, &["title", "author", "title"]);
    let files = [
        (
            "flask.pdf",
            MetadataBuilder::new()
                .title("Flask Guide")
                .author("Miguel", "Grinberg")
                .topic("Web development")
                .build(),
        ),
        (
            "rust.pdf",
            MetadataBuilder::new()
                .title("Programming Rust")
                .legacy_author("Jim Blandy")
                .abstract_text("Systems programming with a web of guarantees")
                .build(),
        ),
    ];
    for (filename, metadata) in files {
        services.begin_file(&job_id, filename);
        services.record_success(&job_id, filename, metadata, 0.5, "llm");
    }

    services.begin_file(&job_id, "huge.pdf");
    let rejection = services
        .check_file(200 * 1024 * 1024, Some(3), "application/pdf")
        .unwrap_err();
    assert_eq!(rejection.reason, SkipReason::FileSizeLimit);
    services.record_rejection(&job_id, "huge.pdf", &rejection);

    services.begin_file(&job_id, "broken.pdf");
    services.record_failure(&job_id, "broken.pdf", "PDF is not readable", None, 0.2, "local");
    services.finish_batch(&job_id, true);

    let job = services.jobs.get_job_status(&job_id).unwrap().job;
    assert_eq!(job.metadata_options, vec!["title", "author"]);
    assert_eq!(job.processed_files, 4);
    assert_eq!(job.successful_files, 2);
    assert_eq!(job.skipped_files, 1);
    assert_eq!(job.skipped_reasons.file_size_limit, 1);
    assert_eq!(job.failed_files, 1);
    assert_eq!(job.corrupt_files, 1);
    assert!(job.successful_files + job.failed_files + job.skipped_files <= job.total_files);

    let hits = services.search.search("web", 10);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.snippet.to_lowercase().contains("web")));

    let hits = services.search.search("grinberg", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "flask.pdf");

    let summary = services.metrics.get_metrics_summary();
    assert_eq!(summary.documents.total_processed, 4);
    assert_eq!(summary.documents.total_successful, 2);
    assert_eq!(summary.documents.total_failed, 1);
    assert_eq!(summary.documents.total_skipped, 1);
    assert_eq!(summary.documents.llm.processed, 2);
    assert_eq!(summary.documents.local.failed, 1);
}

#[test]
fn test_progress_is_monotone_and_clamped() {
    let harness = TestHarness::new();
    let jobs = &harness.services.jobs;
    let job_id = jobs.create_job(3, &[], DataSource::Local);

    jobs.update_job_progress(&job_id, "a", 2, 2, 0);
    jobs.update_job_progress(&job_id, "b", 1, 1, 0);
    let job = jobs.get_job_status(&job_id).unwrap().job;
    assert_eq!(job.processed_files, 2);
    assert_eq!(job.progress_percentage, 66);

    jobs.update_job_progress(&job_id, "c", 10, 10, 10);
    let job = jobs.get_job_status(&job_id).unwrap().job;
    assert_eq!(job.processed_files, 3);
    assert_eq!(job.progress_percentage, 100);
    assert!(job.successful_files + job.failed_files + job.skipped_files <= 3);
}

#[test]
fn test_finished_jobs_are_immutable() {
    let harness = TestHarness::new();
    let jobs = &harness.services.jobs;
    let job_id = jobs.create_job(2, &[], DataSource::Local);
    jobs.complete_job(&job_id, false);
    let before = jobs.get_job_status(&job_id).unwrap();

    jobs.add_file_result(&job_id, FileResult::success("late.pdf", Default::default()));
    jobs.update_job_progress(&job_id, "late.pdf", 2, 2, 0);
    jobs.complete_job(&job_id, true);

    let after = jobs.get_job_status(&job_id).unwrap();
    assert_eq!(after.job, before.job);
    assert_eq!(after.job.status, JobStatus::Failed);
}

#[test]
fn test_restart_restores_jobs_and_metrics() {
    let mut harness = TestHarness::new();
    let job_id = harness.start_batch(2, &["title"]);
    harness.services.record_success(
        &job_id,
        "a.pdf",
        MetadataBuilder::new().title("Persisted").build(),
        0.3,
        "local",
    );
    harness
        .services
        .record_failure(&job_id, "b.pdf", "timeout", None, 0.3, "local");
    harness.services.finish_batch(&job_id, true);
    let running = harness.start_batch(1, &[]);

    let before = harness.services.jobs.get_job_status(&job_id).unwrap();
    harness.restart();

    let after = harness.services.jobs.get_job_status(&job_id).unwrap();
    assert_eq!(after.job, before.job);
    assert_eq!(
        harness.services.jobs.get_job_status(&running).unwrap().job.status,
        JobStatus::Processing
    );

    let summary = harness.services.metrics.get_metrics_summary();
    assert_eq!(summary.jobs.total, 1);
    assert_eq!(summary.jobs.currently_processing, 0);
    assert_eq!(summary.documents.total_processed, 2);

    assert_eq!(harness.services.search.get_document_count(), 0);
}

#[test]
fn test_results_log_only_jobs_are_reconstructed() {
    let mut harness = TestHarness::new();
    let job_id = harness.start_batch(2, &["title"]);
    harness
        .services
        .record_success(&job_id, "a.pdf", MetadataBuilder::new().title("A").build(), 0.1, "local");
    harness.services.record_failure(
        &job_id,
        "b.bin",
        "Unsupported file type",
        Some("unknown_format"),
        0.0,
        "local",
    );
    harness.services.finish_batch(&job_id, true);

    std::fs::remove_file(harness.metadata_file(&job_id)).unwrap();
    harness.restart();

    let job = harness.services.jobs.get_job_results(&job_id).unwrap().job;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.successful_files, 1);
    assert_eq!(job.skipped_files, 1);
    assert_eq!(job.skipped_reasons.unknown_format, 1);
    assert_eq!(job.processed_files, 2);
    assert_eq!(job.progress_percentage, 100);
    assert_eq!(job.results.len(), 2);
    assert_eq!(job.results[1].skip_reason.as_deref(), Some("unknown_format"));
}

#[test]
fn test_snapshot_wins_over_results_log() {
    let mut harness = TestHarness::new();
    let job_id = harness.start_batch(1, &[]);
    harness.services.finish_batch(&job_id, true);

    // Doctor the log so the two sources disagree.
    let log = harness.results_log(&job_id);
    let content = std::fs::read_to_string(&log).unwrap();
    std::fs::write(&log, content.replacen("\"Completed\"", "\"Failed\"", 1)).unwrap();

    harness.restart();
    assert_eq!(
        harness.services.jobs.get_job_status(&job_id).unwrap().job.status,
        JobStatus::Completed
    );
}

#[test]
fn test_malformed_files_are_skipped_on_startup() {
    let mut harness = TestHarness::new();
    let good = harness.start_batch(1, &[]);

    harness.write_file("job_metadata/deadbeef.json", "{ truncated");
    harness.write_file("job_results/job_cafebabe_results.jsonl", "not json\n");
    harness.write_file("job_results/job_emptyone_results.jsonl", "");
    harness.write_file("metrics.json", "[1, 2");

    harness.restart();

    let ids = harness.services.jobs.job_ids();
    assert_eq!(ids, vec![good]);
    assert_eq!(harness.services.metrics.get_metrics_summary().jobs.total, 0);
}

#[test]
fn test_legacy_results_log_with_naive_timestamps() {
    let mut harness = TestHarness::new();
    harness.write_file(
        "job_results/job_1eac7000_results.jsonl",
        concat!(
            r#"{"job_id": "1eac7000", "status": "Completed", "total_files": 2, "successful_files": 1, "failed_files": 1, "skipped_files": 0, "skipped_reasons": {"unknown_format": 0, "file_size_limit": 0, "page_limit": 0}, "corrupt_files": 1, "start_time": "2024-03-01T10:00:00.250000", "end_time": "2024-03-01T10:00:04.750000", "processing_time_seconds": 4.5, "metadata_options": ["title"]}"#,
            "\n",
            r#"{"filename": "a.pdf", "success": true, "timestamp": "2024-03-01T10:00:02.000000", "metadata": {"title": "Old"}, "error": null, "skip_reason": null}"#,
            "\n",
            "{ garbage line\n",
            r#"{"filename": "b.pdf", "success": false, "timestamp": "2024-03-01T10:00:04.000000", "metadata": {}, "error": "File appears corrupt", "skip_reason": null}"#,
            "\n",
        ),
    );

    harness.restart();

    let details = harness.services.jobs.get_job_results("1eac7000").unwrap();
    assert_eq!(details.job.status, JobStatus::Completed);
    assert_eq!(details.job.corrupt_files, 1);
    assert_eq!(details.job.results.len(), 2);
    assert!((details.processing_time - 4.5).abs() < 1e-6);
}

#[test]
fn test_list_jobs_newest_first() {
    let harness = TestHarness::new();
    let first = harness.start_batch(1, &[]);
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = harness.start_batch(1, &[]);

    let listed: Vec<String> = harness
        .services
        .jobs
        .list_jobs()
        .into_iter()
        .map(|summary| summary.job_id)
        .collect();
    assert_eq!(listed, vec![second, first]);
}

#[test]
fn test_concurrent_batches_do_not_lose_results() {
    let harness = TestHarness::new();
    let services = harness.services.clone();

    let handles: Vec<_> = (0..4)
        .map(|batch| {
            let services = services.clone();
            std::thread::spawn(move || {
                let job_id = services.start_batch(10, &[], DataSource::Local);
                for i in 0..10 {
                    let filename = format!("b{}-{}.pdf", batch, i);
                    services.begin_file(&job_id, &filename);
                    services.record_success(
                        &job_id,
                        &filename,
                        MetadataBuilder::new().title("concurrent report").build(),
                        0.01,
                        "local",
                    );
                }
                services.finish_batch(&job_id, true);
                job_id
            })
        })
        .collect();

    for handle in handles {
        let job_id = handle.join().unwrap();
        let job = services.jobs.get_job_results(&job_id).unwrap().job;
        assert_eq!(job.successful_files, 10);
        assert_eq!(job.results.len(), 10);
        assert_eq!(job.processed_files, 10);
    }

    assert_eq!(services.search.get_document_count(), 40);
    let summary = services.metrics.get_metrics_summary();
    assert_eq!(summary.jobs.total, 4);
    assert_eq!(summary.documents.total_processed, 40);
    assert_eq!(summary.documents.local.processed, 40);
}
