use std::io::Write;

use anyhow::{bail, Context, Result};
use docusearch::config::{apply_env_overrides, load_config, validate_config};
use docusearch::{Config, Services};
use serde::Serialize;

use crate::cli::{Cli, Commands, JobArgs, MetricsArgs};

/// Config file (or defaults plus environment overrides), then `--data-dir`.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let mut config = Config::default();
            apply_env_overrides(&mut config).context("applying environment overrides")?;
            config
        }
    };

    if let Some(dir) = &cli.data_dir {
        config.data_directory = dir.clone();
    }
    validate_config(&config).context("validating config")?;
    Ok(config)
}

pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let config = resolve_config(cli)?;
    let services = Services::open(&config).context("opening data directory")?;

    match &cli.command {
        Commands::Jobs => print_json(out, &services.jobs.list_jobs()),
        Commands::Job(args) => show_job(&services, args, out),
        Commands::DeleteJob(args) => {
            if !services.delete_job(&args.job_id) {
                bail!("job {} not found", args.job_id);
            }
            writeln!(out, "deleted job {}", args.job_id)?;
            Ok(())
        }
        Commands::Metrics(args) => show_metrics(&services, args, out),
        Commands::ResetMetrics => {
            services.metrics.reset_metrics();
            writeln!(out, "metrics reset")?;
            Ok(())
        }
    }
}

fn show_job<W: Write>(services: &Services, args: &JobArgs, out: &mut W) -> Result<()> {
    let details = if args.results {
        services.jobs.get_job_results(&args.job_id)
    } else {
        services.jobs.get_job_status(&args.job_id)
    };
    let Some(mut details) = details else {
        bail!("job {} not found", args.job_id);
    };
    if !args.results {
        details.job.results.clear();
    }
    print_json(out, &details)
}

fn show_metrics<W: Write>(services: &Services, args: &MetricsArgs, out: &mut W) -> Result<()> {
    if args.prometheus {
        write!(out, "{}", services.metrics.get_prometheus_metrics())?;
        return Ok(());
    }
    print_json(out, &services.metrics.get_metrics_summary())
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
