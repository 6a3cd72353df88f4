//! cluster-ready - silences alerts on a new cluster until it is healthy.

use clap::Parser;
use ready_job::{JobConfig, LogFormat};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = JobConfig::parse();
    init_tracing(config.log_format);

    info!(
        max_cluster_age_minutes = config.max_cluster_age_minutes,
        clean_check_runs = config.clean_check_runs,
        clean_check_interval_seconds = config.clean_check_interval_seconds,
        failed_check_interval_seconds = config.failed_check_interval_seconds,
        "starting cluster readiness job"
    );

    let job = ready_job::from_config(&config)?;
    let outcome = job.run().await.inspect_err(|e| {
        error!(error = %e, "cluster readiness job failed");
    })?;

    info!(outcome = %outcome, "cluster readiness job finished");
    Ok(())
}
