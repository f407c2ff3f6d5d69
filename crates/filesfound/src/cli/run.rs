//! `run` and `tick`: evaluate job triggers on schedule or once.

use super::load_settings;
use anyhow::{bail, Context, Result};
use filesfound::{BuildQueue, Scheduler};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub fn run(config: &Path) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let jobs = settings.scheduled_jobs().context("Invalid settings")?;
    if jobs.is_empty() {
        warn!(path = %config.display(), "No jobs configured");
    }

    let queue: Arc<dyn BuildQueue> = Arc::new(settings.build_queue());
    let scheduler = Scheduler::new(jobs, settings.properties.clone(), settings.node_registry(), queue);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("filesfound")
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async move {
        let (shutdown_tx, _) = broadcast::channel(1);
        let signal_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received"),
                Err(e) => warn!(error = %e, "Failed to listen for interrupt, shutting down"),
            }
            let _ = signal_tx.send(());
        });

        info!(jobs = scheduler.jobs().len(), "Scheduler started");
        scheduler.run(shutdown_tx).await;
    });

    Ok(ExitCode::SUCCESS)
}

pub fn tick(config: &Path, job: Option<&str>) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let jobs = settings.scheduled_jobs().context("Invalid settings")?;
    if let Some(name) = job {
        if !jobs.iter().any(|j| j.name == name) {
            bail!("Unknown job: {}", name);
        }
    }

    let queue = Arc::new(settings.build_queue());
    let scheduler = Scheduler::new(
        jobs,
        settings.properties.clone(),
        settings.node_registry(),
        queue.clone(),
    );

    for scheduled in scheduler.jobs() {
        if job.is_some_and(|name| name != scheduled.name) {
            continue;
        }
        match scheduler.evaluate(scheduled) {
            Some(cause) => println!("{}: {}", scheduled.name, cause),
            None => println!("{}: no build", scheduled.name),
        }
    }

    queue.wait();
    Ok(ExitCode::SUCCESS)
}
