//! Cron schedules and the scheduler that ticks every job's trigger.

use crate::cancel::CancelToken;
use crate::cause::FilesFoundTriggerCause;
use crate::error::{FilesFoundError, Result};
use crate::node::NodeRegistry;
use crate::queue::BuildQueue;
use crate::trigger::{FilesFoundTrigger, TriggerContext};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Convert a 5- or 6-field cron expression to the 7-field form the `cron`
/// crate expects.
///
/// Standard cron: `min hour day month weekday`
/// Cron crate:    `sec min hour day month weekday year`
///
/// A 6-field expression is the standard form plus a year. Numeric weekdays
/// in both short forms use standard numbering and are remapped; 7-field
/// expressions are passed through as the crate's own syntax.
pub fn normalize_cron_expression(expr: &str) -> String {
    let mut fields: Vec<String> = expr.split_whitespace().map(str::to_string).collect();
    match fields.len() {
        5 => {
            fields[4] = remap_weekdays(&fields[4]);
            format!("0 {} *", fields.join(" "))
        }
        6 => {
            fields[4] = remap_weekdays(&fields[4]);
            format!("0 {}", fields.join(" "))
        }
        _ => fields.join(" "),
    }
}

/// Standard cron numbers weekdays 0-7 with Sunday as both 0 and 7; the
/// `cron` crate uses 1-7 with Sunday as 1. Numeric items are rewritten as
/// explicit day lists; names and `*` pass through.
fn remap_weekdays(field: &str) -> String {
    field
        .split(',')
        .map(remap_weekday_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn remap_weekday_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };
    let bounds = match range.split_once('-') {
        Some((start, end)) => (start.parse::<u8>(), end.parse::<u8>()),
        None => (range.parse::<u8>(), range.parse::<u8>()),
    };
    let (start, end) = match bounds {
        (Ok(start), Ok(end)) if start <= end && end <= 7 => (start, end),
        _ => return item.to_string(),
    };
    // `n/step` runs from n to the end of the week.
    let end = if step.is_some() && !range.contains('-') { 7 } else { end };
    let step = match step.map(str::parse::<usize>) {
        None => 1,
        Some(Ok(step)) if step > 0 => step,
        _ => return item.to_string(),
    };

    let mut days: Vec<u8> = (start..=end)
        .step_by(step)
        .map(|day| if day == 0 || day == 7 { 1 } else { day + 1 })
        .collect();
    days.sort_unstable();
    days.dedup();
    days.iter().map(u8::to_string).collect::<Vec<_>>().join(",")
}

pub fn parse_schedule(spec: &str) -> Result<Schedule> {
    normalize_cron_expression(spec)
        .parse()
        .map_err(|e: cron::error::Error| FilesFoundError::Schedule {
            spec: spec.trim().to_string(),
            message: e.to_string(),
        })
}

/// A trigger bound to the job it builds.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub name: String,
    pub trigger: Arc<FilesFoundTrigger>,
    pub quiet_period: Duration,
}

/// Host services shared by every job.
struct Shared {
    properties: BTreeMap<String, String>,
    nodes: NodeRegistry,
    queue: Arc<dyn BuildQueue>,
    cancel: CancelToken,
}

impl Shared {
    fn evaluate(&self, job: &ScheduledJob) -> Option<FilesFoundTriggerCause> {
        job.trigger.run(&TriggerContext {
            job: &job.name,
            properties: &self.properties,
            nodes: &self.nodes,
            queue: self.queue.as_ref(),
            quiet_period: job.quiet_period,
            cancel: &self.cancel,
        })
    }
}

/// Runs each job's trigger on its schedule.
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(
        jobs: Vec<ScheduledJob>,
        properties: BTreeMap<String, String>,
        nodes: NodeRegistry,
        queue: Arc<dyn BuildQueue>,
    ) -> Self {
        Self {
            jobs,
            shared: Arc::new(Shared {
                properties,
                nodes,
                queue,
                cancel: CancelToken::new(),
            }),
        }
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    /// Token cancelled when the scheduler shuts down.
    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel.clone()
    }

    /// Evaluate one job immediately on the current thread.
    pub fn evaluate(&self, job: &ScheduledJob) -> Option<FilesFoundTriggerCause> {
        self.shared.evaluate(job)
    }

    /// Run every job until `shutdown` fires.
    ///
    /// On shutdown in-flight scans are cancelled and every job task is
    /// awaited before returning.
    pub async fn run(self, shutdown: broadcast::Sender<()>) {
        let mut stop = shutdown.subscribe();
        let mut tasks = Vec::with_capacity(self.jobs.len());
        for job in self.jobs {
            info!(job = %job.name, schedule = %job.trigger.spec(), "Scheduling job");
            tasks.push(tokio::spawn(run_job(
                job,
                Arc::clone(&self.shared),
                shutdown.subscribe(),
            )));
        }

        let _ = stop.recv().await;
        info!("Scheduler shutting down");
        self.shared.cancel.cancel();

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Job task failed");
            }
        }
    }
}

async fn run_job(job: ScheduledJob, shared: Arc<Shared>, mut shutdown: broadcast::Receiver<()>) {
    let mut after: DateTime<Utc> = Utc::now();
    loop {
        let Some(next) = job.trigger.schedule().after(&after).next() else {
            warn!(job = %job.name, "Schedule has no upcoming occurrences");
            return;
        };
        let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        debug!(job = %job.name, next = %next, "Waiting for next tick");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.recv() => return,
        }

        let tick_job = job.clone();
        let tick_shared = Arc::clone(&shared);
        match tokio::task::spawn_blocking(move || tick_shared.evaluate(&tick_job)).await {
            Ok(Some(cause)) => debug!(job = %job.name, cause = %cause, "Tick scheduled a build"),
            Ok(None) => debug!(job = %job.name, "Tick found nothing"),
            Err(e) => error!(job = %job.name, error = %e, "Tick panicked"),
        }

        if shared.cancel.is_cancelled() {
            return;
        }
        after = next.max(Utc::now());
    }
}
