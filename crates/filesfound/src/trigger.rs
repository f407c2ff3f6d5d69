//! Evaluation of a job's search configurations on each tick.

use crate::cancel::CancelToken;
use crate::cause::FilesFoundTriggerCause;
use crate::config::FilesFoundTriggerConfig;
use crate::env::EnvVars;
use crate::error::Result;
use crate::node::NodeRegistry;
use crate::queue::BuildQueue;
use crate::schedule::parse_schedule;
use cron::Schedule;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Everything one tick needs from the host.
pub struct TriggerContext<'a> {
    pub job: &'a str,
    /// Global properties layered over the process environment for expansion.
    pub properties: &'a BTreeMap<String, String>,
    pub nodes: &'a NodeRegistry,
    pub queue: &'a dyn BuildQueue,
    pub quiet_period: Duration,
    pub cancel: &'a CancelToken,
}

/// A schedule plus the ordered search configurations it evaluates.
#[derive(Debug, Clone)]
pub struct FilesFoundTrigger {
    spec: String,
    schedule: Schedule,
    configs: Vec<FilesFoundTriggerConfig>,
}

impl FilesFoundTrigger {
    /// Build a trigger. An empty configuration list is replaced by a single
    /// empty configuration.
    pub fn new(spec: &str, configs: Vec<FilesFoundTriggerConfig>) -> Result<Self> {
        let schedule = parse_schedule(spec)?;
        let configs = if configs.is_empty() {
            vec![FilesFoundTriggerConfig::default()]
        } else {
            configs
        };
        Ok(Self {
            spec: spec.trim().to_string(),
            schedule,
            configs,
        })
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn configs(&self) -> &[FilesFoundTriggerConfig] {
        &self.configs
    }

    /// Evaluate the configurations in order and schedule at most one build.
    ///
    /// The first configuration whose match count reaches its threshold wins
    /// and the rest are not evaluated. Returns the cause of the scheduled
    /// build, if any. Stops early once `ctx.cancel` is set.
    pub fn run(&self, ctx: &TriggerContext<'_>) -> Option<FilesFoundTriggerCause> {
        let vars = EnvVars::for_expansion(ctx.properties);

        for (index, config) in self.configs.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                debug!(job = %ctx.job, "Tick cancelled");
                return None;
            }

            let expanded = config.expand(&vars);
            let files = expanded.find_files(ctx.nodes, ctx.cancel);
            if ctx.cancel.is_cancelled() {
                debug!(job = %ctx.job, "Tick cancelled");
                return None;
            }

            let required = expanded.minimum_match_count();
            debug!(
                job = %ctx.job,
                config = index,
                found = files.len(),
                required,
                "Evaluated configuration"
            );
            if files.len() >= required {
                let cause = FilesFoundTriggerCause::new(&expanded);
                let accepted = ctx
                    .queue
                    .schedule_build(ctx.job, ctx.quiet_period, cause.clone());
                info!(job = %ctx.job, cause = %cause, accepted, "Files found");
                return Some(cause);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingQueue {
        builds: Mutex<Vec<(String, FilesFoundTriggerCause)>>,
    }

    impl BuildQueue for RecordingQueue {
        fn schedule_build(&self, job: &str, _quiet_period: Duration, cause: FilesFoundTriggerCause) -> bool {
            self.builds.lock().unwrap().push((job.to_string(), cause));
            true
        }
    }

    fn config(dir: &str, files: &str, trigger_number: &str) -> FilesFoundTriggerConfig {
        FilesFoundTriggerConfig::new(None, dir, files, "", trigger_number)
    }

    #[test]
    fn empty_config_list_gets_one_empty_config() {
        let trigger = FilesFoundTrigger::new("* * * * *", vec![]).unwrap();
        assert_eq!(trigger.configs(), &[FilesFoundTriggerConfig::default()]);
    }

    #[test]
    fn invalid_spec_is_rejected() {
        assert!(FilesFoundTrigger::new("not a schedule", vec![]).is_err());
    }

    #[test]
    fn expands_properties_before_searching() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "").unwrap();
        let trigger = FilesFoundTrigger::new("* * * * *", vec![config("$inbox", "*.csv", "1")]).unwrap();

        let mut properties = BTreeMap::new();
        properties.insert("inbox".to_string(), dir.path().to_string_lossy().to_string());
        let queue = RecordingQueue::default();
        let nodes = NodeRegistry::local_only();
        let cancel = CancelToken::new();
        let ctx = TriggerContext {
            job: "import",
            properties: &properties,
            nodes: &nodes,
            queue: &queue,
            quiet_period: Duration::ZERO,
            cancel: &cancel,
        };

        let cause = trigger.run(&ctx).unwrap();
        assert_eq!(cause.directory, dir.path().to_string_lossy());
        let builds = queue.builds.lock().unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].0, "import");
    }

    #[test]
    fn cancelled_tick_schedules_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "").unwrap();
        let trigger = FilesFoundTrigger::new(
            "* * * * *",
            vec![config(&dir.path().to_string_lossy(), "*.csv", "1")],
        )
        .unwrap();

        let properties = BTreeMap::new();
        let queue = RecordingQueue::default();
        let nodes = NodeRegistry::local_only();
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = TriggerContext {
            job: "import",
            properties: &properties,
            nodes: &nodes,
            queue: &queue,
            quiet_period: Duration::ZERO,
            cancel: &cancel,
        };

        assert!(trigger.run(&ctx).is_none());
        assert!(queue.builds.lock().unwrap().is_empty());
    }
}
