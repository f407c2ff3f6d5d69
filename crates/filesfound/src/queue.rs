//! Build scheduling sink.

use crate::cause::FilesFoundTriggerCause;
use crate::environment;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// Receives build requests from triggers.
pub trait BuildQueue: Send + Sync {
    /// Request a build of `job` after `quiet_period`.
    ///
    /// Returns `false` when the job already has a build waiting.
    fn schedule_build(&self, job: &str, quiet_period: Duration, cause: FilesFoundTriggerCause) -> bool;
}

/// Runs each job's command once its quiet period has passed.
pub struct CommandBuildQueue {
    commands: HashMap<String, Vec<String>>,
    pending: Arc<Mutex<HashSet<String>>>,
    builds: Mutex<Vec<JoinHandle<()>>>,
}

impl CommandBuildQueue {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            pending: Arc::new(Mutex::new(HashSet::new())),
            builds: Mutex::new(Vec::new()),
        }
    }

    /// Register the argv started for each build of `job`.
    pub fn with_job(mut self, job: impl Into<String>, command: Vec<String>) -> Self {
        self.commands.insert(job.into(), command);
        self
    }

    pub fn is_pending(&self, job: &str) -> bool {
        lock(&self.pending).contains(job)
    }

    /// Block until every build scheduled so far has finished.
    pub fn wait(&self) {
        let builds: Vec<_> = lock(&self.builds).drain(..).collect();
        for build in builds {
            if build.join().is_err() {
                error!("Build thread panicked");
            }
        }
    }
}

impl Default for CommandBuildQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildQueue for CommandBuildQueue {
    fn schedule_build(&self, job: &str, quiet_period: Duration, cause: FilesFoundTriggerCause) -> bool {
        let Some(command) = self.commands.get(job).cloned() else {
            warn!(job = %job, "No command configured, build not scheduled");
            return false;
        };
        if command.is_empty() {
            warn!(job = %job, "Empty command, build not scheduled");
            return false;
        }
        if !lock(&self.pending).insert(job.to_string()) {
            info!(job = %job, "Build already pending");
            return false;
        }

        info!(job = %job, cause = %cause, quiet_period = ?quiet_period, "Build scheduled");
        let pending = Arc::clone(&self.pending);
        let job = job.to_string();
        let handle = thread::spawn(move || {
            thread::sleep(quiet_period);
            run_build(&job, &command, &cause, &pending);
        });
        let mut builds = lock(&self.builds);
        builds.retain(|build| !build.is_finished());
        builds.push(handle);
        true
    }
}

fn run_build(
    job: &str,
    command: &[String],
    cause: &FilesFoundTriggerCause,
    pending: &Mutex<HashSet<String>>,
) {
    let mut env = BTreeMap::new();
    environment::contribute(Some(cause), &mut env);

    let mut cmd = Command::new(&command[0]);
    cmd.args(&command[1..]).envs(&env);
    let spawned = cmd.spawn();
    lock(pending).remove(job);

    match spawned {
        Ok(mut child) => {
            info!(job = %job, pid = child.id(), "Build started");
            match child.wait() {
                Ok(status) if status.success() => info!(job = %job, "Build finished"),
                Ok(status) => warn!(job = %job, status = %status, "Build failed"),
                Err(e) => error!(job = %job, error = %e, "Failed to wait for build"),
            }
        }
        Err(e) => error!(job = %job, command = %command[0], error = %e, "Failed to start build"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
