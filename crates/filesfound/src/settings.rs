//! Settings file: global properties, nodes and jobs.
//!
//! ```toml
//! [properties]
//! inbox = "/srv/inbox"
//!
//! [[nodes]]
//! name = "agent-1"
//! launcher = ["ssh", "agent-1"]
//!
//! [[jobs]]
//! name = "import"
//! command = ["./import.sh"]
//! quiet_period_secs = 5
//!
//! [jobs.trigger]
//! spec = "*/5 * * * *"
//!
//! [[jobs.trigger.configs]]
//! directory = "$inbox"
//! files = "**/*.csv"
//! ```

use crate::config::{FilesFoundTriggerConfig, DEFAULT_TRIGGER_NUMBER};
use crate::error::{FilesFoundError, Result};
use crate::node::{NodeRegistry, NodeSettings};
use crate::queue::CommandBuildQueue;
use crate::schedule::ScheduledJob;
use crate::trigger::FilesFoundTrigger;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Global properties; they override process environment variables
    /// during expansion.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub nodes: Vec<NodeSettings>,

    #[serde(default)]
    pub jobs: Vec<JobSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    pub name: String,

    /// Argv started for every scheduled build.
    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub quiet_period_secs: u64,

    pub trigger: PersistedTrigger,
}

/// Every stored trigger shape, oldest last.
///
/// Decoding goes through [`StoredTrigger`], which rejects unknown keys and
/// picks the shape from the markers present (`configs`, then
/// `additional_configs`), so a malformed configuration list is a parse
/// error rather than an older shape. Saving always writes `Current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "StoredTrigger")]
pub enum PersistedTrigger {
    Current {
        spec: String,
        configs: Vec<FilesFoundTriggerConfig>,
    },
    LegacyWithAdditional {
        spec: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        directory: String,
        files: String,
        ignored_files: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trigger_number: Option<String>,
        additional_configs: Vec<FilesFoundTriggerConfig>,
    },
    LegacySingle {
        spec: String,
        directory: String,
        files: String,
        ignored_files: String,
    },
}

/// Union of every stored trigger key.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredTrigger {
    #[serde(alias = "timer_spec")]
    spec: String,
    configs: Option<Vec<FilesFoundTriggerConfig>>,
    additional_configs: Option<Vec<FilesFoundTriggerConfig>>,
    node: Option<String>,
    directory: Option<String>,
    files: Option<String>,
    ignored_files: Option<String>,
    trigger_number: Option<String>,
}

impl StoredTrigger {
    fn flat_keys(&self) -> Vec<&'static str> {
        [
            ("node", self.node.is_some()),
            ("directory", self.directory.is_some()),
            ("files", self.files.is_some()),
            ("ignored_files", self.ignored_files.is_some()),
            ("trigger_number", self.trigger_number.is_some()),
            ("additional_configs", self.additional_configs.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

impl TryFrom<StoredTrigger> for PersistedTrigger {
    type Error = String;

    fn try_from(stored: StoredTrigger) -> std::result::Result<Self, String> {
        if stored.configs.is_some() {
            let mixed = stored.flat_keys();
            if !mixed.is_empty() {
                return Err(format!(
                    "`configs` cannot be combined with {}",
                    mixed.join(", ")
                ));
            }
            let StoredTrigger { spec, configs, .. } = stored;
            return Ok(PersistedTrigger::Current {
                spec,
                configs: configs.unwrap_or_default(),
            });
        }

        let StoredTrigger {
            spec,
            additional_configs,
            node,
            directory,
            files,
            ignored_files,
            trigger_number,
            ..
        } = stored;
        let directory = directory.unwrap_or_default();
        let files = files.unwrap_or_default();
        let ignored_files = ignored_files.unwrap_or_default();

        // Only the list-with-additional shape stored a node or a threshold.
        if additional_configs.is_some() || node.is_some() || trigger_number.is_some() {
            return Ok(PersistedTrigger::LegacyWithAdditional {
                spec,
                node,
                directory,
                files,
                ignored_files,
                trigger_number,
                additional_configs: additional_configs.unwrap_or_default(),
            });
        }

        Ok(PersistedTrigger::LegacySingle {
            spec,
            directory,
            files,
            ignored_files,
        })
    }
}

impl PersistedTrigger {
    pub fn spec(&self) -> &str {
        match self {
            PersistedTrigger::Current { spec, .. }
            | PersistedTrigger::LegacyWithAdditional { spec, .. }
            | PersistedTrigger::LegacySingle { spec, .. } => spec,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, PersistedTrigger::Current { .. })
    }

    /// Ordered configuration list for any stored shape.
    pub fn configs(&self) -> Vec<FilesFoundTriggerConfig> {
        match self {
            PersistedTrigger::Current { configs, .. } => configs.clone(),
            PersistedTrigger::LegacyWithAdditional {
                node,
                directory,
                files,
                ignored_files,
                trigger_number,
                additional_configs,
                ..
            } => {
                let primary = FilesFoundTriggerConfig::new(
                    node.as_deref(),
                    directory,
                    files,
                    ignored_files,
                    trigger_number.as_deref().unwrap_or(DEFAULT_TRIGGER_NUMBER),
                );
                std::iter::once(primary)
                    .chain(additional_configs.iter().cloned())
                    .collect()
            }
            PersistedTrigger::LegacySingle {
                directory,
                files,
                ignored_files,
                ..
            } => vec![FilesFoundTriggerConfig::new(
                None,
                directory,
                files,
                ignored_files,
                DEFAULT_TRIGGER_NUMBER,
            )],
        }
    }

    pub fn migrate(&self) -> Result<FilesFoundTrigger> {
        FilesFoundTrigger::new(self.spec(), self.configs())
    }
}

impl From<&FilesFoundTrigger> for PersistedTrigger {
    fn from(trigger: &FilesFoundTrigger) -> Self {
        PersistedTrigger::Current {
            spec: trigger.spec().to_string(),
            configs: trigger.configs().to_vec(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        debug!(path = %path.display(), jobs = settings.jobs.len(), "Loaded settings");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn job(&self, name: &str) -> Option<&JobSettings> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Copy of these settings with every trigger in the current shape.
    pub fn migrated(&self) -> Result<Self> {
        let mut settings = self.clone();
        for job in &mut settings.jobs {
            let trigger = job.trigger.migrate()?;
            job.trigger = PersistedTrigger::from(&trigger);
        }
        Ok(settings)
    }

    pub fn node_registry(&self) -> NodeRegistry {
        NodeRegistry::from_settings(&self.nodes)
    }

    pub fn build_queue(&self) -> CommandBuildQueue {
        self.jobs.iter().fold(CommandBuildQueue::new(), |queue, job| {
            queue.with_job(job.name.clone(), job.command.clone())
        })
    }

    /// Migrate every job's trigger and check names and schedules.
    pub fn scheduled_jobs(&self) -> Result<Vec<ScheduledJob>> {
        let mut seen = HashSet::new();
        let mut jobs = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(FilesFoundError::Config("job with an empty name".to_string()));
            }
            if !seen.insert(job.name.as_str()) {
                return Err(FilesFoundError::Config(format!("duplicate job '{}'", job.name)));
            }
            jobs.push(ScheduledJob {
                name: job.name.clone(),
                trigger: Arc::new(job.trigger.migrate()?),
                quiet_period: Duration::from_secs(job.quiet_period_secs),
            });
        }
        Ok(jobs)
    }
}
