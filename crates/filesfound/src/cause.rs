//! Record of why a build was scheduled.

use crate::config::FilesFoundTriggerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the expanded configuration that fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesFoundTriggerCause {
    /// Empty for the local controller.
    pub node: String,
    pub directory: String,
    pub files: String,
    pub ignored_files: String,
    pub trigger_number: String,
}

impl FilesFoundTriggerCause {
    pub fn new(config: &FilesFoundTriggerConfig) -> Self {
        Self {
            node: config.node().unwrap_or_default().to_string(),
            directory: config.directory().to_string(),
            files: config.files().to_string(),
            ignored_files: config.ignored_files().to_string(),
            trigger_number: config.trigger_number().to_string(),
        }
    }

    pub fn short_description(&self) -> String {
        if self.ignored_files.is_empty() {
            format!("Files found in {} matching {}", self.directory, self.files)
        } else {
            format!(
                "Files found in {} matching {}, ignoring {}",
                self.directory, self.files, self.ignored_files
            )
        }
    }
}

impl From<&FilesFoundTriggerConfig> for FilesFoundTriggerCause {
    fn from(config: &FilesFoundTriggerConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Display for FilesFoundTriggerCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_config_fields() {
        let config = FilesFoundTriggerConfig::new(Some("agent-1"), "/in", "*.csv", "*.tmp", "3");
        let cause = FilesFoundTriggerCause::new(&config);
        assert_eq!(cause.node, "agent-1");
        assert_eq!(cause.directory, "/in");
        assert_eq!(cause.files, "*.csv");
        assert_eq!(cause.ignored_files, "*.tmp");
        assert_eq!(cause.trigger_number, "3");
    }

    #[test]
    fn local_node_snapshots_as_empty() {
        let config = FilesFoundTriggerConfig::new(None, "/in", "**", "", "1");
        assert_eq!(FilesFoundTriggerCause::from(&config).node, "");
    }

    #[test]
    fn description_mentions_ignored_files_only_when_set() {
        let plain = FilesFoundTriggerCause::new(&FilesFoundTriggerConfig::new(None, "/in", "*.csv", "", "1"));
        assert_eq!(plain.short_description(), "Files found in /in matching *.csv");

        let ignoring =
            FilesFoundTriggerCause::new(&FilesFoundTriggerConfig::new(None, "/in", "*.csv", "*.tmp", "1"));
        assert_eq!(
            ignoring.to_string(),
            "Files found in /in matching *.csv, ignoring *.tmp"
        );
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let cause: FilesFoundTriggerCause = serde_json::from_str(r#"{"directory":"/in"}"#).unwrap();
        assert_eq!(cause.directory, "/in");
        assert_eq!(cause.files, "");
        assert_eq!(cause.trigger_number, "");
    }
}
