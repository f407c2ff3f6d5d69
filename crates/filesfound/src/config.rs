//! A single configured search.

use crate::cancel::CancelToken;
use crate::env::EnvVars;
use crate::error::FilesFoundError;
use crate::node::{normalize_node_name, NodeRegistry};
use crate::search::{FileSearch, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Threshold used when `trigger_number` is unset or not a number.
pub const DEFAULT_TRIGGER_NUMBER: &str = "1";

/// One search definition: where to look, what to match, and how many
/// matches are needed to fire.
///
/// Every string field is trimmed on construction; an empty string means
/// "unset". A `None` node is the local controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTriggerConfig", into = "RawTriggerConfig")]
pub struct FilesFoundTriggerConfig {
    node: Option<String>,
    directory: String,
    files: String,
    ignored_files: String,
    trigger_number: String,
}

impl FilesFoundTriggerConfig {
    pub fn new(
        node: Option<&str>,
        directory: &str,
        files: &str,
        ignored_files: &str,
        trigger_number: &str,
    ) -> Self {
        Self {
            node: normalize_node_name(node),
            directory: directory.trim().to_string(),
            files: files.trim().to_string(),
            ignored_files: ignored_files.trim().to_string(),
            trigger_number: trigger_number.trim().to_string(),
        }
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn files(&self) -> &str {
        &self.files
    }

    pub fn ignored_files(&self) -> &str {
        &self.ignored_files
    }

    pub fn trigger_number(&self) -> &str {
        &self.trigger_number
    }

    /// Minimum number of matches needed to schedule a build.
    pub fn minimum_match_count(&self) -> usize {
        self.trigger_number.parse().unwrap_or(1)
    }

    /// Copy of this configuration with `$NAME` and `${NAME}` placeholders
    /// substituted in every field.
    pub fn expand(&self, vars: &EnvVars) -> Self {
        let node = self.node.as_deref().map(|node| vars.expand(node));
        Self::new(
            node.as_deref(),
            &vars.expand(&self.directory),
            &vars.expand(&self.files),
            &vars.expand(&self.ignored_files),
            &vars.expand(&self.trigger_number),
        )
    }

    /// Matched files for this configuration, searched as given.
    ///
    /// Placeholders are not substituted here: callers call [`expand`]
    /// first, as [`FilesFoundTrigger::run`] does once per tick.
    ///
    /// Never fails: every error is logged and reported as no matches. A
    /// cancelled scan leaves `cancel` set for the caller.
    ///
    /// [`expand`]: FilesFoundTriggerConfig::expand
    /// [`FilesFoundTrigger::run`]: crate::trigger::FilesFoundTrigger::run
    pub fn find_files(&self, nodes: &NodeRegistry, cancel: &CancelToken) -> Vec<String> {
        match FileSearch::perform(self, nodes, cancel) {
            Ok(result) => {
                debug!(config = %self, outcome = %result, "Search complete");
                result.files
            }
            Err(FilesFoundError::Interrupted) => {
                debug!(config = %self, "Search interrupted");
                cancel.cancel();
                Vec::new()
            }
            Err(e) => {
                warn!(config = %self, error = %e, "Search failed");
                Vec::new()
            }
        }
    }

    /// Manual check of a configuration as typed by the user: expands it
    /// and reports the classified outcome without scheduling anything.
    pub fn test_configuration(
        &self,
        vars: &EnvVars,
        nodes: &NodeRegistry,
        cancel: &CancelToken,
    ) -> crate::error::Result<SearchResult> {
        FileSearch::perform(&self.expand(vars), nodes, cancel)
    }
}

impl Default for FilesFoundTriggerConfig {
    fn default() -> Self {
        Self::new(None, "", "", "", DEFAULT_TRIGGER_NUMBER)
    }
}

impl fmt::Display for FilesFoundTriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{node={}, directory={}, files={}, ignored_files={}, trigger_number={}}}",
            self.node.as_deref().unwrap_or(""),
            self.directory,
            self.files,
            self.ignored_files,
            self.trigger_number
        )
    }
}

/// Serialized form. Missing fields are treated as unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node: Option<String>,
    #[serde(default)]
    directory: String,
    #[serde(default)]
    files: String,
    #[serde(default)]
    ignored_files: String,
    #[serde(default = "default_trigger_number")]
    trigger_number: String,
}

fn default_trigger_number() -> String {
    DEFAULT_TRIGGER_NUMBER.to_string()
}

impl From<RawTriggerConfig> for FilesFoundTriggerConfig {
    fn from(raw: RawTriggerConfig) -> Self {
        Self::new(
            raw.node.as_deref(),
            &raw.directory,
            &raw.files,
            &raw.ignored_files,
            &raw.trigger_number,
        )
    }
}

impl From<FilesFoundTriggerConfig> for RawTriggerConfig {
    fn from(config: FilesFoundTriggerConfig) -> Self {
        Self {
            node: config.node,
            directory: config.directory,
            files: config.files,
            ignored_files: config.ignored_files,
            trigger_number: config.trigger_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Outcome;
    use std::fs;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> EnvVars {
        let mut vars = EnvVars::new();
        for (k, v) in pairs {
            vars.insert(*k, *v);
        }
        vars
    }

    #[test]
    fn new_trims_fields_and_normalizes_node() {
        let config = FilesFoundTriggerConfig::new(Some(" master "), " /tmp ", " *.txt ", " ", " 2 ");
        assert_eq!(config.node(), None);
        assert_eq!(config.directory(), "/tmp");
        assert_eq!(config.files(), "*.txt");
        assert_eq!(config.ignored_files(), "");
        assert_eq!(config.trigger_number(), "2");
    }

    #[test]
    fn minimum_match_count_defaults_to_one() {
        let count = |n: &str| FilesFoundTriggerConfig::new(None, "d", "f", "", n).minimum_match_count();
        assert_eq!(count("3"), 3);
        assert_eq!(count("0"), 0);
        assert_eq!(count(""), 1);
        assert_eq!(count("many"), 1);
        assert_eq!(count("-2"), 1);
    }

    #[test]
    fn expand_without_placeholders_is_identity() {
        let config = FilesFoundTriggerConfig::new(Some("agent-1"), "/tmp", "**", "*.bak", "2");
        assert_eq!(config.expand(&vars(&[("property", "value")])), config);
    }

    #[test]
    fn expand_substitutes_every_field() {
        let config = FilesFoundTriggerConfig::new(
            Some("$node"),
            "$property",
            "${property}",
            "$property",
            "$count",
        );
        let expanded = config.expand(&vars(&[("property", "value"), ("node", "agent-1"), ("count", "4")]));
        assert_eq!(expanded.node(), Some("agent-1"));
        assert_eq!(expanded.directory(), "value");
        assert_eq!(expanded.files(), "value");
        assert_eq!(expanded.ignored_files(), "value");
        assert_eq!(expanded.trigger_number(), "4");
    }

    #[test]
    fn expand_leaves_undefined_placeholders() {
        let config = FilesFoundTriggerConfig::new(None, "$undefined", "**", "", "1");
        assert_eq!(config.expand(&EnvVars::new()).directory(), "$undefined");
    }

    #[test]
    fn expanded_node_can_resolve_to_local() {
        let config = FilesFoundTriggerConfig::new(Some("$node"), "/tmp", "**", "", "1");
        let expanded = config.expand(&vars(&[("node", "master")]));
        assert_eq!(expanded.node(), None);
    }

    #[test]
    fn missing_fields_deserialize_as_unset() {
        let config: FilesFoundTriggerConfig = toml::from_str("directory = \" /tmp \"").unwrap();
        assert_eq!(config.node(), None);
        assert_eq!(config.directory(), "/tmp");
        assert_eq!(config.files(), "");
        assert_eq!(config.trigger_number(), "1");
    }

    #[test]
    fn local_node_is_not_serialized() {
        let config = FilesFoundTriggerConfig::new(None, "/tmp", "**", "", "1");
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("node"));
        let back: FilesFoundTriggerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn find_files_returns_matches() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test"), "").unwrap();
        let config = FilesFoundTriggerConfig::new(None, &dir.path().to_string_lossy(), "**", "", "1");

        let files = config.find_files(&NodeRegistry::local_only(), &CancelToken::new());
        assert_eq!(files, vec!["test"]);
    }

    #[test]
    fn find_files_searches_placeholders_literally() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test"), "").unwrap();
        let base = dir.path().to_string_lossy().to_string();
        let config = FilesFoundTriggerConfig::new(None, "$base", "**", "", "1");
        let nodes = NodeRegistry::local_only();
        let cancel = CancelToken::new();

        assert!(config.find_files(&nodes, &cancel).is_empty());
        let expanded = config.expand(&vars(&[("base", base.as_str())]));
        assert_eq!(expanded.find_files(&nodes, &cancel), vec!["test"]);
    }

    #[test]
    fn find_files_swallows_unusable_configs() {
        let nodes = NodeRegistry::local_only();
        let cancel = CancelToken::new();

        let no_directory = FilesFoundTriggerConfig::new(None, "", "**", "", "1");
        assert!(no_directory.find_files(&nodes, &cancel).is_empty());

        let missing = FilesFoundTriggerConfig::new(None, "/no/such/directory", "**", "", "1");
        assert!(missing.find_files(&nodes, &cancel).is_empty());

        let unknown_node = FilesFoundTriggerConfig::new(Some("agent-9"), "/", "**", "", "1");
        assert!(unknown_node.find_files(&nodes, &cancel).is_empty());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn find_files_keeps_cancellation_visible() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test"), "").unwrap();
        let config = FilesFoundTriggerConfig::new(None, &dir.path().to_string_lossy(), "**", "", "1");
        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(config.find_files(&NodeRegistry::local_only(), &cancel).is_empty());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_configuration_expands_before_searching() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test"), "").unwrap();
        let config = FilesFoundTriggerConfig::new(None, "$base", "**", "", "1");
        let base = dir.path().to_string_lossy().to_string();
        let vars = vars(&[("base", base.as_str())]);

        let result = config
            .test_configuration(&vars, &NodeRegistry::local_only(), &CancelToken::new())
            .unwrap();
        assert_eq!(result.outcome, Outcome::Matched(1));
        assert_eq!(result.message(), "Found: test");
    }
}
