//! One directory search and the classification of its result.

use crate::cancel::CancelToken;
use crate::config::FilesFoundTriggerConfig;
use crate::error::Result;
use crate::node::NodeRegistry;
use filesfound_protocol::ScanRequest;
use std::fmt;
use tracing::debug;

/// How a search result should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// Classified result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    DirectoryNotSpecified,
    FilesNotSpecified,
    NodeNotFound(String),
    NodeOffline(String),
    /// The directory is missing or is not a directory.
    DirectoryNotFound { user: String },
    /// The directory exists; carries the number of matching files.
    Matched(usize),
}

impl Outcome {
    pub fn severity(&self) -> Severity {
        match self {
            Outcome::DirectoryNotSpecified
            | Outcome::FilesNotSpecified
            | Outcome::NodeNotFound(_)
            | Outcome::NodeOffline(_) => Severity::Error,
            Outcome::DirectoryNotFound { .. } => Severity::Warning,
            Outcome::Matched(_) => Severity::Ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub outcome: Outcome,
    /// Matched paths relative to the searched directory. Empty unless the
    /// outcome is `Matched`.
    pub files: Vec<String>,
}

impl SearchResult {
    fn rejected(outcome: Outcome) -> Self {
        Self {
            outcome,
            files: Vec::new(),
        }
    }

    fn matched(files: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Matched(files.len()),
            files,
        }
    }

    pub fn severity(&self) -> Severity {
        self.outcome.severity()
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::DirectoryNotSpecified => "Please specify the directory to search.".to_string(),
            Outcome::FilesNotSpecified => "Please specify the files to find.".to_string(),
            Outcome::NodeNotFound(node) => format!("Node not found: {}", node),
            Outcome::NodeOffline(node) => format!("Node is offline: {}", node),
            Outcome::DirectoryNotFound { user } => {
                format!("Directory not found, or user {} cannot read it.", user)
            }
            Outcome::Matched(0) => "No files found.".to_string(),
            Outcome::Matched(1) => match self.files.first() {
                Some(name) => format!("Found: {}", name),
                None => "Found 1 files.".to_string(),
            },
            Outcome::Matched(count) => format!("Found {} files.", count),
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.message())
    }
}

/// Performs a single search for one configuration.
pub struct FileSearch;

impl FileSearch {
    /// Validate the configuration, resolve its node and scan the directory.
    ///
    /// The configuration is used as given; expand it first. Transport and
    /// I/O failures are returned as errors, everything else is an outcome.
    pub fn perform(
        config: &FilesFoundTriggerConfig,
        nodes: &NodeRegistry,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        if config.directory().is_empty() {
            return Ok(SearchResult::rejected(Outcome::DirectoryNotSpecified));
        }
        if config.files().is_empty() {
            return Ok(SearchResult::rejected(Outcome::FilesNotSpecified));
        }

        let target = match nodes.locate(config.node()) {
            Some(target) => target,
            None => {
                let name = config.node().unwrap_or_default().to_string();
                return Ok(SearchResult::rejected(Outcome::NodeNotFound(name)));
            }
        };
        if !target.is_reachable() {
            return Ok(SearchResult::rejected(Outcome::NodeOffline(
                target.name().to_string(),
            )));
        }

        let request = ScanRequest {
            directory: config.directory().to_string(),
            files: config.files().to_string(),
            ignored_files: config.ignored_files().to_string(),
        };
        debug!(node = %target.name(), directory = %request.directory, "Scanning");

        match target.scan(&request, cancel)?.files {
            Some(files) => Ok(SearchResult::matched(files)),
            None => Ok(SearchResult::rejected(Outcome::DirectoryNotFound {
                user: current_user(),
            })),
        }
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
