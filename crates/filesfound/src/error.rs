//! Error types for the files found trigger

use std::io;
use thiserror::Error;

/// Files found error type
#[derive(Error, Debug)]
pub enum FilesFoundError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Settings parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Settings write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Invalid schedule '{spec}': {message}")]
    Schedule { spec: String, message: String },

    #[error("Agent error on node {node}: {message}")]
    Agent { node: String, message: String },

    #[error("Scan on node {node} timed out after {secs}s")]
    Timeout { node: String, secs: u64 },

    #[error("Scan interrupted")]
    Interrupted,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FilesFoundError>;
