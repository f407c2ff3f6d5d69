//! Files found trigger.
//!
//! Polls directories on a cron schedule and schedules a build when files
//! matching Ant-style patterns are present. Each job owns an ordered list
//! of search configurations; on every tick the first configuration whose
//! match count reaches its threshold schedules one build and records a
//! [`FilesFoundTriggerCause`], which is exported to the build as
//! `filesfound_setting_*` environment variables.
//!
//! Searches run either in-process on the local controller or on a remote
//! node through an agent subprocess (see [`node`]).

pub mod cancel;
pub mod cause;
pub mod config;
pub mod env;
pub mod environment;
pub mod error;
pub mod node;
pub mod pattern;
pub mod queue;
pub mod scan;
pub mod schedule;
pub mod search;
pub mod settings;
pub mod trigger;

pub use cancel::CancelToken;
pub use cause::FilesFoundTriggerCause;
pub use config::FilesFoundTriggerConfig;
pub use env::EnvVars;
pub use error::{FilesFoundError, Result};
pub use node::{ExecutionTarget, NodeRegistry, NodeSettings};
pub use queue::{BuildQueue, CommandBuildQueue};
pub use schedule::{ScheduledJob, Scheduler};
pub use search::{FileSearch, Outcome, SearchResult, Severity};
pub use settings::{JobSettings, PersistedTrigger, Settings};
pub use trigger::{FilesFoundTrigger, TriggerContext};
