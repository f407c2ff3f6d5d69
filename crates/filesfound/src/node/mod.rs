//! Execution locations for directory scans.
//!
//! A search names the node that owns its directory. The local controller
//! scans in-process; every other node is reached through an agent
//! subprocess speaking the `filesfound_protocol` wire format.

mod agent;
mod local;

pub use agent::AgentTarget;
pub use local::LocalTarget;

use crate::cancel::CancelToken;
use crate::error::Result;
use filesfound_protocol::{ScanReply, ScanRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name shown for the local controller in node listings.
pub const LOCAL_NODE_NAME: &str = "master";

/// Names that refer to the local controller rather than a configured node.
const LOCAL_NODE_ALIASES: &[&str] = &["master", "built-in"];

/// Normalize a configured node name.
///
/// Returns `None` for the local controller: blank names and the local
/// aliases, compared case-insensitively.
pub fn normalize_node_name(node: Option<&str>) -> Option<String> {
    let node = node?.trim();
    if node.is_empty()
        || LOCAL_NODE_ALIASES
            .iter()
            .any(|alias| node.eq_ignore_ascii_case(alias))
    {
        return None;
    }
    Some(node.to_string())
}

/// A place a scan can run.
pub trait ExecutionTarget: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the target can currently accept a scan.
    fn is_reachable(&self) -> bool;

    /// Run one scan, blocking until it completes, fails or is cancelled.
    fn scan(&self, request: &ScanRequest, cancel: &CancelToken) -> Result<ScanReply>;
}

/// Configuration of one remote node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    pub name: String,

    /// Command prefix used to reach the node, e.g. `["ssh", "agent-1"]`.
    /// Empty runs the agent command directly on this machine.
    #[serde(default)]
    pub launcher: Vec<String>,

    /// Agent binary as seen from the node.
    #[serde(default = "default_agent_command")]
    pub agent_command: String,

    /// Disabled nodes are reported offline.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Upper bound on one scan round-trip.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_agent_command() -> String {
    "filesfound".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

/// Lookup of execution targets by node name.
pub struct NodeRegistry {
    local: Arc<dyn ExecutionTarget>,
    nodes: BTreeMap<String, Arc<dyn ExecutionTarget>>,
    order: Vec<String>,
}

impl NodeRegistry {
    /// Registry containing only the local controller.
    pub fn local_only() -> Self {
        Self {
            local: Arc::new(LocalTarget::new()),
            nodes: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub fn from_settings(nodes: &[NodeSettings]) -> Self {
        let mut registry = Self::local_only();
        for settings in nodes {
            registry.register(Arc::new(AgentTarget::new(settings.clone())));
        }
        registry
    }

    /// Add or replace a node. Later registrations win.
    pub fn register(&mut self, target: Arc<dyn ExecutionTarget>) {
        let name = target.name().to_string();
        if self.nodes.insert(name.clone(), target).is_none() {
            self.order.push(name);
        }
    }

    /// Resolve a node name. `None` selects the local controller.
    pub fn locate(&self, node: Option<&str>) -> Option<Arc<dyn ExecutionTarget>> {
        match node {
            None => Some(self.local.clone()),
            Some(name) => self.nodes.get(name).cloned(),
        }
    }

    /// Node names for display: the local controller first, then every
    /// configured node in registration order.
    pub fn node_names(&self) -> Vec<String> {
        let mut names = vec![LOCAL_NODE_NAME.to_string()];
        names.extend(self.order.iter().cloned());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_aliases_normalize_to_none() {
        assert_eq!(normalize_node_name(None), None);
        assert_eq!(normalize_node_name(Some("")), None);
        assert_eq!(normalize_node_name(Some("  ")), None);
        assert_eq!(normalize_node_name(Some("master")), None);
        assert_eq!(normalize_node_name(Some(" MASTER ")), None);
        assert_eq!(normalize_node_name(Some("built-in")), None);
        assert_eq!(normalize_node_name(Some(" agent-1 ")), Some("agent-1".to_string()));
    }

    #[test]
    fn locate_resolves_local_and_configured_nodes() {
        let registry = NodeRegistry::from_settings(&[NodeSettings {
            name: "agent-1".to_string(),
            launcher: vec![],
            agent_command: default_agent_command(),
            enabled: false,
            timeout_secs: 5,
        }]);

        let local = registry.locate(None).unwrap();
        assert_eq!(local.name(), LOCAL_NODE_NAME);
        assert!(local.is_reachable());

        let agent = registry.locate(Some("agent-1")).unwrap();
        assert!(!agent.is_reachable());

        assert!(registry.locate(Some("missing")).is_none());
    }

    #[test]
    fn node_names_list_local_first() {
        let settings = |name: &str| NodeSettings {
            name: name.to_string(),
            launcher: vec![],
            agent_command: default_agent_command(),
            enabled: true,
            timeout_secs: 5,
        };
        let registry = NodeRegistry::from_settings(&[settings("zeta"), settings("alpha")]);
        assert_eq!(registry.node_names(), vec!["master", "zeta", "alpha"]);
    }

    #[test]
    fn node_settings_defaults() {
        let node: NodeSettings = toml::from_str("name = \"agent-1\"").unwrap();
        assert!(node.launcher.is_empty());
        assert_eq!(node.agent_command, "filesfound");
        assert!(node.enabled);
        assert_eq!(node.timeout_secs, 300);
    }
}
