//! `nodes`: list the places a search can run.

use super::load_settings_or_default;
use anyhow::Result;
use filesfound::node::normalize_node_name;
use std::path::Path;
use std::process::ExitCode;

pub fn run(config: &Path) -> Result<ExitCode> {
    let settings = load_settings_or_default(config)?;
    let nodes = settings.node_registry();

    for name in nodes.node_names() {
        let reachable = nodes
            .locate(normalize_node_name(Some(&name)).as_deref())
            .map(|target| target.is_reachable())
            .unwrap_or(false);
        let status = if reachable { "online" } else { "offline" };
        println!("{:<24} {}", name, status);
    }
    Ok(ExitCode::SUCCESS)
}
