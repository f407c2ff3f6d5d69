//! Environment variables exported to builds started by this trigger.

use crate::cause::FilesFoundTriggerCause;
use crate::node::LOCAL_NODE_NAME;
use std::collections::BTreeMap;

/// Prefix shared by every exported variable.
pub const ENV_PREFIX: &str = "filesfound_setting_";

/// Add the cause's fields to `env`. Builds without a files-found cause get
/// nothing.
pub fn contribute(cause: Option<&FilesFoundTriggerCause>, env: &mut BTreeMap<String, String>) {
    let Some(cause) = cause else {
        return;
    };

    let node = if cause.node.is_empty() {
        LOCAL_NODE_NAME
    } else {
        cause.node.as_str()
    };
    let fields = [
        ("node", node),
        ("directory", cause.directory.as_str()),
        ("files", cause.files.as_str()),
        ("ignoredfiles", cause.ignored_files.as_str()),
        ("triggernumber", cause.trigger_number.as_str()),
    ];
    for (name, value) in fields {
        env.insert(format!("{}{}", ENV_PREFIX, name), value.to_string());
    }
}
