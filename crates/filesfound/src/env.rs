//! Variable expansion for search configurations.
//!
//! Placeholders use `$NAME` or `${NAME}` syntax. Unknown names are left in
//! place as literal text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([A-Za-z0-9_]+|\{[A-Za-z0-9_.]+\})").expect("placeholder regex is valid")
});

/// Flat name to value mapping used to expand placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: BTreeMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process environment overlaid with the host-wide global properties.
    pub fn for_expansion(properties: &BTreeMap<String, String>) -> Self {
        let mut vars = Self::new();
        vars.override_all(std::env::vars());
        vars.override_all(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }

    pub fn override_all(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        self.vars.extend(vars);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Replace every known placeholder in `value`.
    pub fn expand(&self, value: &str) -> String {
        PLACEHOLDER
            .replace_all(value, |caps: &Captures<'_>| {
                let name = caps[1].trim_start_matches('{').trim_end_matches('}');
                match self.vars.get(name) {
                    Some(v) => v.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
