//! Ant-style file patterns compiled to glob sets.
//!
//! Supported syntax:
//! - `*` matches any run of characters within one path segment
//! - `?` matches a single character within one path segment
//! - `**` matches any number of directories, including none
//! - several patterns separated by commas or whitespace
//! - a trailing `/` is shorthand for `/**`
//!
//! Brackets and braces are literal, as they are in Ant.

use crate::error::{FilesFoundError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Split a raw pattern list into normalized Ant patterns.
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(normalize_pattern)
        .collect()
}

fn normalize_pattern(raw: &str) -> String {
    let mut pattern = raw.replace('\\', "/");
    while pattern.starts_with('/') {
        pattern.remove(0);
    }
    if pattern.is_empty() || pattern.ends_with('/') {
        pattern.push_str("**");
    }
    pattern
}

/// Escape the glob metacharacters Ant does not know about.
fn escape_non_ant(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(&escape_non_ant(pattern))
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| FilesFoundError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| FilesFoundError::Pattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}

/// Compiled include and exclude patterns for one search.
#[derive(Debug, Clone)]
pub struct FilePattern {
    includes: GlobSet,
    excludes: GlobSet,
    /// Directories whose whole subtree is excluded.
    pruned_dirs: GlobSet,
}

impl FilePattern {
    pub fn new(files: &str, ignored_files: &str) -> Result<Self> {
        let includes = split_patterns(files);
        let excludes = split_patterns(ignored_files);

        let pruned: Vec<String> = excludes
            .iter()
            .filter_map(|p| {
                if p == "**" {
                    Some("**".to_string())
                } else {
                    p.strip_suffix("/**").map(str::to_string)
                }
            })
            .collect();

        Ok(Self {
            includes: build_set(&includes)?,
            excludes: build_set(&excludes)?,
            pruned_dirs: build_set(&pruned)?,
        })
    }

    /// True if `rel_path` (relative, `/`-separated) is included and not excluded.
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.includes.is_match(rel_path) && !self.excludes.is_match(rel_path)
    }

    /// True if nothing below the directory `rel_dir` can match.
    pub fn prunes_dir(&self, rel_dir: &str) -> bool {
        self.pruned_dirs.is_match(rel_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(files: &str, ignored: &str, path: &str) -> bool {
        FilePattern::new(files, ignored).unwrap().is_match(path)
    }

    #[test]
    fn split_handles_commas_and_whitespace() {
        assert_eq!(
            split_patterns(" *.csv, data/ ,\\logs\\*.log  /abs/x "),
            vec!["*.csv", "data/**", "logs/*.log", "abs/x"]
        );
        assert!(split_patterns("  , ").is_empty());
    }

    #[test]
    fn double_star_matches_everything() {
        assert!(matches("**", "", "test"));
        assert!(matches("**", "", "a/b/c.txt"));
        assert!(matches("**", "", ".git/config"));
    }

    #[test]
    fn single_star_stays_in_one_segment() {
        assert!(matches("*.csv", "", "data.csv"));
        assert!(!matches("*.csv", "", "nested/data.csv"));
        assert!(matches("**/*.csv", "", "nested/data.csv"));
        assert!(matches("**/*.csv", "", "data.csv"));
        assert!(matches("in?ox/*", "", "inbox/a"));
    }

    #[test]
    fn exclude_wins_over_include() {
        assert!(!matches("**", "**", "test"));
        assert!(!matches("**/*.csv", "tmp/**", "tmp/a.csv"));
        assert!(matches("**/*.csv", "tmp/**", "keep/a.csv"));
    }

    #[test]
    fn brackets_and_braces_are_literal() {
        assert!(matches("report[1].txt", "", "report[1].txt"));
        assert!(!matches("report[1].txt", "", "report1.txt"));
        assert!(matches("{a,b}", "", "{a"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!matches("*.CSV", "", "data.csv"));
    }

    #[test]
    fn pruned_dirs_follow_recursive_excludes() {
        let pattern = FilePattern::new("**", "build/, **/.git/**").unwrap();
        assert!(pattern.prunes_dir("build"));
        assert!(pattern.prunes_dir("src/.git"));
        assert!(!pattern.prunes_dir("src"));
    }
}
