//! Directory scan primitive.
//!
//! Runs on whichever machine owns the directory: in-process for the local
//! controller, inside `filesfound agent-scan` for a remote node.

use crate::cancel::CancelToken;
use crate::error::{FilesFoundError, Result};
use crate::pattern::FilePattern;
use filesfound_protocol::{ScanReply, ScanRequest};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Normalize a relative path to use forward slashes on every platform.
fn normalize_path_to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// List the files under `directory` matching `files` and not `ignored_files`.
///
/// Returns `Ok(None)` when `directory` is not a directory. Results are
/// relative to `directory`, depth first, sorted by name within each
/// directory. No default exclusions apply.
pub fn scan_directory(
    directory: &Path,
    files: &str,
    ignored_files: &str,
    cancel: &CancelToken,
) -> Result<Option<Vec<String>>> {
    if !directory.is_dir() {
        return Ok(None);
    }
    let pattern = FilePattern::new(files, ignored_files)?;

    let mut found = Vec::new();
    let mut walker = WalkDir::new(directory)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        if cancel.is_cancelled() {
            return Err(FilesFoundError::Interrupted);
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(directory = %directory.display(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };

        let rel_path = match entry.path().strip_prefix(directory) {
            Ok(rel) => normalize_path_to_forward_slashes(rel),
            Err(_) => continue,
        };

        if entry.file_type().is_dir() {
            if pattern.prunes_dir(&rel_path) {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file() && pattern.is_match(&rel_path) {
            found.push(rel_path);
        }
    }

    debug!(directory = %directory.display(), matched = found.len(), "Scan complete");
    Ok(Some(found))
}

/// Serve one wire request with a local scan.
pub fn scan(request: &ScanRequest, cancel: &CancelToken) -> Result<ScanReply> {
    let files = scan_directory(
        Path::new(&request.directory),
        &request.files,
        &request.ignored_files,
        cancel,
    )?;
    Ok(ScanReply { files })
}
