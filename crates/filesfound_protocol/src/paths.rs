use std::path::PathBuf;
use std::sync::Once;

static CREATE_DIR_WARNED: Once = Once::new();

/// Resolve the files found home directory.
///
/// Priority:
/// 1) FILESFOUND_HOME
/// 2) home directory of the current user
/// 3) ./.filesfound
pub fn filesfound_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("FILESFOUND_HOME") {
        return PathBuf::from(override_path);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".filesfound");
    }
    PathBuf::from(".").join(".filesfound")
}

fn ensure_home_dir(home: &PathBuf) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create home directory {}: {}. Set FILESFOUND_HOME or pass --config.",
                home.display(),
                err
            );
        });
    }
}

/// Default settings file: ~/.filesfound/filesfound.toml
///
/// `FILESFOUND_CONFIG` takes precedence when set.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("FILESFOUND_CONFIG") {
        return PathBuf::from(path);
    }
    let home = filesfound_home();
    ensure_home_dir(&home);
    home.join("filesfound.toml")
}

/// Default logs directory: ~/.filesfound/logs
pub fn default_logs_dir() -> PathBuf {
    let home = filesfound_home();
    ensure_home_dir(&home);
    home.join("logs")
}
