//! `check`: validate the settings file and test every search.

use super::load_settings;
use anyhow::{Context, Result};
use filesfound::{CancelToken, EnvVars, Severity};
use std::path::Path;
use std::process::ExitCode;

pub fn run(config: &Path) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let jobs = settings.scheduled_jobs().context("Invalid settings")?;
    if !settings.jobs.iter().all(|job| job.trigger.is_current()) {
        println!("note: settings use an older trigger format; run `filesfound migrate`");
    }

    let vars = EnvVars::for_expansion(&settings.properties);
    let nodes = settings.node_registry();
    let cancel = CancelToken::new();
    let mut errors = 0;

    for job in &jobs {
        println!("{} ({})", job.name, job.trigger.spec());
        for (index, search) in job.trigger.configs().iter().enumerate() {
            let line = match search.test_configuration(&vars, &nodes, &cancel) {
                Ok(result) => {
                    if result.severity() == Severity::Error {
                        errors += 1;
                    }
                    result.to_string()
                }
                Err(e) => {
                    errors += 1;
                    format!("{}: {}", Severity::Error, e)
                }
            };
            println!("  [{}] {}", index + 1, line);
        }
    }

    if errors > 0 {
        println!("{} configuration(s) with errors", errors);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
