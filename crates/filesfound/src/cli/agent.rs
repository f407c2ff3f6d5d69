//! `agent-scan`: serve one scan request over stdin/stdout.
//!
//! Stdout carries only protocol frames; diagnostics go to stderr.

use anyhow::{bail, Context, Result};
use filesfound::{scan, CancelToken};
use filesfound_protocol::{read_frame, write_frame, WireMessage};
use std::io;
use std::process::ExitCode;
use tracing::{debug, warn};

pub fn run() -> Result<ExitCode> {
    let request = {
        let mut stdin = io::stdin().lock();
        read_frame(&mut stdin).context("Failed to read scan request")?
    };

    let reply = match request {
        Some(WireMessage::Request(request)) => {
            debug!(directory = %request.directory, "Agent scan");
            match scan::scan(&request, &CancelToken::new()) {
                Ok(reply) => WireMessage::Reply(reply),
                Err(e) => {
                    warn!(error = %e, "Agent scan failed");
                    WireMessage::Error(e.to_string())
                }
            }
        }
        Some(_) => WireMessage::Error("expected a scan request".to_string()),
        None => bail!("No scan request received"),
    };

    let mut stdout = io::stdout().lock();
    write_frame(&mut stdout, &reply).context("Failed to write scan reply")?;
    Ok(ExitCode::SUCCESS)
}
