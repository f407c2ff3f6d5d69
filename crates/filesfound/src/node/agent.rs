use super::{ExecutionTarget, NodeSettings};
use crate::cancel::CancelToken;
use crate::error::{FilesFoundError, Result};
use filesfound_protocol::{read_frame, write_frame, ScanReply, ScanRequest, WireMessage};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often a waiting scan checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long an agent may keep running after it has sent its reply.
const EXIT_GRACE: Duration = Duration::from_secs(2);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A remote node reached by running `filesfound agent-scan` through a
/// launcher command.
#[derive(Debug, Clone)]
pub struct AgentTarget {
    settings: NodeSettings,
}

impl AgentTarget {
    pub fn new(settings: NodeSettings) -> Self {
        Self { settings }
    }

    fn agent_error(&self, message: impl Into<String>) -> FilesFoundError {
        FilesFoundError::Agent {
            node: self.settings.name.clone(),
            message: message.into(),
        }
    }

    fn command(&self) -> Command {
        let mut argv = self
            .settings
            .launcher
            .iter()
            .chain(std::iter::once(&self.settings.agent_command));
        // The chain always yields the agent command.
        let program = argv.next().unwrap_or(&self.settings.agent_command);
        let mut cmd = Command::new(program);
        cmd.args(argv).arg("agent-scan");
        cmd
    }

    fn spawn(&self) -> Result<Child> {
        self.command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.error_not_found()
                } else {
                    self.agent_error(format!("failed to start agent: {e}"))
                }
            })
    }

    fn error_not_found(&self) -> FilesFoundError {
        let program = self
            .settings
            .launcher
            .first()
            .unwrap_or(&self.settings.agent_command);
        self.agent_error(format!("command '{program}' not found"))
    }

    fn deadline(&self) -> Option<Instant> {
        match self.settings.timeout_secs {
            0 => None,
            secs => Some(Instant::now() + Duration::from_secs(secs)),
        }
    }

    /// Wait for the agent to exit once its reply frame has been read.
    ///
    /// Bounded by the scan deadline and by `EXIT_GRACE`. Returns `None` when
    /// the child had to be killed.
    fn wait_for_exit(
        &self,
        child: &mut Child,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> Result<Option<ExitStatus>> {
        let grace = Instant::now() + EXIT_GRACE;
        let limit = deadline.map_or(grace, |deadline| deadline.min(grace));
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if cancel.is_cancelled() {
                kill(child);
                return Err(FilesFoundError::Interrupted);
            }
            let now = Instant::now();
            if now >= limit {
                kill(child);
                return Ok(None);
            }
            std::thread::sleep(EXIT_POLL_INTERVAL.min(limit - now));
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl ExecutionTarget for AgentTarget {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn is_reachable(&self) -> bool {
        self.settings.enabled
    }

    fn scan(&self, request: &ScanRequest, cancel: &CancelToken) -> Result<ScanReply> {
        debug!(node = %self.settings.name, directory = %request.directory, "Starting agent scan");
        let mut child = self.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A failed write usually means the agent died early; its exit
            // status below explains why.
            if let Err(e) = write_frame(&mut stdin, &WireMessage::Request(request.clone())) {
                warn!(node = %self.settings.name, error = %e, "Failed to send scan request");
            }
        }

        let mut stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                kill(&mut child);
                return Err(self.agent_error("missing agent stdout"));
            }
        };

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(read_frame(&mut stdout));
        });

        let deadline = self.deadline();
        let frame = loop {
            if cancel.is_cancelled() {
                kill(&mut child);
                return Err(FilesFoundError::Interrupted);
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        kill(&mut child);
                        return Err(FilesFoundError::Timeout {
                            node: self.settings.name.clone(),
                            secs: self.settings.timeout_secs,
                        });
                    }
                    POLL_INTERVAL.min(deadline - now)
                }
                None => POLL_INTERVAL,
            };
            match rx.recv_timeout(wait) {
                Ok(frame) => break frame,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    kill(&mut child);
                    return Err(self.agent_error("agent reader stopped unexpectedly"));
                }
            }
        };

        let status = match self.wait_for_exit(&mut child, deadline, cancel)? {
            Some(status) => status,
            None => {
                warn!(node = %self.settings.name, "Agent did not exit after replying, killed");
                return match frame {
                    Ok(Some(WireMessage::Reply(reply))) => Ok(reply),
                    Ok(Some(WireMessage::Error(message))) => Err(self.agent_error(message)),
                    _ => Err(self.agent_error("agent did not exit")),
                };
            }
        };
        match frame {
            Ok(Some(WireMessage::Reply(reply))) if status.success() => Ok(reply),
            Ok(Some(WireMessage::Reply(_))) => {
                Err(self.agent_error(format!("agent exited with {status}")))
            }
            Ok(Some(WireMessage::Error(message))) => Err(self.agent_error(message)),
            Ok(Some(WireMessage::Request(_))) => {
                Err(self.agent_error("agent answered with a request frame"))
            }
            Ok(None) => Err(self.agent_error(format!(
                "agent exited with {status} without a reply"
            ))),
            Err(e) => Err(self.agent_error(format!("invalid reply: {e}"))),
        }
    }
}
