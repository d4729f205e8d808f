//! A single running controller process.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;

use tracing::{debug, error, info, warn};

use rgb_everywhere_core::{Error, Result, SessionId, SessionStatus};

/// Owned handle to one launched controller process and its stdin.
///
/// The session is the only writer to the process. It is torn down exactly
/// once: by [`stop`](Self::stop), by a failed write or health check, or when
/// dropped while still running.
pub struct ControllerSession {
    id: SessionId,
    executable: String,
    child: Child,
    stdin: Option<ChildStdin>,
    status: SessionStatus,
}

impl std::fmt::Debug for ControllerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSession")
            .field("id", &self.id)
            .field("executable", &self.executable)
            .field("pid", &self.child.id())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl ControllerSession {
    /// Launch `executable` with `args`.
    ///
    /// stdin is piped for palette lines. stdout and stderr are piped and
    /// drained on background threads into debug logs so the controller never
    /// blocks on a full pipe.
    pub fn start(executable: &str, args: &[String]) -> Result<Self> {
        let id = SessionId::new();
        info!(
            "Launching controller: id={}, executable='{}', args={:?}",
            id, executable, args
        );

        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!("Failed to launch controller '{}': {}", executable, e);
                Error::Launch {
                    path: executable.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let stdin = child.stdin.take();
        if let Some(stdout) = child.stdout.take() {
            drain(id, "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            drain(id, "stderr", stderr);
        }

        info!("Controller started: id={}, pid={}", id, child.id());

        Ok(Self {
            id,
            executable: executable.to_string(),
            child,
            stdin,
            status: SessionStatus::Running,
        })
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Path the controller was launched from.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// OS process id.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether the session is running and the process has not exited.
    pub fn is_alive(&mut self) -> bool {
        if !self.status.is_running() {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                warn!("Could not poll controller {}: {}", self.id, e);
                false
            }
        }
    }

    /// Write one line to the controller and flush it.
    ///
    /// On failure the session is torn down and [`Error::SessionLost`] is
    /// returned. Writing to a session that is no longer running returns
    /// [`Error::SessionTerminated`].
    pub fn push(&mut self, line: &str) -> Result<()> {
        if !self.status.is_running() {
            return Err(Error::SessionTerminated);
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(Error::SessionTerminated);
        };

        let written = stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.flush());

        if let Err(e) = written {
            warn!("Write to controller {} failed: {}", self.id, e);
            self.teardown(SessionStatus::Lost);
            return Err(Error::SessionLost(self.id));
        }

        debug!("Pushed to controller {}: {}", self.id, line.trim_end());
        Ok(())
    }

    /// Check whether the process exited on its own.
    ///
    /// An exited process is reaped, the session is marked lost and
    /// [`Error::SessionLost`] is returned.
    pub fn health_check(&mut self) -> Result<()> {
        if !self.status.is_running() {
            return Err(Error::SessionTerminated);
        }

        match self.child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(exit)) => {
                warn!("Controller {} exited on its own: {}", self.id, exit);
                self.teardown(SessionStatus::Lost);
                Err(Error::SessionLost(self.id))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Close stdin, then kill and reap the process.
    ///
    /// Calling this on a session that was already stopped or lost logs a
    /// warning and does nothing else.
    pub fn stop(&mut self) {
        if !self.status.is_running() {
            warn!(
                "Controller session {} already stopped ({:?})",
                self.id, self.status
            );
            return;
        }
        self.teardown(SessionStatus::Terminated);
    }

    fn teardown(&mut self, status: SessionStatus) {
        info!(
            "Stopping controller: id={}, pid={}, executable={}",
            self.id,
            self.child.id(),
            self.executable()
        );

        // Dropping the handle closes the pipe.
        if self.stdin.take().is_none() {
            debug!("Controller {} stdin already closed", self.id);
        }

        match self.child.try_wait() {
            Ok(Some(exit)) => {
                debug!("Controller {} already exited: {}", self.id, exit);
            }
            polled => {
                if let Err(e) = polled {
                    warn!("Could not poll controller {}: {}", self.id, e);
                }
                if let Err(e) = self.child.kill() {
                    error!("Failed to kill controller {}: {}", self.id, e);
                }
                if let Err(e) = self.child.wait() {
                    warn!("Failed to reap controller {}: {}", self.id, e);
                }
            }
        }

        self.status = status;
        info!("Controller stopped: id={}, status={:?}", self.id, status);
    }
}

impl Drop for ControllerSession {
    fn drop(&mut self) {
        if self.status.is_running() {
            self.teardown(SessionStatus::Terminated);
        }
    }
}

/// Forward a child output stream to debug logs until it closes.
fn drain<R: Read + Send + 'static>(id: SessionId, stream: &'static str, source: R) {
    let spawned = thread::Builder::new()
        .name(format!("controller-{stream}"))
        .spawn(move || {
            for line in BufReader::new(source).lines() {
                match line {
                    Ok(line) => debug!("controller {} {}: {}", id, stream, line),
                    Err(_) => break,
                }
            }
            debug!("controller {} {} closed", id, stream);
        });

    if let Err(e) = spawned {
        warn!("Could not drain controller {}: {}", stream, e);
    }
}
