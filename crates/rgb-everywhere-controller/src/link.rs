//! Link between the sampling pipeline and the controller process.

use tracing::{debug, info, warn};

use rgb_everywhere_core::{ControllerSettings, Error, LaunchMode, Palette, Result, SessionId};

use crate::session::ControllerSession;
use crate::wire;

/// How the link launches and talks to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Controller executable
    pub executable: String,
    /// Static arguments for [`LaunchMode::Startup`]
    pub args: Vec<String>,
    /// Wire separator
    pub separator: String,
    /// When and how the controller is launched
    pub launch: LaunchMode,
}

impl LinkConfig {
    /// Build from the executable path and the `controller` config section.
    pub fn from_settings(executable: impl Into<String>, settings: &ControllerSettings) -> Self {
        Self {
            executable: executable.into(),
            args: settings.args.clone(),
            separator: settings.separator.clone(),
            launch: settings.launch,
        }
    }
}

/// Result of a successful [`ControllerLink::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The line was written and flushed
    Delivered,
    /// No session was live; nothing was written
    NoSession,
}

/// Owns at most one controller session at a time.
///
/// The link never restarts a controller by itself. When a session is lost it
/// is dropped and subsequent pushes are no-ops until [`start`](Self::start)
/// is called again.
#[derive(Debug)]
pub struct ControllerLink {
    config: LinkConfig,
    session: Option<ControllerSession>,
}

impl ControllerLink {
    /// Create a link with no session.
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Whether a session is currently held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the current session.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(ControllerSession::id)
    }

    /// Launch a controller, stopping any previous session first.
    ///
    /// In [`LaunchMode::FirstPalette`] the channels of `palette` become the
    /// command-line arguments; without a palette the static arguments are
    /// used. [`LaunchMode::Startup`] always uses the static arguments.
    pub fn start(&mut self, palette: Option<&Palette>) -> Result<SessionId> {
        if let Some(mut previous) = self.session.take() {
            debug!("Replacing controller session {}", previous.id());
            previous.stop();
        }

        let args = self.launch_args(palette);
        let session = ControllerSession::start(&self.config.executable, &args)?;
        let id = session.id();
        self.session = Some(session);
        Ok(id)
    }

    fn launch_args(&self, palette: Option<&Palette>) -> Vec<String> {
        match (self.config.launch, palette) {
            (LaunchMode::FirstPalette, Some(palette)) => wire::launch_args(palette),
            _ => self.config.args.clone(),
        }
    }

    /// Send one palette line to the live session.
    ///
    /// Returns [`PushOutcome::NoSession`] when there is nothing to write to.
    /// A failed write drops the session and returns [`Error::SessionLost`].
    pub fn push(&mut self, palette: &Palette) -> Result<PushOutcome> {
        let Some(session) = self.session.as_mut() else {
            debug!("No controller session, palette not pushed");
            return Ok(PushOutcome::NoSession);
        };

        let line = wire::format_line(palette, &self.config.separator);
        match session.push(&line) {
            Ok(()) => Ok(PushOutcome::Delivered),
            Err(e @ (Error::SessionLost(_) | Error::SessionTerminated)) => {
                self.session = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Check that the controller is still running.
    ///
    /// A controller that exited on its own is reaped and dropped, and
    /// [`Error::SessionLost`] is returned. With no session this is `Ok`.
    pub fn health_check(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        if let Err(e) = session.health_check() {
            self.session = None;
            return Err(e);
        }
        Ok(())
    }

    /// Stop the current session, if any.
    pub fn stop(&mut self) {
        match self.session.take() {
            Some(mut session) => {
                session.stop();
                info!("Controller link stopped");
            }
            None => warn!("Controller link has no session to stop"),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use rgb_everywhere_core::ColorSample;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn palette() -> Palette {
        Palette::new(
            vec![
                ColorSample::new(255, 0, 0),
                ColorSample::new(0, 255, 0),
                ColorSample::new(0, 0, 255),
            ],
            3,
        )
        .unwrap()
    }

    fn wait_for_contents(path: &Path, expected: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if std::fs::read_to_string(path).unwrap_or_default() == expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    /// `sh -c` script that records its arguments and then its stdin.
    fn recording_link(dir: &Path, launch: LaunchMode) -> ControllerLink {
        let script = format!(
            "echo \"$@\" > '{}'; cat > '{}'",
            dir.join("args.txt").display(),
            dir.join("stdin.txt").display()
        );
        ControllerLink::new(LinkConfig {
            executable: "sh".to_string(),
            args: vec!["-c".to_string(), script, "controller".to_string()],
            separator: wire::DEFAULT_SEPARATOR.to_string(),
            launch,
        })
    }

    #[test]
    fn test_push_without_session_is_noop() {
        let mut link = ControllerLink::new(LinkConfig {
            executable: "true".to_string(),
            args: Vec::new(),
            separator: ",".to_string(),
            launch: LaunchMode::Startup,
        });
        assert!(!link.has_session());
        assert_eq!(link.push(&palette()).unwrap(), PushOutcome::NoSession);
        assert!(link.health_check().is_ok());
    }

    #[test]
    fn test_startup_launch_streams_palettes() {
        let dir = tempfile::tempdir().unwrap();
        let mut link = recording_link(dir.path(), LaunchMode::Startup);

        link.start(None).unwrap();
        assert_eq!(link.push(&palette()).unwrap(), PushOutcome::Delivered);
        assert!(wait_for_contents(
            &dir.path().join("stdin.txt"),
            "255,0,0,0,255,0,0,0,255\n"
        ));

        link.stop();
        assert!(!link.has_session());
    }

    #[test]
    fn test_launch_args_by_mode() {
        let config = |launch| LinkConfig {
            executable: "controller".to_string(),
            args: vec!["--static".to_string()],
            separator: ",".to_string(),
            launch,
        };

        let first = ControllerLink::new(config(LaunchMode::FirstPalette));
        assert_eq!(
            first.launch_args(Some(&palette())),
            vec!["255", "0", "0", "0", "255", "0", "0", "0", "255"]
        );
        assert_eq!(first.launch_args(None), vec!["--static"]);

        let startup = ControllerLink::new(config(LaunchMode::Startup));
        assert_eq!(startup.launch_args(Some(&palette())), vec!["--static"]);
    }

    #[test]
    fn test_first_palette_launch_passes_channels() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("args.txt");
        let script = dir.path().join("controller.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > '{}'\n", output.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut link = ControllerLink::new(LinkConfig {
            executable: script.display().to_string(),
            args: vec!["--static".to_string()],
            separator: ",".to_string(),
            launch: LaunchMode::FirstPalette,
        });
        link.start(Some(&palette())).unwrap();
        assert!(wait_for_contents(&output, "255 0 0 0 255 0 0 0 255\n"));
        link.stop();
    }

    #[test]
    fn test_startup_launch_passes_static_args() {
        let dir = tempfile::tempdir().unwrap();
        let mut link = recording_link(dir.path(), LaunchMode::Startup);
        link.start(Some(&palette())).unwrap();
        assert!(wait_for_contents(&dir.path().join("args.txt"), "\n"));
        link.stop();
    }

    #[test]
    fn test_launch_failure() {
        let mut link = ControllerLink::new(LinkConfig {
            executable: "/nonexistent/controller".to_string(),
            args: Vec::new(),
            separator: ",".to_string(),
            launch: LaunchMode::FirstPalette,
        });
        assert!(matches!(
            link.start(Some(&palette())),
            Err(Error::Launch { .. })
        ));
        assert!(!link.has_session());
    }

    #[test]
    fn test_lost_session_is_dropped() {
        let mut link = ControllerLink::new(LinkConfig {
            executable: "true".to_string(),
            args: Vec::new(),
            separator: ",".to_string(),
            launch: LaunchMode::Startup,
        });
        link.start(None).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut lost = false;
        while Instant::now() < deadline {
            if link.health_check().is_err() {
                lost = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(lost);
        assert!(!link.has_session());
        assert_eq!(link.push(&palette()).unwrap(), PushOutcome::NoSession);
    }

    #[test]
    fn test_push_to_exited_controller_drops_session() {
        let mut link = ControllerLink::new(LinkConfig {
            executable: "true".to_string(),
            args: Vec::new(),
            separator: ",".to_string(),
            launch: LaunchMode::Startup,
        });
        link.start(None).unwrap();

        // Keep pushing until the closed pipe is noticed.
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut result = link.push(&palette());
        while result.is_ok() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            result = link.push(&palette());
        }

        assert!(matches!(result, Err(Error::SessionLost(_))));
        assert!(!link.has_session());
        assert_eq!(link.push(&palette()).unwrap(), PushOutcome::NoSession);
    }

    #[test]
    fn test_start_replaces_session() {
        let mut link = ControllerLink::new(LinkConfig {
            executable: "sleep".to_string(),
            args: vec!["30".to_string()],
            separator: ",".to_string(),
            launch: LaunchMode::Startup,
        });
        let first = link.start(None).unwrap();
        let second = link.start(None).unwrap();
        assert_ne!(first, second);
        assert_eq!(link.session_id(), Some(second));

        link.stop();
        link.stop();
        assert!(!link.has_session());
    }
}
