//! Controller session identity and status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a controller session.
///
/// Each launch of the controller process gets a fresh id so that log lines
/// from a relaunched controller can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Process is running and its stdin is writable
    Running,
    /// A write failed or the process exited on its own; torn down
    Lost,
    /// Stopped on request
    Terminated,
}

impl SessionStatus {
    /// Whether the session may still be written to.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }
}
