//! Worker identity and lifecycle types.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for one worker incarnation.
///
/// Two workers spawned under the same name get different IDs, which lets a
/// late exit report tell an orphaned worker apart from its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub Ulid);

impl WorkerId {
    /// Create a new unique worker ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a worker ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Receiving and dispatching messages.
    #[default]
    Running,
    /// The terminate message was received; nothing more is dispatched.
    Terminating,
    /// The loop has finished and the exit has been reported.
    Exited,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Running => write!(f, "running"),
            WorkerState::Terminating => write!(f, "terminating"),
            WorkerState::Exited => write!(f, "exited"),
        }
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExitReason {
    /// The terminate message was processed.
    Normal,
    /// The dispatcher returned an error.
    DispatchFailed(String),
    /// The dispatcher panicked.
    Panicked(String),
    /// Every sender was dropped.
    Disconnected,
    /// The task was cancelled by the runtime.
    Cancelled,
}

impl ExitReason {
    /// Check if the worker stopped because of a fault.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExitReason::DispatchFailed(_) | ExitReason::Panicked(_)
        )
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Normal => write!(f, "normal"),
            ExitReason::DispatchFailed(error) => write!(f, "dispatch failed: {}", error),
            ExitReason::Panicked(message) => write!(f, "panicked: {}", message),
            ExitReason::Disconnected => write!(f, "disconnected"),
            ExitReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Snapshot row describing one registered worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub name: String,
    pub worker_id: WorkerId,
    pub state: WorkerState,
}
