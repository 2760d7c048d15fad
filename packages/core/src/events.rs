//! Lifecycle events for registered workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ExitReason, WorkerId};

/// Events emitted by the supervisor as workers come and go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A worker was registered and started.
    WorkerSpawned {
        name: String,
        worker_id: WorkerId,
        timestamp: DateTime<Utc>,
    },
    /// A mailbox polled by its owner was registered. No worker task runs.
    MailboxRegistered {
        name: String,
        worker_id: WorkerId,
        timestamp: DateTime<Utc>,
    },
    /// A spawn took over a name; the previous worker was orphaned.
    WorkerReplaced {
        name: String,
        previous: WorkerId,
        current: WorkerId,
        timestamp: DateTime<Utc>,
    },
    /// A worker's loop finished.
    WorkerExited {
        name: String,
        worker_id: WorkerId,
        reason: ExitReason,
        deregistered: bool,
        timestamp: DateTime<Utc>,
    },
    /// A registration was removed explicitly.
    WorkerUnregistered {
        name: String,
        worker_id: WorkerId,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ServerEvent::WorkerSpawned { timestamp, .. } => *timestamp,
            ServerEvent::MailboxRegistered { timestamp, .. } => *timestamp,
            ServerEvent::WorkerReplaced { timestamp, .. } => *timestamp,
            ServerEvent::WorkerExited { timestamp, .. } => *timestamp,
            ServerEvent::WorkerUnregistered { timestamp, .. } => *timestamp,
        }
    }

    /// Get the worker name the event refers to.
    pub fn name(&self) -> &str {
        match self {
            ServerEvent::WorkerSpawned { name, .. } => name,
            ServerEvent::MailboxRegistered { name, .. } => name,
            ServerEvent::WorkerReplaced { name, .. } => name,
            ServerEvent::WorkerExited { name, .. } => name,
            ServerEvent::WorkerUnregistered { name, .. } => name,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            ServerEvent::WorkerSpawned {
                name, worker_id, ..
            } => format!("Gen-server '{}' spawned as {}", name, worker_id),
            ServerEvent::MailboxRegistered {
                name, worker_id, ..
            } => format!("Mailbox '{}' registered as {}", name, worker_id),
            ServerEvent::WorkerReplaced {
                name,
                previous,
                current,
                ..
            } => format!("Gen-server '{}' replaced: {} -> {}", name, previous, current),
            ServerEvent::WorkerExited {
                name,
                reason,
                deregistered,
                ..
            } => {
                let suffix = if *deregistered { " (deregistered)" } else { "" };
                format!("Gen-server '{}' exited: {}{}", name, reason, suffix)
            }
            ServerEvent::WorkerUnregistered { name, .. } => {
                format!("Gen-server '{}' unregistered", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_event_serializes_with_tag() -> Result<(), serde_json::Error> {
        let event = ServerEvent::WorkerExited {
            name: "A".into(),
            worker_id: WorkerId::new(),
            reason: ExitReason::Normal,
            deregistered: true,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["event"], "worker_exited");
        assert_eq!(json["reason"]["reason"], "normal");

        let back: ServerEvent = serde_json::from_value(json)?;
        assert_eq!(back, event);
        Ok(())
    }

    #[test]
    fn mailbox_registration_has_its_own_tag() -> Result<(), serde_json::Error> {
        let event = ServerEvent::MailboxRegistered {
            name: "poller".into(),
            worker_id: WorkerId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["event"], "mailbox_registered");
        assert!(event.description().starts_with("Mailbox 'poller' registered"));
        Ok(())
    }

    #[test]
    fn description_mentions_name_and_reason() {
        let event = ServerEvent::WorkerExited {
            name: "REAL".into(),
            worker_id: WorkerId::new(),
            reason: ExitReason::DispatchFailed("bad payload".into()),
            deregistered: false,
            timestamp: Utc::now(),
        };
        assert_eq!(event.name(), "REAL");
        assert_eq!(
            event.description(),
            "Gen-server 'REAL' exited: dispatch failed: bad payload"
        );
    }
}
