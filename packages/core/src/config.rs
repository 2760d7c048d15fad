//! Supervisor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What `spawn` does when the name is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins. The previous worker keeps running, unreachable by name.
    #[default]
    Replace,
    /// Refuse the spawn and leave the existing worker in place.
    Reject,
}

/// Configuration for supervisor behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Number of messages a mailbox buffers before senders wait.
    pub mailbox_capacity: usize,
    /// How long a send waits for mailbox capacity (milliseconds).
    /// `None` waits indefinitely. `Some(0)` fails at once on a full mailbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_timeout_ms: Option<u64>,
    /// Handling of duplicate worker names.
    pub duplicate_names: DuplicatePolicy,
    /// Remove a worker from the registry once it exits.
    pub auto_deregister: bool,
    /// Buffer size of the lifecycle event channel.
    pub event_capacity: usize,
    /// Timeout for calls into the monitor actor (milliseconds).
    pub rpc_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1,
            send_timeout_ms: None,
            duplicate_names: DuplicatePolicy::Replace,
            auto_deregister: true,
            event_capacity: 1024,
            rpc_timeout_ms: 5000,
        }
    }
}

impl SupervisorConfig {
    /// Set the mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Bound how long a send waits for mailbox capacity.
    ///
    /// Nonzero timeouts under a millisecond round up to one millisecond.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.send_timeout_ms = Some(if millis == 0 && !timeout.is_zero() { 1 } else { millis });
        self
    }

    /// Set the duplicate name policy.
    pub fn with_duplicate_names(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_names = policy;
        self
    }

    /// Enable or disable deregistration on exit.
    pub fn with_auto_deregister(mut self, enabled: bool) -> Self {
        self.auto_deregister = enabled;
        self
    }

    /// Set the lifecycle event buffer size.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Effective mailbox capacity. Tokio channels need at least one slot.
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity.max(1)
    }

    /// Effective event buffer size.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }

    /// Send timeout, if one is configured.
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }

    /// Monitor call timeout.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
