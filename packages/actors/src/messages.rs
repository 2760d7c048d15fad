//! Message types for the exit monitor.

use std::sync::Arc;

use genserver_core::{ExitReason, WorkerId};
use ractor::RpcReplyPort;
use serde::Serialize;

use crate::worker::ExitNotice;

/// Messages for the Monitor actor.
#[derive(Debug)]
pub enum MonitorMessage {
    /// A worker's loop finished.
    WorkerExited {
        name: Arc<str>,
        worker_id: WorkerId,
        reason: ExitReason,
        /// Marks the worker `Exited` once the report is handled or dropped.
        exit: ExitNotice,
    },

    /// Get exit statistics.
    GetStats { reply: RpcReplyPort<MonitorStats> },
}

/// Exit counters kept by the monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Workers that finished for any reason.
    pub exited: u64,
    /// Workers whose dispatcher failed or panicked.
    pub failed: u64,
    /// Registry entries removed on exit.
    pub deregistered: u64,
}
