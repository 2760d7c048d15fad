//! Named gen-server registry.
//!
//! This crate runs named workers ("gen-servers") on tokio. Each worker owns
//! a bounded mailbox and hands every payload to its dispatcher, one at a time,
//! until it receives `Message::Terminate`.
//!
//! # Architecture
//!
//! - `Supervisor` - Public API: spawn, send, terminate, publish
//! - `Registry` - Name to worker handle directory
//! - `Monitor` - Ractor actor receiving exit reports and deregistering workers
//! - `Mailbox` - Registration for tasks that poll their own messages
//!
//! # Usage
//!
//! ```ignore
//! use actors::{FnDispatcher, start_supervisor};
//!
//! let supervisor = start_supervisor::<String>().await?;
//! supervisor.spawn("A", FnDispatcher::new(|msg: String| {
//!     println!("{}", msg);
//!     Ok(())
//! }))?;
//! supervisor.send("A", "hello".into()).await;
//! supervisor.terminate("A").await;
//! ```

mod dispatcher;
mod error;
mod mailbox;
mod messages;
mod monitor;
mod pubsub;
mod registry;
mod supervisor;
mod worker;

pub use dispatcher::{AsyncFnDispatcher, DispatchFuture, DispatchResult, Dispatcher, FnDispatcher};
pub use error::{GenServerError, GenServerResult};
pub use mailbox::Mailbox;
pub use messages::MonitorStats;
pub use pubsub::TopicTable;
pub use registry::Registry;
pub use supervisor::{Supervisor, start_supervisor};
pub use worker::WorkerHandle;

/// Re-export core types for convenience.
pub use genserver_core::{
    Delivery, DuplicatePolicy, ExitReason, Message, ServerEvent, SupervisorConfig, WorkerId,
    WorkerInfo, WorkerState,
};
