//! Core domain types for the gen-server registry.
//!
//! This crate contains the plain-data types shared across all packages:
//! - Message and Delivery for mailbox traffic
//! - WorkerId, WorkerState and ExitReason for worker lifecycles
//! - ServerEvent for lifecycle notifications
//! - SupervisorConfig for tuning the supervisor

mod config;
mod events;
mod message;
mod worker;

pub use config::{DuplicatePolicy, SupervisorConfig};
pub use events::ServerEvent;
pub use message::{Delivery, Message};
pub use worker::{ExitReason, WorkerId, WorkerInfo, WorkerState};
