//! Monitor actor that handles worker exits.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use genserver_core::ServerEvent;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::messages::{MonitorMessage, MonitorStats};
use crate::registry::Registry;

/// State for the monitor actor.
pub struct MonitorState<T> {
    /// Registry exited workers are removed from.
    pub registry: Arc<Registry<T>>,
    /// Event broadcaster.
    pub event_tx: broadcast::Sender<ServerEvent>,
    /// Whether exited workers are deregistered.
    pub auto_deregister: bool,
    stats: MonitorStats,
}

/// Monitor actor arguments.
pub struct MonitorArgs<T> {
    pub registry: Arc<Registry<T>>,
    pub event_tx: broadcast::Sender<ServerEvent>,
    pub auto_deregister: bool,
}

/// Monitor actor that receives exit reports from every worker.
///
/// Exits are deregistered before the worker is marked `Exited`, so anyone
/// waiting on a worker sees the registry already updated.
pub struct Monitor<T>(PhantomData<fn() -> T>);

impl<T> Monitor<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Monitor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Actor for Monitor<T> {
    type Msg = MonitorMessage;
    type State = MonitorState<T>;
    type Arguments = MonitorArgs<T>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting gen-server monitor");

        Ok(MonitorState {
            registry: args.registry,
            event_tx: args.event_tx,
            auto_deregister: args.auto_deregister,
            stats: MonitorStats::default(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            MonitorMessage::WorkerExited {
                name,
                worker_id,
                reason,
                exit,
            } => {
                state.stats.exited += 1;
                if reason.is_failure() {
                    state.stats.failed += 1;
                    tracing::error!("Gen-server '{}' ({}) terminated: {}", name, worker_id, reason);
                } else {
                    tracing::info!("Gen-server '{}' ({}) terminated: {}", name, worker_id, reason);
                }

                let deregistered =
                    state.auto_deregister && state.registry.remove_if_current(&name, worker_id);
                if deregistered {
                    state.stats.deregistered += 1;
                }
                exit.finish();

                let _ = state.event_tx.send(ServerEvent::WorkerExited {
                    name: name.to_string(),
                    worker_id,
                    reason,
                    deregistered,
                    timestamp: Utc::now(),
                });
            }

            MonitorMessage::GetStats { reply } => {
                let _ = reply.send(state.stats);
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            "Gen-server monitor stopped after {} exits ({} failed)",
            state.stats.exited,
            state.stats.failed
        );
        Ok(())
    }
}
