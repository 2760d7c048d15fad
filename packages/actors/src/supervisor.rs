//! Supervisor: the public surface over the registry, workers and monitor.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use genserver_core::{Delivery, DuplicatePolicy, Message, ServerEvent, SupervisorConfig};
use ractor::{Actor, ActorRef};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::dispatcher::Dispatcher;
use crate::error::{GenServerError, GenServerResult};
use crate::mailbox::Mailbox;
use crate::messages::{MonitorMessage, MonitorStats};
use crate::monitor::{Monitor, MonitorArgs};
use crate::pubsub::TopicTable;
use crate::registry::Registry;
use crate::worker::{self, ExitLink, WorkerHandle};

/// Owns a registry of named gen-servers and routes messages to them.
///
/// Dropping the supervisor clears its registry and asks every registered
/// worker to stop.
pub struct Supervisor<T: Send + 'static> {
    registry: Arc<Registry<T>>,
    topics: TopicTable,
    config: SupervisorConfig,
    monitor: ActorRef<MonitorMessage>,
    event_tx: broadcast::Sender<ServerEvent>,
    runtime: Handle,
}

/// Start a supervisor with the default configuration.
pub async fn start_supervisor<T: Send + 'static>() -> GenServerResult<Supervisor<T>> {
    Supervisor::start(SupervisorConfig::default()).await
}

impl<T: Send + 'static> Supervisor<T> {
    /// Start a supervisor and its exit monitor.
    pub async fn start(config: SupervisorConfig) -> GenServerResult<Self> {
        let registry = Arc::new(Registry::new());
        let (event_tx, _) = broadcast::channel(config.event_capacity());

        let args = MonitorArgs {
            registry: registry.clone(),
            event_tx: event_tx.clone(),
            auto_deregister: config.auto_deregister,
        };
        // Unnamed: ractor names are process-wide and supervisors are not.
        let (monitor, _handle) = Actor::spawn(None, Monitor::<T>::new(), args).await?;

        tracing::info!(
            "Supervisor started (mailbox capacity {}, duplicates {:?})",
            config.mailbox_capacity(),
            config.duplicate_names
        );

        Ok(Self {
            registry,
            topics: TopicTable::new(),
            config,
            monitor,
            event_tx,
            runtime: Handle::current(),
        })
    }

    /// Spawn a gen-server under `name`.
    pub fn spawn<D>(
        &self,
        name: impl Into<String>,
        dispatcher: D,
    ) -> GenServerResult<WorkerHandle<T>>
    where
        D: Dispatcher<T>,
    {
        self.spawn_shared(name, Arc::new(dispatcher))
    }

    /// Spawn a gen-server with a dispatcher the caller keeps a reference to.
    ///
    /// The handle is registered before the worker task starts; messages sent
    /// in between wait in the mailbox.
    pub fn spawn_shared(
        &self,
        name: impl Into<String>,
        dispatcher: Arc<dyn Dispatcher<T>>,
    ) -> GenServerResult<WorkerHandle<T>> {
        let name: Arc<str> = Arc::from(name.into());
        let (handle, inbox) =
            WorkerHandle::channel(name, dispatcher, self.config.mailbox_capacity());
        self.register(&handle)?;
        let _ = self.event_tx.send(ServerEvent::WorkerSpawned {
            name: handle.name().to_string(),
            worker_id: handle.id(),
            timestamp: Utc::now(),
        });

        let link = ExitLink {
            monitor: self.monitor.clone(),
            registry: Arc::downgrade(&self.registry),
            auto_deregister: self.config.auto_deregister,
        };
        worker::start(&self.runtime, &handle, inbox, link);
        Ok(handle)
    }

    /// Register a mailbox that the caller polls itself.
    pub fn register_mailbox<D>(
        &self,
        name: impl Into<String>,
        dispatcher: D,
    ) -> GenServerResult<Mailbox<T>>
    where
        D: Dispatcher<T>,
    {
        let name: Arc<str> = Arc::from(name.into());
        let (handle, inbox) = WorkerHandle::channel(
            name.clone(),
            Arc::new(dispatcher),
            self.config.mailbox_capacity(),
        );
        self.register(&handle)?;
        let _ = self.event_tx.send(ServerEvent::MailboxRegistered {
            name: handle.name().to_string(),
            worker_id: handle.id(),
            timestamp: Utc::now(),
        });
        Ok(Mailbox::new(name, handle.id(), handle.dispatcher().clone(), inbox))
    }

    fn register(&self, handle: &WorkerHandle<T>) -> GenServerResult<()> {
        match self.config.duplicate_names {
            DuplicatePolicy::Reject => {
                if let Err(existing) = self.registry.store_if_absent(handle.clone()) {
                    tracing::warn!(
                        "Refusing to register '{}': name held by {}",
                        handle.name(),
                        existing.id()
                    );
                    return Err(GenServerError::NameAlreadyRegistered(handle.name().to_string()));
                }
            }
            DuplicatePolicy::Replace => {
                if let Some(previous) = self.registry.store(handle.clone()) {
                    tracing::warn!(
                        "Gen-server '{}' replaced, previous worker {} keeps running unregistered",
                        handle.name(),
                        previous.id()
                    );
                    let _ = self.event_tx.send(ServerEvent::WorkerReplaced {
                        name: handle.name().to_string(),
                        previous: previous.id(),
                        current: handle.id(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Remove a registration without signalling the worker.
    pub fn unregister(&self, name: &str) -> bool {
        let Some(handle) = self.registry.remove(name) else {
            return false;
        };
        let _ = self.event_tx.send(ServerEvent::WorkerUnregistered {
            name: handle.name().to_string(),
            worker_id: handle.id(),
            timestamp: Utc::now(),
        });
        true
    }

    /// Send a payload to the worker registered under `name`.
    ///
    /// Waits while the mailbox is full, bounded by the configured send
    /// timeout. Unknown names return `Delivery::NotFound` immediately.
    pub async fn send(&self, name: &str, payload: T) -> Delivery {
        self.deliver(name, Message::Payload(payload)).await
    }

    /// Send a payload without waiting for mailbox capacity.
    pub fn try_send(&self, name: &str, payload: T) -> Delivery {
        match self.lookup(name) {
            Some(handle) => handle.try_deliver(Message::Payload(payload)),
            None => Delivery::NotFound,
        }
    }

    /// Send a payload, giving up when `cancel` completes before capacity frees up.
    pub async fn send_or_cancel<C>(&self, name: &str, payload: T, cancel: C) -> Delivery
    where
        C: Future<Output = ()>,
    {
        match self.lookup(name) {
            Some(handle) => handle.deliver_or_cancel(Message::Payload(payload), cancel).await,
            None => Delivery::NotFound,
        }
    }

    /// Ask the worker registered under `name` to stop.
    ///
    /// Does not wait for the exit.
    pub async fn terminate(&self, name: &str) -> Delivery {
        self.deliver(name, Message::Terminate).await
    }

    /// Ask every registered worker to stop. Returns how many were signalled.
    pub async fn terminate_all(&self) -> usize {
        let handles = self.registry.get_all();
        let timeout = self.config.send_timeout();
        let outcomes = join_all(
            handles
                .iter()
                .map(|handle| handle.deliver(Message::Terminate, timeout)),
        )
        .await;
        outcomes.into_iter().filter(|d| d.is_delivered()).count()
    }

    /// Wait for the worker registered under `name` to exit.
    ///
    /// Returns false if no such worker is registered.
    pub async fn wait(&self, name: &str) -> bool {
        let Some(handle) = self.registry.get(name) else {
            return false;
        };
        handle.wait_exited().await;
        true
    }

    /// Wait for every currently registered worker to exit.
    pub async fn wait_all(&self) {
        let handles = self.registry.get_all();
        join_all(handles.iter().map(|handle| handle.wait_exited())).await;
    }

    /// Terminate `name` and wait for it to exit.
    pub async fn terminate_and_wait(&self, name: &str) -> bool {
        let Some(handle) = self.registry.get(name) else {
            return false;
        };
        if !handle.terminate().await.is_delivered() {
            tracing::debug!("Gen-server '{}' was already closed", name);
        }
        handle.wait_exited().await;
        true
    }

    /// Terminate every worker and wait for all of them.
    pub async fn shutdown(&self) {
        let handles = self.registry.get_all();
        tracing::info!("Shutting down {} gen-servers", handles.len());
        join_all(handles.iter().map(|handle| async move {
            handle.terminate().await;
            handle.wait_exited().await;
        }))
        .await;
    }

    async fn deliver(&self, name: &str, message: Message<T>) -> Delivery {
        match self.lookup(name) {
            Some(handle) => handle.deliver(message, self.config.send_timeout()).await,
            None => Delivery::NotFound,
        }
    }

    fn lookup(&self, name: &str) -> Option<WorkerHandle<T>> {
        let handle = self.registry.get(name);
        if handle.is_none() {
            tracing::debug!("No gen-server registered as '{}'", name);
        }
        handle
    }

    /// Subscribe the worker `name` to `topic`.
    pub fn subscribe(&self, name: &str, topic: &str) -> bool {
        self.topics.subscribe(name, topic)
    }

    /// Remove the worker `name` from `topic`.
    pub fn unsubscribe(&self, name: &str, topic: &str) -> bool {
        self.topics.unsubscribe(name, topic)
    }

    /// Names subscribed to `topic`.
    pub fn subscribers(&self, topic: &str) -> Vec<String> {
        self.topics.subscribers(topic).unwrap_or_default()
    }

    /// Receive lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Ask the monitor for its exit counters.
    pub async fn monitor_stats(&self) -> Option<MonitorStats> {
        let result = ractor::rpc::call(
            &self.monitor,
            |reply| MonitorMessage::GetStats { reply },
            Some(self.config.rpc_timeout()),
        )
        .await;
        match result {
            Ok(ractor::rpc::CallResult::Success(stats)) => Some(stats),
            _ => None,
        }
    }

    /// The registry backing this supervisor.
    pub fn registry(&self) -> &Arc<Registry<T>> {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }
}

impl<T: Clone + Send + 'static> Supervisor<T> {
    /// Send a payload to every subscriber of `topic`.
    ///
    /// Returns how many subscribers received it. Publishing to a topic nobody
    /// subscribed to is logged and otherwise ignored.
    pub async fn publish(&self, topic: &str, payload: T) -> usize {
        let Some(subscribers) = self.topics.subscribers(topic) else {
            tracing::warn!("Publish to topic '{}' with no subscribers", topic);
            return 0;
        };

        let mut delivered = 0;
        for name in subscribers {
            if self.send(&name, payload.clone()).await.is_delivered() {
                delivered += 1;
            }
        }
        delivered
    }
}

impl<T: Send + 'static> Drop for Supervisor<T> {
    fn drop(&mut self) {
        let handles = self.registry.drain();
        if !handles.is_empty() {
            tracing::info!("Supervisor dropped, terminating {} gen-servers", handles.len());
            self.runtime.spawn(async move {
                join_all(handles.iter().map(|handle| handle.terminate())).await;
            });
        }
        // Reports still queued are discarded; their notices mark the workers exited.
        self.monitor.stop(None);
    }
}
