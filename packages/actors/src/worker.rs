//! Gen-server worker: handle, receive loop and exit watcher.

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use genserver_core::{Delivery, ExitReason, Message, WorkerId, WorkerInfo, WorkerState};
use ractor::ActorRef;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::dispatcher::Dispatcher;
use crate::messages::MonitorMessage;
use crate::registry::Registry;

/// Handle to a registered worker.
///
/// Clones share the same mailbox. The worker task owns the receive end.
pub struct WorkerHandle<T> {
    name: Arc<str>,
    id: WorkerId,
    dispatcher: Arc<dyn Dispatcher<T>>,
    sender: mpsc::Sender<Message<T>>,
    state: watch::Receiver<WorkerState>,
}

/// Receive side of a freshly created mailbox.
pub(crate) struct Inbox<T> {
    pub(crate) receiver: mpsc::Receiver<Message<T>>,
    pub(crate) state: watch::Sender<WorkerState>,
}

impl<T: Send + 'static> WorkerHandle<T> {
    /// Create a handle and the matching inbox.
    pub(crate) fn channel(
        name: Arc<str>,
        dispatcher: Arc<dyn Dispatcher<T>>,
        capacity: usize,
    ) -> (Self, Inbox<T>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (state_tx, state_rx) = watch::channel(WorkerState::Running);
        let handle = Self {
            name,
            id: WorkerId::new(),
            dispatcher,
            sender,
            state: state_rx,
        };
        (
            handle,
            Inbox {
                receiver,
                state: state_tx,
            },
        )
    }

    /// Send a payload, waiting for mailbox capacity.
    pub async fn send(&self, payload: T) -> Delivery {
        self.deliver(Message::Payload(payload), None).await
    }

    /// Send the terminate message, waiting for mailbox capacity.
    pub async fn terminate(&self) -> Delivery {
        self.deliver(Message::Terminate, None).await
    }

    /// Write a message, waiting at most `timeout` for capacity when given.
    pub(crate) async fn deliver(
        &self,
        message: Message<T>,
        timeout: Option<Duration>,
    ) -> Delivery {
        match timeout {
            None => match self.sender.send(message).await {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
            Some(timeout) => match self.sender.send_timeout(message, timeout).await {
                Ok(()) => Delivery::Delivered,
                Err(mpsc::error::SendTimeoutError::Timeout(_)) => Delivery::TimedOut,
                Err(mpsc::error::SendTimeoutError::Closed(_)) => Delivery::Closed,
            },
        }
    }

    /// Write a message without waiting.
    pub(crate) fn try_deliver(&self, message: Message<T>) -> Delivery {
        match self.sender.try_send(message) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Write a message, giving up when `cancel` completes first.
    pub(crate) async fn deliver_or_cancel<C>(&self, message: Message<T>, cancel: C) -> Delivery
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            permit = self.sender.reserve() => match permit {
                Ok(permit) => {
                    permit.send(message);
                    Delivery::Delivered
                }
                Err(_) => Delivery::Closed,
            },
            () = cancel => Delivery::Cancelled,
        }
    }
}

impl<T> WorkerHandle<T> {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Incarnation ID.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Dispatcher this worker was spawned with.
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher<T>> {
        &self.dispatcher
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Check if the mailbox no longer accepts messages.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Wait until the worker has exited.
    pub async fn wait_exited(&self) {
        let mut state = self.state.clone();
        // A dropped state sender means the worker is gone as well.
        let _ = state.wait_for(|s| *s == WorkerState::Exited).await;
    }

    /// Snapshot row for this worker.
    pub fn info(&self) -> WorkerInfo {
        WorkerInfo {
            name: self.name.to_string(),
            worker_id: self.id,
            state: self.state(),
        }
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}

impl<T> Clone for WorkerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            dispatcher: self.dispatcher.clone(),
            sender: self.sender.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> std::fmt::Debug for WorkerHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Settles a worker's exit when dropped: deregisters it if configured, then
/// marks it `Exited`.
///
/// Travels with the exit report, so the exit settles even if the report is
/// rejected or discarded before the monitor handles it.
pub struct ExitNotice {
    state: Arc<watch::Sender<WorkerState>>,
    deregister: Option<Box<dyn FnOnce() + Send>>,
}

impl ExitNotice {
    fn new(state: Arc<watch::Sender<WorkerState>>) -> Self {
        Self {
            state,
            deregister: None,
        }
    }

    fn with_deregister<T: Send + 'static>(
        mut self,
        registry: Weak<Registry<T>>,
        name: Arc<str>,
        worker_id: WorkerId,
    ) -> Self {
        self.deregister = Some(Box::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove_if_current(&name, worker_id);
            }
        }));
        self
    }

    /// Mark the worker `Exited` once the caller has deregistered it.
    pub(crate) fn finish(mut self) {
        self.deregister = None;
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        if let Some(deregister) = self.deregister.take() {
            deregister();
        }
        self.state.send_replace(WorkerState::Exited);
    }
}

impl std::fmt::Debug for ExitNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitNotice")
            .field("state", &*self.state.borrow())
            .field("deregister", &self.deregister.is_some())
            .finish()
    }
}

/// Where a worker reports its exit.
pub(crate) struct ExitLink<T> {
    pub(crate) monitor: ActorRef<MonitorMessage>,
    pub(crate) registry: Weak<Registry<T>>,
    pub(crate) auto_deregister: bool,
}

impl<T: Send + 'static> ExitLink<T> {
    fn notice(
        &self,
        state: Arc<watch::Sender<WorkerState>>,
        name: Arc<str>,
        worker_id: WorkerId,
    ) -> ExitNotice {
        let notice = ExitNotice::new(state);
        if self.auto_deregister {
            notice.with_deregister(self.registry.clone(), name, worker_id)
        } else {
            notice
        }
    }

    fn report(self, name: Arc<str>, worker_id: WorkerId, reason: ExitReason, exit: ExitNotice) {
        let message = MonitorMessage::WorkerExited {
            name: name.clone(),
            worker_id,
            reason,
            exit,
        };
        // A rejected report drops its notice, which settles the exit.
        if self.monitor.send_message(message).is_err() {
            tracing::warn!("Monitor unavailable, gen-server '{}' settling its own exit", name);
        }
    }
}

/// Start the receive loop for `handle` and a watcher that reports its exit.
pub(crate) fn start<T: Send + 'static>(
    runtime: &Handle,
    handle: &WorkerHandle<T>,
    inbox: Inbox<T>,
    link: ExitLink<T>,
) {
    let name = handle.shared_name();
    let worker_id = handle.id();
    let state = Arc::new(inbox.state);
    // Owned by the watcher, so a runtime shutdown also settles the exit.
    let exit = link.notice(state.clone(), name.clone(), worker_id);

    let worker = runtime.spawn(run(
        name.clone(),
        handle.dispatcher().clone(),
        inbox.receiver,
        state,
    ));

    runtime.spawn(async move {
        let reason = match worker.await {
            Ok(reason) => reason,
            Err(error) if error.is_panic() => {
                ExitReason::Panicked(panic_message(error.into_panic()))
            }
            Err(_) => ExitReason::Cancelled,
        };
        link.report(name, worker_id, reason, exit);
    });
}

/// The gen-server loop.
async fn run<T: Send + 'static>(
    name: Arc<str>,
    dispatcher: Arc<dyn Dispatcher<T>>,
    mut receiver: mpsc::Receiver<Message<T>>,
    state: Arc<watch::Sender<WorkerState>>,
) -> ExitReason {
    tracing::info!("Starting gen-server: {}", name);

    let reason = loop {
        match receiver.recv().await {
            Some(Message::Payload(payload)) => {
                if let Err(error) = dispatcher.dispatch(payload).await {
                    tracing::error!("Gen-server '{}' dispatcher failed: {}", name, error);
                    break ExitReason::DispatchFailed(error);
                }
            }
            Some(Message::Terminate) => {
                state.send_replace(WorkerState::Terminating);
                break ExitReason::Normal;
            }
            None => break ExitReason::Disconnected,
        }
    };

    // Anything queued behind the exit point is dropped with the receiver.
    receiver.close();
    tracing::info!("Gen-server exiting: {} ({})", name, reason);
    reason
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
