//! Mailboxes for tasks that are not gen-servers.
//!
//! A task that wants to be reachable by name but runs its own loop (the main
//! task of a console program, for instance) registers a mailbox and polls it.

use std::sync::Arc;
use std::time::Duration;

use genserver_core::{Message, WorkerId, WorkerState};
use tokio::sync::{mpsc, watch};

use crate::dispatcher::Dispatcher;
use crate::error::{GenServerError, GenServerResult};
use crate::worker::Inbox;

/// Receive end of a registered, manually polled mailbox.
pub struct Mailbox<T> {
    name: Arc<str>,
    id: WorkerId,
    dispatcher: Arc<dyn Dispatcher<T>>,
    receiver: mpsc::Receiver<Message<T>>,
    state: watch::Sender<WorkerState>,
}

impl<T: Send + 'static> Mailbox<T> {
    pub(crate) fn new(
        name: Arc<str>,
        id: WorkerId,
        dispatcher: Arc<dyn Dispatcher<T>>,
        inbox: Inbox<T>,
    ) -> Self {
        Self {
            name,
            id,
            dispatcher,
            receiver: inbox.receiver,
            state: inbox.state,
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration ID.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Wait up to `timeout` for the next message.
    ///
    /// Returns `None` on timeout or once the mailbox has been terminated.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<Message<T>> {
        if self.state() != WorkerState::Running {
            return None;
        }
        let message = tokio::time::timeout(timeout, self.receiver.recv())
            .await
            .ok()
            .flatten()?;
        if message.is_terminate() {
            self.stop();
        }
        Some(message)
    }

    /// Dispatch every message that is ready, on the calling task.
    ///
    /// Stops at `Terminate`. Returns the number of payloads dispatched.
    pub async fn dispatch_pending(&mut self) -> GenServerResult<usize> {
        let mut dispatched = 0;
        while self.state() == WorkerState::Running {
            match self.receiver.try_recv() {
                Ok(Message::Payload(payload)) => {
                    self.dispatcher
                        .dispatch(payload)
                        .await
                        .map_err(GenServerError::Dispatch)?;
                    dispatched += 1;
                }
                Ok(Message::Terminate) => self.stop(),
                Err(_) => break,
            }
        }
        Ok(dispatched)
    }

    fn stop(&mut self) {
        self.state.send_replace(WorkerState::Terminating);
        self.receiver.close();
    }
}

impl<T> Drop for Mailbox<T> {
    fn drop(&mut self) {
        self.state.send_replace(WorkerState::Exited);
    }
}
