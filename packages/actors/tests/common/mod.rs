#![allow(dead_code)]
#![allow(clippy::disallowed_methods)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{Dispatcher, FnDispatcher, ServerEvent};
use tokio::sync::broadcast;
use tokio::time::error::Elapsed;

/// Payloads observed by a recording dispatcher, in dispatch order.
pub type Seen<T> = Arc<Mutex<Vec<T>>>;

/// A dispatcher that records every payload it is given.
pub fn recorder<T: Send + 'static>() -> (Seen<T>, Arc<dyn Dispatcher<T>>) {
    let seen: Seen<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let dispatcher: Arc<dyn Dispatcher<T>> = Arc::new(FnDispatcher::new(move |payload: T| {
        sink.lock().map_err(|e| e.to_string())?.push(payload);
        Ok(())
    }));
    (seen, dispatcher)
}

pub fn seen<T: Clone>(seen: &Seen<T>) -> Vec<T> {
    seen.lock().unwrap().clone()
}

/// Run `future` with a generous upper bound so a hang fails the test.
pub async fn within<F: Future>(future: F) -> Result<F::Output, Elapsed> {
    tokio::time::timeout(Duration::from_secs(5), future).await
}

/// Wait for the exit event of the worker `name`.
pub async fn next_exit(
    events: &mut broadcast::Receiver<ServerEvent>,
    name: &str,
) -> Result<ServerEvent, Box<dyn std::error::Error>> {
    loop {
        let event = within(events.recv()).await??;
        if matches!(&event, ServerEvent::WorkerExited { .. }) && event.name() == name {
            return Ok(event);
        }
    }
}
