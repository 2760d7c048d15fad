//! Dispatcher trait and closure adapters.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Result type for dispatchers. An error ends the worker.
pub type DispatchResult = Result<(), String>;

/// Future type for async dispatchers.
pub type DispatchFuture = Pin<Box<dyn Future<Output = DispatchResult> + Send>>;

/// Trait for message dispatchers.
///
/// A worker awaits each dispatch before receiving its next message, so one
/// dispatcher instance never runs two payloads of the same worker at once.
pub trait Dispatcher<T>: Send + Sync + 'static {
    /// Process one payload.
    fn dispatch(&self, payload: T) -> DispatchFuture;
}

/// A dispatcher backed by a synchronous closure.
pub struct FnDispatcher<F, T> {
    handler: F,
    _payload: PhantomData<fn(T)>,
}

impl<F, T> FnDispatcher<F, T>
where
    F: Fn(T) -> DispatchResult + Send + Sync + 'static,
{
    /// Create a new closure-based dispatcher.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _payload: PhantomData,
        }
    }
}

impl<F, T> Dispatcher<T> for FnDispatcher<F, T>
where
    F: Fn(T) -> DispatchResult + Send + Sync + 'static,
    T: 'static,
{
    fn dispatch(&self, payload: T) -> DispatchFuture {
        let result = (self.handler)(payload);
        Box::pin(std::future::ready(result))
    }
}

/// A dispatcher backed by a closure returning a future.
pub struct AsyncFnDispatcher<F, T> {
    handler: F,
    _payload: PhantomData<fn(T)>,
}

impl<F, T> AsyncFnDispatcher<F, T>
where
    F: Fn(T) -> DispatchFuture + Send + Sync + 'static,
{
    /// Create a new async closure-based dispatcher.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _payload: PhantomData,
        }
    }
}

impl<F, T> Dispatcher<T> for AsyncFnDispatcher<F, T>
where
    F: Fn(T) -> DispatchFuture + Send + Sync + 'static,
    T: 'static,
{
    fn dispatch(&self, payload: T) -> DispatchFuture {
        (self.handler)(payload)
    }
}
