//! Registry for discovering workers by name.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use genserver_core::{WorkerId, WorkerInfo};

use crate::worker::WorkerHandle;

/// Name to worker directory.
///
/// This provides a way to reach workers by name without passing handles
/// through the entire call stack. The lock is held for the map access only,
/// never while a message is being sent.
pub struct Registry<T> {
    workers: Mutex<HashMap<String, WorkerHandle<T>>>,
}

impl<T> Registry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WorkerHandle<T>>> {
        // The map stays consistent even if a holder panicked.
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a worker under its name, returning the handle it displaced.
    ///
    /// The displaced worker is not signalled.
    pub fn store(&self, handle: WorkerHandle<T>) -> Option<WorkerHandle<T>> {
        self.lock().insert(handle.name().to_string(), handle)
    }

    /// Register a worker unless the name is taken.
    pub fn store_if_absent(&self, handle: WorkerHandle<T>) -> Result<(), WorkerHandle<T>> {
        let mut workers = self.lock();
        if let Some(existing) = workers.get(handle.name()) {
            return Err(existing.clone());
        }
        workers.insert(handle.name().to_string(), handle);
        Ok(())
    }

    /// Get a worker by name.
    pub fn get(&self, name: &str) -> Option<WorkerHandle<T>> {
        self.lock().get(name).cloned()
    }

    /// Copy out every registered handle. Order is unspecified.
    pub fn get_all(&self) -> Vec<WorkerHandle<T>> {
        self.lock().values().cloned().collect()
    }

    /// Unregister a worker by name.
    pub fn remove(&self, name: &str) -> Option<WorkerHandle<T>> {
        self.lock().remove(name)
    }

    /// Unregister every worker, returning their handles.
    pub fn drain(&self) -> Vec<WorkerHandle<T>> {
        self.lock().drain().map(|(_, handle)| handle).collect()
    }

    /// Unregister `name` only if it still refers to worker `id`.
    pub fn remove_if_current(&self, name: &str, id: WorkerId) -> bool {
        let mut workers = self.lock();
        match workers.get(name) {
            Some(handle) if handle.id() == id => {
                workers.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// List all registered names.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Describe every registered worker, sorted by name.
    pub fn snapshot(&self) -> Vec<WorkerInfo> {
        let mut infos: Vec<WorkerInfo> = self.lock().values().map(WorkerHandle::info).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::dispatcher::{Dispatcher, FnDispatcher};
    use std::sync::Arc;

    fn handle(name: &str) -> WorkerHandle<u32> {
        let dispatcher: Arc<dyn Dispatcher<u32>> = Arc::new(FnDispatcher::new(|_: u32| Ok(())));
        let (handle, _inbox) = WorkerHandle::channel(Arc::from(name), dispatcher, 1);
        handle
    }

    #[test]
    fn store_get_remove() {
        let registry = Registry::new();
        assert!(registry.get("A").is_none());

        let a = handle("A");
        assert!(registry.store(a.clone()).is_none());
        assert_eq!(registry.get("A").map(|h| h.id()), Some(a.id()));
        assert!(registry.contains("A"));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.remove("A").map(|h| h.id()), Some(a.id()));
        assert!(registry.remove("A").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn store_overwrites_and_returns_previous() {
        let registry = Registry::new();
        let first = handle("A");
        let second = handle("A");

        registry.store(first.clone());
        let displaced = registry.store(second.clone());

        assert_eq!(displaced.map(|h| h.id()), Some(first.id()));
        assert_eq!(registry.get("A").map(|h| h.id()), Some(second.id()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn store_if_absent_keeps_existing() {
        let registry = Registry::new();
        let first = handle("A");
        registry.store(first.clone());

        let rejected = registry.store_if_absent(handle("A"));
        assert_eq!(rejected.err().map(|h| h.id()), Some(first.id()));
        assert_eq!(registry.get("A").map(|h| h.id()), Some(first.id()));
        assert!(registry.store_if_absent(handle("B")).is_ok());
    }

    #[test]
    fn remove_if_current_ignores_stale_ids() {
        let registry = Registry::new();
        let stale = handle("A");
        let current = handle("A");
        registry.store(current.clone());

        assert!(!registry.remove_if_current("A", stale.id()));
        assert!(registry.contains("A"));
        assert!(registry.remove_if_current("A", current.id()));
        assert!(!registry.contains("A"));
    }

    #[test]
    fn get_all_and_snapshot_cover_every_entry() {
        let registry = Registry::new();
        for name in ["c", "a", "b"] {
            registry.store(handle(name));
        }

        assert_eq!(registry.get_all().len(), 3);
        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);

        let snapshot: Vec<String> = registry.snapshot().into_iter().map(|i| i.name).collect();
        assert_eq!(snapshot, vec!["a", "b", "c"]);
    }

    #[test]
    fn drain_empties_the_registry() {
        let registry = Registry::new();
        registry.store(handle("a"));
        registry.store(handle("b"));

        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
        assert!(registry.drain().is_empty());
    }
}
