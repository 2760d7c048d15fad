//! Topic subscriptions layered on top of named workers.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Topic to subscriber-name table.
///
/// Subscribers are worker names, so a subscription outlives the worker that
/// made it and reaches whoever is registered under that name at publish time.
#[derive(Debug, Default)]
pub struct TopicTable {
    topics: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl TopicTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<String>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `name` to `topic`, creating the topic if needed.
    ///
    /// Returns false when the subscription already existed.
    pub fn subscribe(&self, name: &str, topic: &str) -> bool {
        self.lock()
            .entry(topic.to_string())
            .or_default()
            .insert(name.to_string())
    }

    /// Remove a subscription. Empty topics are dropped.
    pub fn unsubscribe(&self, name: &str, topic: &str) -> bool {
        let mut topics = self.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return false;
        };
        let removed = subscribers.remove(name);
        if subscribers.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    /// Subscribers of `topic`, or `None` if nobody ever subscribed.
    pub fn subscribers(&self, topic: &str) -> Option<Vec<String>> {
        self.lock()
            .get(topic)
            .map(|subscribers| subscribers.iter().cloned().collect())
    }

    /// List all topics with at least one subscriber.
    pub fn topics(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
