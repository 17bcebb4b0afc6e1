//! Read-through cache with single-flight population per key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Memoizes fallible lookups. Concurrent first calls for one key share a single
/// population; a failed population leaves the key empty so the next call retries.
pub struct ReadThroughCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for ReadThroughCache<K, V> {
    fn default() -> Self {
        ReadThroughCache {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.entry(key.clone()).or_default().clone()
    }

    pub async fn get_or_populate<E, F, Fut>(&self, key: &K, populate: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let value = slot.get_or_try_init(populate).await?.clone();
        Ok(value)
    }

    /// Drop every memoized entry. In-flight populations finish into detached slots.
    pub fn invalidate(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
