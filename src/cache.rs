use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::error::Error;

struct Entry<T> {
    data: T,
    expires_at: Instant,
}

/// Values that stay valid for a fixed time, e.g. wallet lookups for one
/// ledger interval.
pub struct TimedCache<K, T> {
    entries: RwLock<HashMap<K, Entry<T>>>,
    ttl: Duration,
}

impl<K, T> TimedCache<K, T>
where
    K: Eq + Hash + Clone + Send + Sync,
    T: Clone + Send + Sync,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &K) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    pub async fn set(&self, key: K, value: T) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            Entry {
                data: value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Cached value, or the result of `fetch` which is stored on success.
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key.clone(), value.clone()).await;

        Ok(value)
    }

    /// Drops `key` after a transaction changed what it describes.
    pub async fn invalidate(&self, key: &K) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

impl<K, T> std::fmt::Debug for TimedCache<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache").field("ttl", &self.ttl).finish()
    }
}
