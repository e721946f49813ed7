//! Keyed cache of fetched lists.
//!
//! Reads go through [`QueryCache::fetch`]; mutations call
//! [`QueryCache::invalidate`] for the keys they touch. Watchers learn about
//! invalidations from [`QueryCache::subscribe`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;

const INVALIDATION_CAPACITY: usize = 64;

/// Identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Personnel list.
    Members,
    /// Team list.
    Teams,
    /// Software catalog.
    Software,
    /// Systems catalog.
    Systems,
    /// Console users.
    Users,
    /// Guide files.
    Guides,
    /// Container records.
    Containers,
    /// Current identity.
    Me,
    /// Lifecycle state of one runtime container.
    ContainerState(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Members => f.write_str("members"),
            Self::Teams => f.write_str("teams"),
            Self::Software => f.write_str("software"),
            Self::Systems => f.write_str("systems"),
            Self::Users => f.write_str("users"),
            Self::Guides => f.write_str("guides"),
            Self::Containers => f.write_str("containers"),
            Self::Me => f.write_str("me"),
            Self::ContainerState(id) => write!(f, "container-state/{id}"),
        }
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Shared query cache.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    invalidations: broadcast::Sender<QueryKey>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            invalidations,
        }
    }

    /// Cached value for `key`, if present and of type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entry = self.entries.read().get(key).cloned()?;
        entry.downcast::<T>().ok()
    }

    /// Store `value` under `key`.
    pub fn put<T: Any + Send + Sync>(&self, key: QueryKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries
            .write()
            .insert(key, Arc::clone(&value) as Entry);
        value
    }

    /// Drop `key` and tell subscribers.
    pub fn invalidate(&self, key: &QueryKey) {
        self.entries.write().remove(key);
        debug!(%key, "query invalidated");
        // No subscribers is fine.
        let _ = self.invalidations.send(key.clone());
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let keys: Vec<QueryKey> = self.entries.write().drain().map(|(k, _)| k).collect();
        for key in keys {
            let _ = self.invalidations.send(key);
        }
    }

    /// Receive every future invalidation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    /// Cached value for `key`, or the result of `load` stored under it.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` fails with; failures are not cached.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            return Ok(hit);
        }
        let value = load().await?;
        Ok(self.put(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fetch_caches_until_invalidated() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let first = cache
            .fetch(QueryKey::Teams, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["Ops".to_string()])
            })
            .await
            .expect("fetch");
        assert_eq!(first.len(), 1);

        let second = cache
            .fetch(QueryKey::Teams, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["Ops".to_string(), "Dev".to_string()])
            })
            .await
            .expect("fetch");
        assert_eq!(second.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(&QueryKey::Teams);
        assert!(cache.get::<Vec<String>>(&QueryKey::Teams).is_none());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = QueryCache::new();
        let result: Result<Arc<u32>> = cache
            .fetch(QueryKey::Me, || async { Err(ClientError::NotAuthenticated) })
            .await;
        assert!(result.is_err());
        assert!(cache.get::<u32>(&QueryKey::Me).is_none());
    }

    #[tokio::test]
    async fn subscribers_see_invalidations() {
        let cache = QueryCache::new();
        let mut rx = cache.subscribe();
        cache.put(QueryKey::Containers, 3u32);
        cache.invalidate(&QueryKey::Containers);
        assert_eq!(rx.recv().await.expect("recv"), QueryKey::Containers);
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = QueryCache::new();
        cache.put(QueryKey::Members, 1u8);
        assert!(cache.get::<String>(&QueryKey::Members).is_none());
        assert_eq!(cache.get::<u8>(&QueryKey::Members).as_deref(), Some(&1));
    }

    #[test]
    fn key_display() {
        assert_eq!(QueryKey::ContainerState("abc".into()).to_string(), "container-state/abc");
    }
}
