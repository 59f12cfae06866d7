//! Write-once response caches.
//!
//! A [Cache] is owned by the component that fills it and lives as long as
//! that component.
//! Entries are never refreshed or invalidated; a failed fetch leaves the key
//! unset.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use tracing::trace;

/// Storage backing a [Cache].
pub trait CacheStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Insert `value` unless `key` is already present.
    ///
    /// Returns the value stored under `key` afterwards,
    /// which is the existing one if the key was already populated.
    fn insert_if_absent(&self, key: K, value: Arc<V>) -> Arc<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [CacheStore].
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> CacheStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn insert_if_absent(&self, key: K, value: Arc<V>) -> Arc<V> {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .entry(key)
            .or_insert(value)
            .clone()
    }

    fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }
}

/// A cache keyed by identifier.
pub struct Cache<K, V> {
    name: &'static str,
    store: Box<dyn CacheStore<K, V>>,
}

impl<K, V> Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("len", &self.store.len())
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + Debug + 'static,
    V: Send + Sync + 'static,
{
    /// A cache backed by a [MemoryStore].
    pub fn new(name: &'static str) -> Self {
        Self::with_store(name, MemoryStore::default())
    }

    pub fn with_store(name: &'static str, store: impl CacheStore<K, V> + 'static) -> Self {
        Self {
            name,
            store: Box::new(store),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.store.get(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Errors from `fetch` are returned as is and nothing is cached.
    pub async fn get_or_try_fetch<E, F, Fut>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.store.get(&key) {
            trace!(cache = self.name, ?key, "cache hit");
            return Ok(value);
        }

        trace!(cache = self.name, ?key, "cache miss");
        let value = fetch().await?;
        Ok(self.store.insert_if_absent(key, Arc::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Store that records how often it was written to.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore<String, u32>,
        inserts: Arc<AtomicUsize>,
    }

    impl CacheStore<String, u32> for CountingStore {
        fn get(&self, key: &String) -> Option<Arc<u32>> {
            self.inner.get(key)
        }

        fn insert_if_absent(&self, key: String, value: Arc<u32>) -> Arc<u32> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert_if_absent(key, value)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[tokio::test]
    async fn second_lookup_returns_same_value_without_fetching() {
        let cache = Cache::<String, u32>::new("test");
        let counter = AtomicUsize::new(0);
        let fetches = &counter;

        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(25)
        };

        let first = cache.get_or_try_fetch("25".to_string(), fetch).await.unwrap();
        let second = cache.get_or_try_fetch("25".to_string(), fetch).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_key_unset() {
        let cache = Cache::<String, u32>::new("test");

        let result = cache
            .get_or_try_fetch("0".to_string(), || async { Err::<u32, _>("not found") })
            .await;

        assert_eq!(result, Err("not found"));
        assert!(cache.get(&"0".to_string()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn first_insert_wins() {
        let store = MemoryStore::<String, u32>::default();
        let first = store.insert_if_absent("1".to_string(), Arc::new(1));
        let second = store.insert_if_absent("1".to_string(), Arc::new(2));

        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn injected_store_is_used() {
        let store = CountingStore::default();
        let inserts = store.inserts.clone();
        let cache = Cache::with_store("counting", store);

        cache
            .get_or_try_fetch("7".to_string(), || async { Ok::<_, ()>(7) })
            .await
            .unwrap();
        cache
            .get_or_try_fetch("7".to_string(), || async { Ok::<_, ()>(8) })
            .await
            .unwrap();

        assert_eq!(inserts.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&"7".to_string()).as_deref(), Some(&7));
    }
}
