//! Per-pass lookup cache using moka
//!
//! One [`ViewCache`] lives for exactly one render pass and is dropped with it.
//! Nothing is carried over, so a pass can never observe a record cached by an
//! earlier pass. Concurrent lookups of the same key are coalesced into a
//! single store read.

use clinic_store::{Key, Record, StoreError, StoreHandle};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key: store name plus record key
type CacheKey = (String, Key);

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls to [`ViewCache::resolve`]
    pub lookups: u64,
    /// Reads that reached a store
    pub store_reads: u64,
    /// Entries held (approximate until pending tasks run)
    pub entry_count: u64,
}

impl CacheStats {
    /// Lookups answered without a store read
    #[inline]
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.lookups.saturating_sub(self.store_reads)
    }
}

/// Memoized `(store, key) → record` lookups for one render pass
///
/// Absence is cached like a found record. Failed reads are not cached, so a
/// later lookup of the same key within the pass retries the store.
#[derive(Debug)]
pub struct ViewCache {
    inner: Cache<CacheKey, Option<Record>>,
    lookups: AtomicU64,
    store_reads: AtomicU64,
}

impl ViewCache {
    /// Create empty cache
    ///
    /// Unbounded: an eviction mid-pass would cost a second read of the key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
            lookups: AtomicU64::new(0),
            store_reads: AtomicU64::new(0),
        }
    }

    /// Resolve a key in a store, reading it at most once per pass
    pub async fn resolve(
        &self,
        store: &dyn StoreHandle,
        key: &Key,
    ) -> Result<Option<Record>, Arc<StoreError>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let cache_key = (store.name().to_string(), key.clone());

        self.inner
            .try_get_with(cache_key, async {
                self.store_reads.fetch_add(1, Ordering::Relaxed);
                store.get(key).await
            })
            .await
    }

    /// Get pass statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            store_reads: self.store_reads.load(Ordering::Relaxed),
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_store::{MemoryStore, Schema};
    use clinic_test_utils::CountingStore;

    fn doctors() -> Arc<CountingStore> {
        let inner = MemoryStore::shared(Schema::new("doctors").auto_increment());
        CountingStore::wrap(inner)
    }

    #[tokio::test]
    async fn repeated_lookups_read_once() {
        let store = doctors();
        store
            .put(Record::new().with("id", 1).with("first_name", "Ada"))
            .await
            .unwrap();
        let cache = ViewCache::new();

        for _ in 0..5 {
            let found = cache.resolve(store.as_ref(), &Key::Int(1)).await.unwrap();
            assert_eq!(found.unwrap().text("first_name"), Some("Ada"));
        }

        assert_eq!(store.reads_of(&Key::Int(1)), 1);
        assert_eq!(cache.stats().lookups, 5);
        assert_eq!(cache.stats().hits(), 4);
    }

    #[tokio::test]
    async fn absence_is_cached() {
        let store = doctors();
        let cache = ViewCache::new();

        assert!(cache.resolve(store.as_ref(), &Key::Int(99)).await.unwrap().is_none());
        assert!(cache.resolve(store.as_ref(), &Key::Int(99)).await.unwrap().is_none());
        assert_eq!(store.reads_of(&Key::Int(99)), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_coalesce() {
        let store = doctors();
        store.put(Record::new().with("id", 7)).await.unwrap();
        let cache = ViewCache::new();

        let lookups = (0..8).map(|_| cache.resolve(store.as_ref(), &Key::Int(7)));
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
        assert_eq!(store.reads_of(&Key::Int(7)), 1);
    }

    #[tokio::test]
    async fn fresh_cache_sees_new_data() {
        let store = doctors();
        store.put(Record::new().with("id", 1).with("first_name", "Old")).await.unwrap();

        let first_pass = ViewCache::new();
        first_pass.resolve(store.as_ref(), &Key::Int(1)).await.unwrap();

        store.put(Record::new().with("id", 1).with("first_name", "New")).await.unwrap();

        let second_pass = ViewCache::new();
        let record = second_pass
            .resolve(store.as_ref(), &Key::Int(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.text("first_name"), Some("New"));
    }

    #[tokio::test]
    async fn many_distinct_keys_each_read_once() {
        let store = doctors();
        for id in 0..50 {
            store.put(Record::new().with("id", id)).await.unwrap();
        }
        let cache = ViewCache::new();

        for round in 0..4 {
            for id in 0..50 {
                let found = cache.resolve(store.as_ref(), &Key::Int(id)).await.unwrap();
                assert!(found.is_some(), "round {round} id {id}");
            }
        }

        assert_eq!(store.total_reads(), 50);
        assert_eq!(store.reads_of(&Key::Int(0)), 1);
        let stats = cache.stats();
        assert_eq!((stats.lookups, stats.store_reads), (200, 50));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = MemoryStore::shared(Schema::new("doctors"));
        let store = CountingStore::wrap(inner.clone());
        let cache = ViewCache::new();

        inner.close();
        let err = cache.resolve(store.as_ref(), &Key::Int(1)).await.unwrap_err();
        assert!(matches!(*err, StoreError::Unavailable { .. }));

        inner.reopen();
        assert!(cache.resolve(store.as_ref(), &Key::Int(1)).await.unwrap().is_none());
        assert_eq!(store.reads_of(&Key::Int(1)), 2);
    }
}
