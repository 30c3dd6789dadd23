//! Load-or-get cache for shared presentation resources (one texture per
//! entity kind and the like).

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use log::{debug, trace};

/// Keyed cache that loads each resource at most once and hands out shared
/// references. Dropping the cache (or calling [`ResourceCache::teardown`])
/// releases everything it holds.
pub struct ResourceCache<K, V> {
    name: &'static str,
    entries: HashMap<K, Arc<V>>,
    loads: usize,
}

impl<K: Eq + Hash + Debug, V> ResourceCache<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self { name, entries: HashMap::new(), loads: 0 }
    }

    /// Return the cached resource for `key`, running `load` only on the first
    /// request. A failed load caches nothing, so the next request retries.
    pub fn get_or_load<E>(
        &mut self,
        key: K,
        load: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self.entries.get(&key) {
            return Ok(Arc::clone(v));
        }
        let v = Arc::new(load(&key)?);
        self.loads += 1;
        trace!("{} cache: loaded {:?}", self.name, key);
        self.entries.insert(key, Arc::clone(&v));
        Ok(v)
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total loader invocations that succeeded.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Release every cached resource. Outstanding `Arc`s keep their own copy
    /// alive until they are dropped.
    pub fn teardown(&mut self) {
        if !self.entries.is_empty() {
            debug!("{} cache: releasing {} resource(s)", self.name, self.entries.len());
            self.entries.clear();
        }
    }
}

impl<K, V> Drop for ResourceCache<K, V> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            debug!("{} cache dropped holding {} resource(s)", self.name, self.entries.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_once_per_key() {
        let mut cache: ResourceCache<&str, String> = ResourceCache::new("test");
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_load("baby", |k| {
                    calls += 1;
                    Ok::<_, ()>(format!("assets/{k}.ans"))
                })
                .unwrap();
            assert_eq!(v.as_str(), "assets/baby.ans");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.loads(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let mut cache: ResourceCache<u8, u8> = ResourceCache::new("test");
        assert_eq!(cache.get_or_load(1, |_| Err("missing")), Err("missing"));
        assert!(cache.get(&1).is_none());
        assert_eq!(*cache.get_or_load(1, |_| Ok::<_, &str>(5)).unwrap(), 5);
    }

    #[test]
    fn test_teardown_releases_but_outstanding_refs_survive() {
        let mut cache: ResourceCache<u8, Vec<u8>> = ResourceCache::new("test");
        let held = cache.get_or_load(0, |_| Ok::<_, ()>(vec![1, 2, 3])).unwrap();
        cache.teardown();
        assert!(cache.is_empty());
        assert_eq!(held.len(), 3);
        assert_eq!(Arc::strong_count(&held), 1);
    }
}
