/// In-memory caches for the pipeline's three memoization points: the bulk
/// dataset, per-station climate normals, and per-query forecast results.
///
/// The caches are explicit objects owned by the pipeline entry points, not
/// module-level globals, so tests can construct fresh isolated instances.
/// The default eviction policy is `NeverExpire`, matching the process-
/// lifetime behavior the UI relies on; `Ttl` exists so expiry can be
/// exercised and tuned without touching call sites.
///
/// # Clock injection
/// Expiry checks accept a `now: Instant` through the `*_at` variants so
/// TTL behavior is deterministic in tests. The plain variants wrap
/// `Instant::now()`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Eviction policy
// ---------------------------------------------------------------------------

/// When a cached entry stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Entries live for the process lifetime.
    NeverExpire,
    /// Entries older than the duration are dropped on access.
    Ttl(Duration),
}

impl EvictionPolicy {
    fn is_fresh(&self, stored_at: Instant, now: Instant) -> bool {
        match self {
            EvictionPolicy::NeverExpire => true,
            EvictionPolicy::Ttl(ttl) => now.saturating_duration_since(stored_at) <= *ttl,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// A keyed memoization cache with single-flight loading.
///
/// `get_or_try_insert_with` holds the cache lock for the duration of the
/// loader call, so concurrent callers for an uncached key block on the
/// lock and then read the freshly stored value instead of issuing a
/// duplicate fetch. A loader failure stores nothing — the next caller
/// retries.
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    policy: EvictionPolicy,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Cached value for `key`, if present and fresh.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Expiry-checked lookup against an injected clock. Expired entries
    /// are removed on access.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if self.policy.is_fresh(entry.stored_at, now) => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any existing entry.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    /// Returns the cached value for `key`, or runs `loader` to produce
    /// one. The lock is held across `loader`, which is what collapses
    /// concurrent uncached callers onto a single fetch. Errors are
    /// returned to the caller and never cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        self.get_or_try_insert_with_at(key, Instant::now(), loader)
    }

    pub fn get_or_try_insert_with_at<E>(
        &self,
        key: K,
        now: Instant,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(&key) {
            if self.policy.is_fresh(entry.stored_at, now) {
                return Ok(entry.value.clone());
            }
            entries.remove(&key);
        }
        let value = loader()?;
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                stored_at: now,
            },
        );
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Tests use this to simulate a process restart.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new(EvictionPolicy::NeverExpire)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_never_expire_serves_entry_forever() {
        let cache: Cache<&str, i32> = Cache::new(EvictionPolicy::NeverExpire);
        let t0 = Instant::now();
        cache.insert_at("k", 7, t0);
        // A year later the entry is still served.
        let much_later = t0 + Duration::from_secs(365 * 24 * 3600);
        assert_eq!(cache.get_at(&"k", much_later), Some(7));
    }

    #[test]
    fn test_ttl_expires_entry_deterministically() {
        let cache: Cache<&str, i32> = Cache::new(EvictionPolicy::Ttl(Duration::from_secs(60)));
        let t0 = Instant::now();
        cache.insert_at("k", 7, t0);

        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(60)), Some(7));
        assert_eq!(
            cache.get_at(&"k", t0 + Duration::from_secs(61)),
            None,
            "entry one second past the TTL should be dropped"
        );
        assert!(cache.is_empty(), "expired entry is removed on access");
    }

    #[test]
    fn test_ttl_expiry_applies_to_loader_path_too() {
        let cache: Cache<&str, i32> = Cache::new(EvictionPolicy::Ttl(Duration::from_secs(60)));
        let t0 = Instant::now();
        cache.insert_at("k", 1, t0);

        let reloaded = cache
            .get_or_try_insert_with_at("k", t0 + Duration::from_secs(120), || Ok::<_, ()>(2))
            .unwrap();
        assert_eq!(reloaded, 2, "stale entry should be reloaded, not served");
    }

    #[test]
    fn test_loader_failure_is_not_cached() {
        let cache: Cache<&str, i32> = Cache::default();
        let attempts = AtomicUsize::new(0);

        let first: Result<i32, &str> = cache.get_or_try_insert_with("k", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err("network down")
        });
        assert!(first.is_err());

        let second = cache.get_or_try_insert_with("k", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(42)
        });
        assert_eq!(second, Ok(42));
        assert_eq!(
            attempts.load(Ordering::SeqCst),
            2,
            "a failed load must leave the slot empty so the next caller retries"
        );
    }

    #[test]
    fn test_concurrent_callers_share_a_single_load() {
        // Ten threads race on the same uncached key; exactly one loader
        // call must reach the (simulated) network.
        let cache: Arc<Cache<&'static str, i32>> = Arc::new(Cache::default());
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loads = Arc::clone(&loads);
                std::thread::spawn(move || {
                    cache
                        .get_or_try_insert_with("dataset", || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok::<_, ()>(99)
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 99);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1, "loads must coalesce");
    }

    #[test]
    fn test_clear_simulates_process_restart() {
        let cache: Cache<&str, i32> = Cache::default();
        cache.insert("k", 1);
        cache.clear();
        assert_eq!(cache.get(&"k"), None);
    }
}
