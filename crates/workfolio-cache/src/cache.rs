use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// A cached value and the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub timestamp: Instant,
    pub value: V,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }
}

/// Keyed in-memory cache where every entry lives for a fixed TTL
///
/// Entries are never updated in place: a stale entry stays around until the
/// next [`TtlCache::insert`] for its key overwrites it. The lock only guards
/// individual map operations, so a caller doing "get, miss, compute, insert"
/// can race another caller doing the same; the later insert wins.
///
/// Time comes from `tokio::time::Instant`, so tests can drive expiry with a
/// paused runtime clock.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave a half-written entry,
    // so a poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Value for `key` if it was stored less than one TTL ago
    pub fn get_fresh(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl, now) => Some(entry.value.clone()),
            Some(_) => {
                trace!(?key, "cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing whatever was there
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            timestamp: Instant::now(),
            value,
        };
        self.lock().insert(key, entry);
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
