use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use log::debug;

pub const DEFINITIONS_TTL: Duration = Duration::from_secs(60 * 60);
pub const RUNS_TTL: Duration = Duration::from_secs(10 * 60);

/// Result of looking up a key in a [`TtlCache`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<V> {
    Fresh(V),
    /// An entry existed but outlived its TTL; it has been evicted
    Expired,
    Absent,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-process memoization of fetch results.
///
/// Entries are keyed by a hash of the call arguments and stay fresh for a
/// fixed time-to-live. Callers must accept values up to `ttl` old.
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    entries: HashMap<u64, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn lookup<K: Hash>(&mut self, key: &K) -> CacheLookup<V> {
        self.lookup_at(key, Instant::now())
    }

    pub fn insert<K: Hash>(&mut self, key: &K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    fn lookup_at<K: Hash>(&mut self, key: &K, now: Instant) -> CacheLookup<V> {
        let hash = key_hash(key);

        let Some(entry) = self.entries.get(&hash) else {
            return CacheLookup::Absent;
        };

        if now.saturating_duration_since(entry.inserted_at) < self.ttl {
            debug!("Cache hit ({})", self.name);
            return CacheLookup::Fresh(entry.value.clone());
        }

        debug!("Cache entry expired ({})", self.name);
        self.entries.remove(&hash);
        CacheLookup::Expired
    }

    fn insert_at<K: Hash>(&mut self, key: &K, value: V, now: Instant) {
        self.entries.insert(
            key_hash(key),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }
}

fn key_hash<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
