//! Participant profile cache.
//!
//! Display metadata (names, profile pictures) is the only thing cached in
//! this crate. The cache is an explicit value handed to whoever needs it,
//! with a configurable time-to-live and capacity.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::{debug, warn};

use crate::models::{Participant, ParticipantId};
use crate::storage::{read_participants, StorageConfig};

/// An LRU cache whose entries also expire after a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache<K: Hash + Eq, V> {
    ttl: Duration,
    entries: LruCache<K, CacheEntry<V>>,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: LruCache::new(capacity),
        }
    }

    /// Get a cloned value if present and not expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let inserted_at = self.entries.peek(key)?.inserted_at;
        if now.saturating_duration_since(inserted_at) >= self.ttl {
            self.entries.pop(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.put(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.pop(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup of participant display profiles.
pub trait ParticipantDirectory: Send + Sync {
    fn profile(&self, id: &ParticipantId) -> Option<Participant>;

    /// Display name, falling back to a placeholder for unknown ids.
    fn display_name(&self, id: &ParticipantId) -> String {
        self.profile(id)
            .map(|p| p.name)
            .unwrap_or_else(|| format!("Athlete {}", id))
    }
}

/// A fixed in-memory directory.
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    profiles: HashMap<ParticipantId, Participant>,
}

impl StaticDirectory {
    pub fn new(participants: impl IntoIterator<Item = Participant>) -> Self {
        Self {
            profiles: participants.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

impl ParticipantDirectory for StaticDirectory {
    fn profile(&self, id: &ParticipantId) -> Option<Participant> {
        self.profiles.get(id).cloned()
    }
}

/// Participant store lookups memoized in a [`TtlCache`].
pub struct CachedDirectory {
    storage: StorageConfig,
    cache: Mutex<TtlCache<ParticipantId, Participant>>,
}

impl CachedDirectory {
    pub fn new(storage: StorageConfig, ttl: Duration, capacity: usize) -> Self {
        Self {
            storage,
            cache: Mutex::new(TtlCache::new(ttl, capacity)),
        }
    }

    /// Drop a cached profile, e.g. after the participant's data was deleted.
    pub fn invalidate(&self, id: &ParticipantId) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .invalidate(id);
    }
}

impl ParticipantDirectory for CachedDirectory {
    fn profile(&self, id: &ParticipantId) -> Option<Participant> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(hit) = cache.get(id) {
            return Some(hit);
        }

        debug!("Profile cache miss for {}", id);
        let participants = match read_participants(&self.storage) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to load participant profiles: {}", e);
                return None;
            }
        };

        let mut found = None;
        for participant in participants {
            if &participant.id == id {
                found = Some(participant.clone());
            }
            cache.insert(participant.id.clone(), participant);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::upsert_participant;
    use tempfile::TempDir;

    #[test]
    fn test_entries_expire_after_ttl() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60), 10);
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(59)), Some(1));
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60), 2);
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        cache.insert_at("b".to_string(), 2, t0);
        cache.get_at(&"a".to_string(), t0);
        cache.insert_at("c".to_string(), 3, t0);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&"a".to_string(), t0), Some(1));
        assert_eq!(cache.get_at(&"b".to_string(), t0), None);
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(10), 2);
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        cache.insert_at("a".to_string(), 2, t0 + Duration::from_secs(8));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(15)), Some(2));
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(18)), None);
    }

    #[test]
    fn test_zero_capacity_holds_one_entry() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(10), 0);
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        cache.insert_at("b".to_string(), 2, t0);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"b".to_string(), t0), Some(2));
    }

    #[test]
    fn test_cached_directory_reads_through_and_invalidates() {
        let tmp = TempDir::new().unwrap();
        let storage = StorageConfig::new(tmp.path().to_path_buf());
        upsert_participant(&storage, Participant::new("p1".into(), "Ada".to_string()).unwrap())
            .unwrap();

        let directory = CachedDirectory::new(storage.clone(), Duration::from_secs(300), 16);
        assert_eq!(directory.display_name(&"p1".into()), "Ada");

        upsert_participant(&storage, Participant::new("p1".into(), "Ada L.".to_string()).unwrap())
            .unwrap();
        // still cached
        assert_eq!(directory.display_name(&"p1".into()), "Ada");

        directory.invalidate(&"p1".into());
        assert_eq!(directory.display_name(&"p1".into()), "Ada L.");
        assert_eq!(directory.display_name(&"nobody".into()), "Athlete nobody");
    }
}
