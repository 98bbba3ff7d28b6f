//! Expiring in-memory cache for resolved terminology sets
//!
//! Entries are keyed by set reference and expire after a fixed TTL.
//! Expiry is passive: an expired entry is dropped when next requested,
//! forcing a re-fetch. Only successful resolutions are stored, so a
//! failure never shadows a later retry; an empty expansion is a
//! successful resolution and is cached like any other.

use hemorisk_types::CodeSet;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Time source, injectable so expiry is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock advanced explicitly, for tests.
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Clock starting at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

struct CacheEntry {
    codes: Arc<CodeSet>,
    fetched_at: Instant,
}

/// TTL cache over resolved code sets.
pub struct TerminologyCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TerminologyCache {
    /// Cache with the default TTL and the system clock
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Cache with a custom TTL and the system clock
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache with a custom TTL and time source
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    /// Fresh entry for a set reference, or `None` on absence or expiry.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&self, set_ref: &str) -> Option<Arc<CodeSet>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(set_ref) {
            Some(entry) if now.duration_since(entry.fetched_at) < self.ttl => {
                Some(Arc::clone(&entry.codes))
            }
            Some(_) => {
                entries.remove(set_ref);
                None
            }
            None => None,
        }
    }

    /// Store a resolved set, replacing any previous entry.
    pub fn insert(&self, set_ref: &str, codes: CodeSet) -> Arc<CodeSet> {
        let codes = Arc::new(codes);
        let entry = CacheEntry {
            codes: Arc::clone(&codes),
            fetched_at: self.clock.now(),
        };
        self.entries.lock().insert(set_ref.to_string(), entry);
        codes
    }

    /// Number of live or expired entries currently held
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for TerminologyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(code: &str) -> CodeSet {
        let mut set = CodeSet::new();
        set.insert("http://snomed.info/sct", code);
        set
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = TerminologyCache::with_clock(Duration::from_secs(3600), clock.clone());

        cache.insert("vs-bleeding", set_of("131148009"));
        clock.advance(Duration::from_secs(3599));
        let hit = cache.get("vs-bleeding").expect("entry should still be live");
        assert!(hit.contains("http://snomed.info/sct", "131148009"));
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let clock = Arc::new(ManualClock::new());
        let cache = TerminologyCache::with_clock(Duration::from_secs(3600), clock.clone());

        cache.insert("vs-bleeding", set_of("131148009"));
        clock.advance(Duration::from_secs(3600));
        assert!(cache.get("vs-bleeding").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_set_is_a_cacheable_resolution() {
        let cache = TerminologyCache::new();
        cache.insert("vs-empty", CodeSet::new());
        let hit = cache.get("vs-empty").expect("empty set should be cached");
        assert!(hit.is_empty());
    }

    #[test]
    fn test_insert_replaces_previous_entry() {
        let clock = Arc::new(ManualClock::new());
        let cache = TerminologyCache::with_clock(Duration::from_secs(3600), clock.clone());

        cache.insert("vs", set_of("111"));
        clock.advance(Duration::from_secs(1800));
        cache.insert("vs", set_of("222"));
        clock.advance(Duration::from_secs(1801));

        // The refreshed entry counts from its own insert time.
        let hit = cache.get("vs").expect("refreshed entry should be live");
        assert!(hit.contains("http://snomed.info/sct", "222"));
        assert!(!hit.contains("http://snomed.info/sct", "111"));
    }

    #[test]
    fn test_miss_on_unknown_ref() {
        let cache = TerminologyCache::new();
        assert!(cache.get("vs-unknown").is_none());
    }
}
