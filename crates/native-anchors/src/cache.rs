//! Opt-in, process-wide cache of discovery results.
//!
//! Entries are keyed by platform, the ordered backend descriptors and the
//! validity policy, and expire after a caller-chosen TTL. Errors are never
//! cached. The lock is not held while a discovery pass runs, so two callers
//! missing at the same time may both read the stores.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::config::DiscoveryConfig;
use crate::engine::DiscoveryEngine;
use crate::error::Result;
use crate::filter::ValidityPolicy;
use crate::platform::Platform;
use crate::types::DiscoveryResult;

/// Identifies which stores, judged how, produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub platform: Platform,
    pub backends: Vec<String>,
    pub validity: ValidityPolicy,
}

impl CacheKey {
    pub fn for_engine(engine: &DiscoveryEngine) -> Self {
        Self {
            platform: engine.platform(),
            backends: engine.descriptors(),
            validity: engine.validity(),
        }
    }
}

/// A TTL cache of discovery results.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, (Instant, DiscoveryResult)>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh cached result for `engine`, or run it and cache the
    /// outcome on success.
    pub fn get_or_discover(&self, engine: &DiscoveryEngine, ttl: Duration) -> Result<DiscoveryResult> {
        let key = CacheKey::for_engine(engine);

        let cached = self
            .lock()
            .get(&key)
            .filter(|(stored, _)| stored.elapsed() < ttl)
            .map(|(_, result)| result.clone());
        if let Some(result) = cached {
            trace!(platform = %key.platform, "discovery cache hit");
            return Ok(result);
        }

        debug!(platform = %key.platform, backends = key.backends.len(), "discovery cache miss");
        let result = engine.discover()?;
        self.lock().insert(key, (Instant::now(), result.clone()));
        Ok(result)
    }

    /// Drop every cached result.
    pub fn invalidate_all(&self) {
        let mut entries = self.lock();
        debug!(entries = entries.len(), "invalidating discovery cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, (Instant, DiscoveryResult)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn global() -> &'static ResultCache {
    static CACHE: OnceLock<ResultCache> = OnceLock::new();
    CACHE.get_or_init(ResultCache::new)
}

/// Like [`crate::discover`], but served from the process-wide cache when a
/// result for the same stores is younger than `ttl`.
pub fn discover_cached(config: &DiscoveryConfig, ttl: Duration) -> Result<DiscoveryResult> {
    let engine = DiscoveryEngine::new(config)?;
    global().get_or_discover(&engine, ttl)
}

/// Clear the process-wide cache.
pub fn invalidate_all() {
    global().invalidate_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{Backend, RawStoreReader, StoreReadout};
    use crate::testutil;
    use crate::types::{RawCertificateEntry, StoreId, TrustHint};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        name: &'static str,
        der: Vec<u8>,
        reads: Arc<AtomicUsize>,
    }

    impl RawStoreReader for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn read_stores(&self) -> StoreReadout {
            self.reads.fetch_add(1, Ordering::SeqCst);
            StoreReadout {
                entries: vec![RawCertificateEntry::new(
                    self.der.clone(),
                    StoreId::new("Test", self.name),
                    TrustHint::Unspecified,
                    "0",
                )],
                failures: Vec::new(),
            }
        }
    }

    fn counting_engine(name: &'static str, config: &DiscoveryConfig) -> (DiscoveryEngine, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let reader = Counting {
            name,
            der: testutil::root(name).der,
            reads: Arc::clone(&reads),
        };
        let engine = DiscoveryEngine::with_backends(vec![Backend::custom(reader)], config).unwrap();
        (engine, reads)
    }

    #[test]
    fn second_call_within_ttl_is_served_from_cache() {
        let cache = ResultCache::new();
        let (engine, reads) = counting_engine("hit", &DiscoveryConfig::default());
        let first = cache.get_or_discover(&engine, Duration::from_secs(60)).unwrap();
        let second = cache.get_or_discover(&engine, Duration::from_secs(60)).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(first.fingerprints(), second.fingerprints());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_refreshed() {
        let cache = ResultCache::new();
        let (engine, reads) = counting_engine("ttl", &DiscoveryConfig::default());
        cache.get_or_discover(&engine, Duration::ZERO).unwrap();
        cache.get_or_discover(&engine, Duration::ZERO).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_all_forces_a_new_read() {
        let cache = ResultCache::new();
        let (engine, reads) = counting_engine("flush", &DiscoveryConfig::default());
        cache.get_or_discover(&engine, Duration::from_secs(60)).unwrap();
        cache.invalidate_all();
        assert!(cache.is_empty());
        cache.get_or_discover(&engine, Duration::from_secs(60)).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn validity_policy_is_part_of_the_key() {
        let cache = ResultCache::new();
        let (all, _) = counting_engine("policy", &DiscoveryConfig::default());
        let (current, _) = counting_engine(
            "policy",
            &DiscoveryConfig::default().with_validity(ValidityPolicy::CurrentOnly),
        );
        cache.get_or_discover(&all, Duration::from_secs(60)).unwrap();
        cache.get_or_discover(&current, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.len(), 2);
        assert_ne!(CacheKey::for_engine(&all), CacheKey::for_engine(&current));
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = ResultCache::new();
        let engine = DiscoveryEngine::with_backends(Vec::new(), &DiscoveryConfig::default()).unwrap();
        assert!(cache.get_or_discover(&engine, Duration::from_secs(60)).is_err());
        assert!(cache.is_empty());
    }
}
