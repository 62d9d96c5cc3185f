//! Duplicate-observation guard at the ingestion boundary. Marketplaces
//! re-surface the same listing across scans; the contract is one consumption
//! per pipeline run, so a normalized hash of recently seen listings is kept
//! in an LRU with a TTL.

use crate::core::types::RawListing;
use crate::filter::normalizers::normalize_for_dedup;
use ahash::AHasher;
use chrono::Utc;
use lru::LruCache;

use std::hash::{Hash, Hasher};
use std::num::{NonZero, NonZeroUsize};

#[derive(Debug, Clone)]
pub struct SeenCacheConfig {
    pub capacity: NonZeroUsize,
    pub ttl_hours: i64,
}

impl Default for SeenCacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZero::new(10_000).expect("SeenCache: lru cache can't be of size 0"),
            ttl_hours: 48,
        }
    }
}

pub struct SeenCache {
    cache: LruCache<u64, i64>,
    ttl_hours: i64,
}

impl SeenCache {
    pub fn new(config: SeenCacheConfig) -> Self {
        Self {
            cache: LruCache::new(config.capacity),
            ttl_hours: config.ttl_hours,
        }
    }

    fn hash_listing(listing: &RawListing) -> u64 {
        let mut hasher = AHasher::default();
        listing.source.hash(&mut hasher);
        normalize_for_dedup(&listing.title, &listing.description).hash(&mut hasher);
        hasher.finish()
    }

    // expired keys are never swept; a hit only counts while inside the ttl
    pub fn is_duplicate(&mut self, listing: &RawListing) -> bool {
        let hash = Self::hash_listing(listing);
        let now = Utc::now().timestamp(); // seconds

        if let Some(&ts) = self.cache.get(&hash) {
            if now - ts <= self.ttl_hours * 3600 {
                return true;
            }
        }

        self.cache.put(hash, now);
        false
    }
}
