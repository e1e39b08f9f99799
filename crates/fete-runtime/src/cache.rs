//! Caching layer for fete-runtime.
//!
//! Recognition is the slow part of an inspection. Entities recognized from
//! an image are cached by image content, so re-uploading the same report
//! skips OCR and NER. Validation is always re-run against the current
//! profile store.

use fete_core::Entity;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::CacheConfig;
use crate::recognizers::ScanImage;

/// Cache key derived from image content. The file name is not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: [u8; 32],
}

impl CacheKey {
    pub fn for_image(image: &ScanImage) -> Self {
        Self {
            digest: Sha256::digest(&image.bytes).into(),
        }
    }
}

/// Recognized entities cache using moka.
///
/// Only entities from the configured recognizers are stored. Results
/// produced by a fallback are not cached.
pub struct RecognitionCache {
    cache: Cache<CacheKey, Vec<Entity>>,
}

impl RecognitionCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    /// Get cached entities.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<Entity>> {
        self.cache.get(key).await
    }

    /// Store recognized entities.
    pub async fn insert(&self, key: CacheKey, entities: Vec<Entity>) {
        self.cache.insert(key, entities).await;
    }

    /// Clear the cache.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for RecognitionCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
