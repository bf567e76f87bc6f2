//! LRU cache of decoded rasters in front of another supplier.
//!
//! Neighboring panoramas in a batch frequently share source frames, and
//! decoding dominates fetch time. Entries are bounded by count rather than
//! bytes since rasters in one batch are all roughly the same size.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SupplyError;
use crate::raster::Raster;

use super::ImageSupplier;

/// Default number of decoded rasters kept.
pub const DEFAULT_SUPPLY_CACHE_ENTRIES: usize = 64;

/// Hit/miss counters of a [`CachedSupplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Wraps a supplier with an LRU cache of decoded rasters.
///
/// # Example
///
/// ```ignore
/// use pano_stitch::supply::{CachedSupplier, FsImageSupplier, ImageSupplier};
///
/// let supplier = CachedSupplier::new(FsImageSupplier::new("tiles", "png"));
/// let first = supplier.fetch("frame_0001").await?;
/// let again = supplier.fetch("frame_0001").await?; // served from cache
/// ```
pub struct CachedSupplier<S> {
    inner: S,

    cache: RwLock<LruCache<String, Arc<Raster>>>,

    capacity: usize,

    hits: AtomicU64,

    misses: AtomicU64,
}

impl<S: ImageSupplier> CachedSupplier<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_SUPPLY_CACHE_ENTRIES)
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: RwLock::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fetch a decoded raster, sharing it with the cache.
    ///
    /// Misses are not deduplicated: concurrent misses for the same id each
    /// fetch and decode, and the last one to finish is the entry kept.
    pub async fn fetch_shared(&self, id: &str) -> Result<Arc<Raster>, SupplyError> {
        // Fast path: check cache. A hit promotes the entry, hence the write lock.
        {
            let mut cache = self.cache.write().await;
            if let Some(raster) = cache.get(id) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(raster.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let raster = Arc::new(self.inner.fetch(id).await?);

        let mut cache = self.cache.write().await;
        if let Some((evicted, _)) = cache.push(id.to_string(), raster.clone()) {
            if evicted != id {
                debug!(id = %evicted, "evicted raster from supply cache");
            }
        }
        Ok(raster)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: cache.len(),
            capacity: self.capacity,
        }
    }
}

#[async_trait]
impl<S: ImageSupplier> ImageSupplier for CachedSupplier<S> {
    async fn fetch_bytes(&self, id: &str) -> Result<Bytes, SupplyError> {
        self.inner.fetch_bytes(id).await
    }

    async fn fetch(&self, id: &str) -> Result<Raster, SupplyError> {
        let raster = self.fetch_shared(id).await?;
        Ok(raster.as_ref().clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
