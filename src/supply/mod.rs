//! Image supply for panorama jobs.
//!
//! The compositing core only ever sees rasters. Where they come from is
//! abstracted behind [`ImageSupplier`], so jobs can run against local files,
//! a cache in front of them, or an in-memory mock in tests.
//!
//! ```text
//!   run_job ──► CachedSupplier ──► FsImageSupplier ──► <dir>/<id>.<ext>
//!                 (LRU of decoded rasters)
//! ```

mod cache;
mod fs;

pub use cache::{CacheStats, CachedSupplier, DEFAULT_SUPPLY_CACHE_ENTRIES};
pub use fs::FsImageSupplier;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SupplyError;
use crate::raster::{decode_raster, Raster};

/// Source of tile images keyed by identifier.
///
/// Implementations only need to return encoded bytes; decoding is provided.
#[async_trait]
pub trait ImageSupplier: Send + Sync {
    /// Fetch the encoded image for `id`.
    async fn fetch_bytes(&self, id: &str) -> Result<Bytes, SupplyError>;

    /// Fetch and decode the image for `id`.
    async fn fetch(&self, id: &str) -> Result<Raster, SupplyError> {
        let data = self.fetch_bytes(id).await?;
        Ok(decode_raster(&data)?)
    }
}
