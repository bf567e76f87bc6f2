//! Panorama jobs: from a manifest entry to composite bytes on disk.
//!
//! ```text
//!   Manifest ──► PanoramaJob ──► run_job ──────────────► ByteComposite
//!                                  │ fetch tiles            │
//!                                  ▼                        ▼
//!                            ImageSupplier          BatchRunner writes
//!                                                   <output_dir>/<name>.png
//! ```
//!
//! # Components
//!
//! - [`Manifest`], [`PanoramaJob`], [`group_records`]: what to build
//! - [`run_job`]: fetch and stitch one panorama
//! - [`BatchRunner`]: many panoramas concurrently, failures isolated

mod batch;
mod manifest;

pub use batch::{
    write_png, BatchOptions, BatchReport, BatchRunner, FailedJob, DEFAULT_CONCURRENT_JOBS,
};
pub use manifest::{group_records, JobTile, Manifest, PanoramaJob, PanoramaSpec, TileRecord};

use std::sync::Arc;

use tracing::{debug, info};

use crate::diagnostics::{SharedSink, TracingSink};
use crate::error::JobError;
use crate::matcher::{stitch_tiles, ByteComposite, MatchConfig};
use crate::supply::ImageSupplier;

/// Fetch every tile of `job` and stitch them.
///
/// Fetches run in manifest order; the stitch itself runs on the blocking
/// pool. Diagnostics are logged tagged with the job name.
pub async fn run_job(
    job: &PanoramaJob,
    supplier: &dyn ImageSupplier,
    config: &MatchConfig,
) -> Result<ByteComposite, JobError> {
    let sink: SharedSink = Arc::new(TracingSink::for_job(job.name.clone()));
    run_job_with_sink(job, supplier, config, sink).await
}

/// [`run_job`] with an explicit diagnostics sink.
pub async fn run_job_with_sink(
    job: &PanoramaJob,
    supplier: &dyn ImageSupplier,
    config: &MatchConfig,
    sink: SharedSink,
) -> Result<ByteComposite, JobError> {
    info!(job = %job.name, tiles = job.tiles.len(), rect = ?job.bounding_rect(), "building panorama");

    let mut tiles = Vec::with_capacity(job.tiles.len());
    for tile in &job.tiles {
        let raster = supplier.fetch(&tile.id).await?;
        debug!(job = %job.name, id = %tile.id, shape = ?raster.dim(), "fetched tile");
        tiles.push((tile.origin, raster));
    }

    let name = job.name.clone();
    let config = config.clone();
    tokio::task::spawn_blocking(move || stitch_tiles(&name, tiles, &config, sink))
        .await
        .map_err(|e| JobError::Join(e.to_string()))?
        .map_err(JobError::from)
}
