//! # pano-stitch
//!
//! Brightness-matched compositing of overlapping image tiles.
//!
//! Frames of a panorama are captured independently, so neighboring frames
//! rarely agree on brightness. Given each frame's top-left origin in a shared
//! pixel space, this library lays the frames out on a sparse grid, fits each
//! frame's overlap onto its already-adjusted neighbor, and flattens the result
//! into one composite.
//!
//! ## Features
//!
//! - **Sparse grids**: irregular tile sizes and missing cells are tolerated everywhere
//! - **Two strategies**: per-channel value curves, or a single gain per tile
//! - **Deterministic**: row-major traversal gives reproducible output
//! - **Batch jobs**: many panoramas from a JSON manifest, built concurrently
//!
//! ## Architecture
//!
//! - [`grid`] - Tile placement, overlap extraction and replacement
//! - [`matcher`] - Value curves, matchers and compositing
//! - [`raster`] - Raster type and image conversions
//! - [`supply`] - Image suppliers and the decoded-raster cache
//! - [`job`] - Manifests, single jobs and the batch runner
//! - [`diagnostics`] - Structured events emitted by the core
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use ndarray::Array3;
//! use pano_stitch::{Origin, TileMatcher};
//!
//! let mut matcher = TileMatcher::new("example");
//! matcher.add(Array3::from_elem((64, 96, 3), 120.0), Origin::new(0, 0)).unwrap();
//! matcher.add(Array3::from_elem((64, 96, 3), 90.0), Origin::new(80, 0)).unwrap();
//!
//! let composite = matcher.composite().unwrap();
//! assert_eq!(composite.raster.dim(), (64, 176, 3));
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod job;
pub mod matcher;
pub mod raster;
pub mod supply;

// Re-export commonly used types
pub use config::{Cli, Command, InspectConfig, MergeConfig, StitchConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, NullSink, SharedSink, TracingSink};
pub use error::{GridError, JobError, MatchError, RasterError, SupplyError};
pub use grid::{Edge, Origin, Rect, TileGrid, TileSet};
pub use job::{
    group_records, run_job, BatchOptions, BatchReport, BatchRunner, Manifest, PanoramaJob,
    TileRecord,
};
pub use matcher::{
    stitch_tiles, BrightnessMatcher, ByteComposite, Composite, Extrapolation, MatchConfig,
    NeighborPolicy, Strategy, TileMatcher, ValueMapper,
};
pub use raster::{ChannelRange, Raster, LAB_RANGES};
pub use supply::{CachedSupplier, FsImageSupplier, ImageSupplier};
