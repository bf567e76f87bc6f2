use thiserror::Error;

use crate::grid::{Edge, Origin};

/// Errors raised while building or mutating a tile grid
#[derive(Debug, Clone, Error)]
pub enum GridError {
    /// A second tile was supplied for an origin that is already occupied
    #[error("Duplicate tile origin ({}, {})", .0.x, .0.y)]
    DuplicateOrigin(Origin),

    /// Edge request that cannot be answered: unknown direction token or a
    /// cell outside the grid
    #[error("Invalid edge {edge} at cell ({col}, {row})")]
    InvalidEdge { col: usize, row: usize, edge: String },

    /// Replacement data has no usable shape, or targets a missing cell
    #[error("Invalid tile replacement at cell ({col}, {row}): {reason}")]
    InvalidTileReplacement {
        col: usize,
        row: usize,
        reason: String,
    },

    /// A grid needs at least one tile to derive its axes
    #[error("Cannot build a grid without tiles")]
    EmptyGrid,
}

impl GridError {
    pub(crate) fn invalid_edge(col: usize, row: usize, edge: Edge) -> Self {
        GridError::InvalidEdge {
            col,
            row,
            edge: edge.to_string(),
        }
    }
}

/// Errors raised by the tile matchers
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// Grid construction or mutation failed
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Source and target samples must cover the same pixels
    #[error("Sample shape mismatch: source {source_shape:?}, target {target_shape:?}")]
    ShapeMismatch {
        source_shape: (usize, usize, usize),
        target_shape: (usize, usize, usize),
    },

    /// Tiles in one composite must share a channel count
    #[error("Channel mismatch: expected {expected} channels, tile at ({x}, {y}) has {actual}")]
    ChannelMismatch {
        expected: usize,
        actual: usize,
        x: u32,
        y: u32,
    },

    /// Nothing to composite
    #[error("No tiles to composite")]
    NoTiles,
}

/// Errors converting between rasters and encoded images
#[derive(Debug, Clone, Error)]
pub enum RasterError {
    /// Encoded image data could not be decoded
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Raster could not be encoded or written
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Raster layout is not representable as an image
    #[error("Unsupported raster layout: {channels} channels")]
    UnsupportedChannels { channels: usize },

    /// Bands passed to a merge must share one size
    #[error("Band sizes differ: {sizes:?}")]
    BandSizeMismatch { sizes: Vec<(usize, usize)> },

    /// A merge needs at least one band
    #[error("At least one band must be provided")]
    NoBands,
}

/// Errors from an image supplier
#[derive(Debug, Clone, Error)]
pub enum SupplyError {
    /// No image exists for the identifier
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Reading the image failed
    #[error("I/O error reading {id}: {message}")]
    Io { id: String, message: String },

    /// Image data was unreadable
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
}

/// Errors from a single panorama job
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("Supply error: {0}")]
    Supply(#[from] SupplyError),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// Manifest could not be read or parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// The composite could not be written
    #[error("Failed to write {path}: {message}")]
    Output { path: String, message: String },

    /// Worker task panicked or was aborted
    #[error("Job task failed: {0}")]
    Join(String),
}

impl From<GridError> for JobError {
    fn from(err: GridError) -> Self {
        JobError::Match(MatchError::Grid(err))
    }
}
