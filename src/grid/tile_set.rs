//! Tiles collected by origin before they are laid out into a grid.

use std::collections::HashMap;

use crate::diagnostics::{default_sink, Diagnostic, SharedSink};
use crate::error::GridError;
use crate::raster::Raster;

use super::geometry::Origin;
use super::tile_grid::TileGrid;

/// Tiles keyed by their unique origin.
#[derive(Clone)]
pub struct TileSet {
    tiles: HashMap<Origin, Raster>,
    sink: SharedSink,
}

impl Default for TileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSet {
    pub fn new() -> Self {
        Self::with_sink(default_sink())
    }

    pub fn with_sink(sink: SharedSink) -> Self {
        Self {
            tiles: HashMap::new(),
            sink,
        }
    }

    /// Record a tile at `origin`.
    ///
    /// # Errors
    ///
    /// `DuplicateOrigin` if a tile is already recorded there.
    pub fn add(&mut self, tile: Raster, origin: Origin) -> Result<(), GridError> {
        if self.contains(origin) {
            return Err(GridError::DuplicateOrigin(origin));
        }
        self.sink.record(Diagnostic::TileAdded {
            origin,
            shape: tile.dim(),
        });
        self.tiles.insert(origin, tile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, origin: Origin) -> bool {
        self.tiles.contains_key(&origin)
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Lay the tiles out into a grid sharing this set's sink.
    pub fn to_grid(&self) -> Result<TileGrid, GridError> {
        TileGrid::from_tiles_with_sink(
            self.tiles.iter().map(|(o, t)| (*o, t.clone())),
            self.sink.clone(),
        )
    }

    /// Consume the set into a grid.
    pub fn into_grid(self) -> Result<TileGrid, GridError> {
        TileGrid::from_tiles_with_sink(self.tiles, self.sink)
    }
}
