//! Per-pixel-curve tile matcher.
//!
//! Marches across the grid row by row, fitting each tile's overlap onto the
//! already-adjusted overlap of its predecessor and applying that curve to the
//! whole tile. The first tile anchors the composite and is never changed.

use std::sync::Arc;

use ndarray::Zip;

use crate::diagnostics::{Diagnostic, SharedSink, TracingSink};
use crate::error::MatchError;
use crate::grid::{Edge, Origin, TileGrid, TileSet};
use crate::raster::Raster;

use super::composite::{composite_grid, Composite};
use super::options::{MatchConfig, NeighborPolicy};
use super::value_map::ValueMapper;

/// Reduces tile-to-tile brightness variation with per-channel value curves.
///
/// # Example
///
/// ```
/// use ndarray::Array3;
/// use pano_stitch::grid::Origin;
/// use pano_stitch::matcher::TileMatcher;
///
/// let mut matcher = TileMatcher::new("pano");
/// matcher.add(Array3::from_elem((4, 6, 3), 100.0), Origin::new(0, 0)).unwrap();
/// matcher.add(Array3::from_elem((4, 6, 3), 80.0), Origin::new(4, 0)).unwrap();
///
/// let composite = matcher.composite().unwrap();
/// assert_eq!(composite.raster.dim(), (4, 10, 3));
/// assert!(composite.raster.iter().all(|&v| v == 100.0));
/// ```
pub struct TileMatcher {
    name: String,
    tiles: TileSet,
    config: MatchConfig,
}

impl TileMatcher {
    /// Create a matcher that reports through `tracing`, tagged with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let sink: SharedSink = Arc::new(TracingSink::for_job(name.clone()));
        Self::with_sink(name, sink)
    }

    pub fn with_sink(name: impl Into<String>, sink: SharedSink) -> Self {
        Self {
            name: name.into(),
            tiles: TileSet::with_sink(sink),
            config: MatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Add a tile whose top-left corner sits at `origin`.
    ///
    /// # Errors
    ///
    /// `DuplicateOrigin` if a tile was already added there.
    pub fn add(&mut self, tile: Raster, origin: Origin) -> Result<(), MatchError> {
        self.tiles.add(tile, origin)?;
        Ok(())
    }

    /// Build the brightness-matched composite.
    pub fn composite(&self) -> Result<Composite, MatchError> {
        if self.tiles.is_empty() {
            return Err(MatchError::NoTiles);
        }
        let grid = self.tiles.to_grid()?;
        let adjusted = self.match_all_tiles(&grid)?;
        composite_grid(&adjusted)
    }

    /// Adjust every tile against its predecessors, in traversal order.
    ///
    /// The input grid is left untouched. Each tile's own overlap is read from
    /// `grid`; its predecessors' overlaps are read from the returned grid,
    /// where they have already been adjusted.
    pub fn match_all_tiles(&self, grid: &TileGrid) -> Result<TileGrid, MatchError> {
        let mut adjusted = grid.clone();
        for (col, row) in grid.positions() {
            self.match_tile_to_predecessors(grid, &mut adjusted, col, row)?;
        }
        Ok(adjusted)
    }

    fn match_tile_to_predecessors(
        &self,
        grid: &TileGrid,
        adjusted: &mut TileGrid,
        col: usize,
        row: usize,
    ) -> Result<(), MatchError> {
        if (col, row) == (0, 0) || grid.is_missing(col, row) {
            return Ok(());
        }

        let edges: &[Edge] = match self.config.neighbor_policy {
            NeighborPolicy::PreferLeft if col > 0 => &[Edge::Left],
            NeighborPolicy::PreferLeft => &[Edge::Top],
            NeighborPolicy::Average => &[Edge::Left, Edge::Top],
        };

        let mut candidates = Vec::with_capacity(edges.len());
        for &edge in edges {
            if let Some(candidate) = self.match_along(grid, adjusted, col, row, edge)? {
                candidates.push(candidate);
            }
        }

        let sink = grid.sink();
        match average(candidates) {
            Some((tile, count)) => {
                adjusted.replace(col, row, tile)?;
                sink.record(Diagnostic::TileAdjusted {
                    col,
                    row,
                    candidates: count,
                });
            }
            None => sink.record(Diagnostic::TileKept { col, row }),
        }
        Ok(())
    }

    /// Fit this tile's `edge` overlap onto the facing overlap of the adjusted
    /// neighbor, returning the adjusted tile.
    fn match_along(
        &self,
        grid: &TileGrid,
        adjusted: &TileGrid,
        col: usize,
        row: usize,
        edge: Edge,
    ) -> Result<Option<Raster>, MatchError> {
        let (ncol, nrow) = match edge {
            Edge::Left if col > 0 => (col - 1, row),
            Edge::Top if row > 0 => (col, row - 1),
            _ => return Ok(None),
        };

        let source = grid.edge(col, row, edge)?;
        let target = adjusted.edge(ncol, nrow, edge.opposite())?;
        let (Some(source), Some(target), Some(tile)) = (source, target, grid.tile(col, row)) else {
            return Ok(None);
        };

        let mapper = ValueMapper::fit(source, target, &self.config)?;
        Ok(Some(mapper.adjusted(tile)))
    }
}

/// Elementwise mean of equally shaped candidates.
fn average(mut candidates: Vec<Raster>) -> Option<(Raster, usize)> {
    let count = candidates.len();
    let mut sum = candidates.pop()?;
    for other in &candidates {
        Zip::from(&mut sum).and(other).for_each(|s, &o| *s += o);
    }
    if count > 1 {
        sum.mapv_inplace(|v| v / count as f64);
    }
    Some((sum, count))
}

// =============================================================================
// Tests
// =============================================================================
