//! Dense grid of optional tiles laid out by origin.
//!
//! Rows are the sorted distinct y-origins, columns the sorted distinct
//! x-origins. A cell without a tile is simply `None`; every query tolerates
//! that, not just the boundary ones.

use std::collections::HashMap;
use std::fmt;

use ndarray::{s, ArrayView3};

use crate::diagnostics::{default_sink, Diagnostic, SharedSink};
use crate::error::GridError;
use crate::raster::Raster;

use super::edge::Edge;
use super::geometry::{Origin, Rect};

// =============================================================================
// Tile Grid
// =============================================================================

/// Sparse arrangement of tiles, indexed by `(col, row)`.
#[derive(Clone)]
pub struct TileGrid {
    /// Distinct x-origins, ascending (one per column)
    xvals: Vec<u32>,

    /// Distinct y-origins, ascending (one per row)
    yvals: Vec<u32>,

    /// Row-major cells
    cells: Vec<Option<Raster>>,

    sink: SharedSink,
}

impl fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileGrid")
            .field("xvals", &self.xvals)
            .field("yvals", &self.yvals)
            .field("present", &self.present_count())
            .finish()
    }
}

impl TileGrid {
    /// Lay out tiles by origin, reporting to the default tracing sink.
    pub fn from_tiles<I>(tiles: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (Origin, Raster)>,
    {
        Self::from_tiles_with_sink(tiles, default_sink())
    }

    /// Lay out tiles by origin.
    ///
    /// # Errors
    ///
    /// - `DuplicateOrigin` if two tiles share an origin
    /// - `EmptyGrid` if no tiles are given
    pub fn from_tiles_with_sink<I>(tiles: I, sink: SharedSink) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (Origin, Raster)>,
    {
        let mut by_origin: HashMap<Origin, Raster> = HashMap::new();
        for (origin, tile) in tiles {
            if by_origin.contains_key(&origin) {
                return Err(GridError::DuplicateOrigin(origin));
            }
            by_origin.insert(origin, tile);
        }
        if by_origin.is_empty() {
            return Err(GridError::EmptyGrid);
        }

        let mut xvals: Vec<u32> = by_origin.keys().map(|o| o.x).collect();
        xvals.sort_unstable();
        xvals.dedup();
        let mut yvals: Vec<u32> = by_origin.keys().map(|o| o.y).collect();
        yvals.sort_unstable();
        yvals.dedup();

        let mut cells = Vec::with_capacity(xvals.len() * yvals.len());
        for &y in &yvals {
            for &x in &xvals {
                cells.push(by_origin.remove(&Origin::new(x, y)));
            }
        }

        sink.record(Diagnostic::GridBuilt {
            rows: yvals.len(),
            cols: xvals.len(),
        });

        Ok(Self {
            xvals,
            yvals,
            cells,
            sink,
        })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.yvals.len(), self.xvals.len())
    }

    pub fn rows(&self) -> usize {
        self.yvals.len()
    }

    pub fn cols(&self) -> usize {
        self.xvals.len()
    }

    /// Number of cells holding a tile.
    pub fn present_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Every `(col, row)` in traversal order: row outermost, left to right.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        let (rows, cols) = self.shape();
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (col, row)))
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols() && row < self.rows()).then(|| row * self.cols() + col)
    }

    /// True if no tile was recorded for the cell. Cells outside the grid
    /// count as missing.
    pub fn is_missing(&self, col: usize, row: usize) -> bool {
        self.tile(col, row).is_none()
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<&Raster> {
        self.index(col, row).and_then(|i| self.cells[i].as_ref())
    }

    /// Composite-space origin of a cell, whether or not it holds a tile.
    pub fn origin(&self, col: usize, row: usize) -> Option<Origin> {
        self.index(col, row)
            .map(|_| Origin::new(self.xvals[col], self.yvals[row]))
    }

    /// Composite-space rectangle covered by a present tile.
    pub fn placement(&self, col: usize, row: usize) -> Option<Rect> {
        let (height, width, _) = self.tile(col, row)?.dim();
        let origin = self.origin(col, row)?;
        Some(Rect::new(origin.x, origin.y, width as u32, height as u32))
    }

    /// A tile together with its placement, or `None` if missing.
    pub fn tile_with_placement(&self, col: usize, row: usize) -> Option<(&Raster, Rect)> {
        Some((self.tile(col, row)?, self.placement(col, row)?))
    }

    fn neighbor(&self, col: usize, row: usize, edge: Edge) -> Option<(usize, usize)> {
        let (dc, dr) = edge.step();
        let ncol = col.checked_add_signed(dc)?;
        let nrow = row.checked_add_signed(dr)?;
        self.index(ncol, nrow).map(|_| (ncol, nrow))
    }

    // =========================================================================
    // Edge Extraction
    // =========================================================================

    /// The part of tile `(col, row)` that overlaps its neighbor across `edge`.
    ///
    /// Returns `Ok(None)` when the tile is missing, there is no neighbor in
    /// that direction, the neighbor is missing, or the two tiles do not touch.
    ///
    /// The overlap is the intersection of the two placements, so its extent
    /// comes from the neighbor's stored size rather than this tile's. Edges
    /// requested from both sides of one boundary therefore always have the
    /// same shape.
    ///
    /// # Errors
    ///
    /// `InvalidEdge` if `(col, row)` lies outside the grid.
    pub fn edge(
        &self,
        col: usize,
        row: usize,
        edge: Edge,
    ) -> Result<Option<ArrayView3<'_, f64>>, GridError> {
        if self.index(col, row).is_none() {
            return Err(GridError::invalid_edge(col, row, edge));
        }

        let (Some(tile), Some(here)) = (self.tile(col, row), self.placement(col, row)) else {
            return Ok(None);
        };
        let Some((ncol, nrow)) = self.neighbor(col, row, edge) else {
            return Ok(None);
        };
        let Some(there) = self.placement(ncol, nrow) else {
            return Ok(None);
        };

        let left = here.x.max(there.x) as i64;
        let right = here.right().min(there.right()) as i64;
        let top = here.y.max(there.y) as i64;
        let bottom = here.bottom().min(there.bottom()) as i64;

        let along = match edge {
            Edge::Left | Edge::Right => right - left,
            Edge::Top | Edge::Bottom => bottom - top,
        };
        let across = match edge {
            Edge::Left | Edge::Right => bottom - top,
            Edge::Top | Edge::Bottom => right - left,
        };
        if along <= 0 || across <= 0 {
            self.sink.record(Diagnostic::DegenerateOverlap {
                col,
                row,
                edge,
                overlap: along.min(across),
            });
            return Ok(None);
        }

        let x0 = (left - here.x as i64) as usize;
        let x1 = (right - here.x as i64) as usize;
        let y0 = (top - here.y as i64) as usize;
        let y1 = (bottom - here.y as i64) as usize;

        Ok(Some(tile.slice(s![y0..y1, x0..x1, ..])))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Overwrite the tile in a cell.
    ///
    /// A change of shape is reported but allowed.
    ///
    /// # Errors
    ///
    /// `InvalidTileReplacement` if the replacement has an empty axis, the cell
    /// lies outside the grid, or the cell holds no tile.
    pub fn replace(&mut self, col: usize, row: usize, tile: Raster) -> Result<(), GridError> {
        let invalid = |reason: &str| GridError::InvalidTileReplacement {
            col,
            row,
            reason: reason.to_string(),
        };

        if tile.is_empty() {
            return Err(invalid("replacement has no shape"));
        }
        let index = self
            .index(col, row)
            .ok_or_else(|| invalid("cell outside grid"))?;
        let slot = self.cells[index]
            .as_mut()
            .ok_or_else(|| invalid("cell has no tile"))?;

        if slot.dim() != tile.dim() {
            self.sink.record(Diagnostic::ShapeChanged {
                col,
                row,
                old: slot.dim(),
                new: tile.dim(),
            });
        }
        *slot = tile;
        Ok(())
    }

    /// Multiply every sample of a tile in place. Missing cells are left alone.
    pub fn scale(&mut self, col: usize, row: usize, factor: f64) {
        if let Some(index) = self.index(col, row) {
            if let Some(tile) = self.cells[index].as_mut() {
                tile.mapv_inplace(|v| v * factor);
            }
        }
    }

    pub(crate) fn sink(&self) -> &SharedSink {
        &self.sink
    }
}

// =============================================================================
// Tests
// =============================================================================
