//! Brightness-only tile matcher.
//!
//! A cheaper alternative to the curve matcher: each tile is multiplied by a
//! single factor, the mean of `target / source` over its overlaps with the
//! left and top neighbors. The composite is then stretched onto `0..=255`.

use std::sync::Arc;

use ndarray::{ArrayView3, Zip};

use crate::diagnostics::{Diagnostic, SharedSink, TracingSink};
use crate::error::MatchError;
use crate::grid::{Edge, Origin, TileGrid, TileSet};
use crate::raster::Raster;

use super::composite::{composite_grid, rescale_to_bytes, ByteComposite};

/// Matches tiles with one scalar gain each.
pub struct BrightnessMatcher {
    name: String,
    tiles: TileSet,
}

impl BrightnessMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let sink: SharedSink = Arc::new(TracingSink::for_job(name.clone()));
        Self::with_sink(name, sink)
    }

    pub fn with_sink(name: impl Into<String>, sink: SharedSink) -> Self {
        Self {
            name: name.into(),
            tiles: TileSet::with_sink(sink),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, tile: Raster, origin: Origin) -> Result<(), MatchError> {
        self.tiles.add(tile, origin)?;
        Ok(())
    }

    /// Build the gain-matched composite, rescaled to bytes.
    pub fn composite(&self) -> Result<ByteComposite, MatchError> {
        if self.tiles.is_empty() {
            return Err(MatchError::NoTiles);
        }
        let grid = self.tiles.to_grid()?;
        let adjusted = self.match_all_tiles(&grid)?;
        let composite = composite_grid(&adjusted)?;
        Ok(ByteComposite {
            bytes: rescale_to_bytes(&composite.raster),
            rect: composite.rect,
        })
    }

    /// Scale every tile after the first by the mean ratio over its overlaps.
    pub fn match_all_tiles(&self, grid: &TileGrid) -> Result<TileGrid, MatchError> {
        let mut adjusted = grid.clone();
        for (col, row) in grid.positions() {
            if (col, row) == (0, 0) || grid.is_missing(col, row) {
                continue;
            }

            let mut ratios = Vec::new();
            let mut discarded = 0;
            for (edge, neighbor) in [
                (Edge::Left, col.checked_sub(1).map(|c| (c, row))),
                (Edge::Top, row.checked_sub(1).map(|r| (col, r))),
            ] {
                let Some((ncol, nrow)) = neighbor else { continue };
                let source = grid.edge(col, row, edge)?;
                let target = adjusted.edge(ncol, nrow, edge.opposite())?;
                if let (Some(source), Some(target)) = (source, target) {
                    discarded += collect_ratios(source, target, &mut ratios)?;
                }
            }

            if discarded > 0 {
                grid.sink().record(Diagnostic::NonFiniteRatios {
                    col,
                    row,
                    discarded,
                });
            }

            if ratios.is_empty() {
                grid.sink().record(Diagnostic::TileKept { col, row });
                continue;
            }
            let gain = ratios.iter().sum::<f64>() / ratios.len() as f64;
            adjusted.scale(col, row, gain);
            grid.sink().record(Diagnostic::TileAdjusted {
                col,
                row,
                candidates: ratios.len(),
            });
        }
        Ok(adjusted)
    }
}

/// Push the finite elementwise `target / source` ratios, returning how many
/// were discarded.
fn collect_ratios(
    source: ArrayView3<'_, f64>,
    target: ArrayView3<'_, f64>,
    ratios: &mut Vec<f64>,
) -> Result<usize, MatchError> {
    if source.dim() != target.dim() {
        return Err(MatchError::ShapeMismatch {
            source_shape: source.dim(),
            target_shape: target.dim(),
        });
    }
    let mut discarded = 0;
    Zip::from(&source).and(&target).for_each(|&s, &t| {
        let ratio = t / s;
        if ratio.is_finite() {
            ratios.push(ratio);
        } else {
            discarded += 1;
        }
    });
    Ok(discarded)
}
