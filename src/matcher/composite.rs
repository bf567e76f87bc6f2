//! Flattening a grid into one canvas.

use ndarray::{s, Array3};

use crate::diagnostics::Diagnostic;
use crate::error::MatchError;
use crate::grid::{Rect, TileGrid};
use crate::raster::Raster;

/// A flattened composite and the rectangle it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub raster: Raster,
    pub rect: Rect,
}

/// A composite already rescaled to bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteComposite {
    pub bytes: Array3<u8>,
    pub rect: Rect,
}

/// Paste every present tile onto a zeroed canvas at its origin.
///
/// The canvas spans from `(0, 0)` to the furthest tile extent. Tiles are
/// pasted in row-major order, so where tiles overlap the later one wins.
///
/// # Errors
///
/// - `NoTiles` if the grid holds no tile
/// - `ChannelMismatch` if tiles disagree on channel count
pub fn composite_grid(grid: &TileGrid) -> Result<Composite, MatchError> {
    let mut width: u64 = 0;
    let mut height: u64 = 0;
    let mut channels: Option<usize> = None;
    let mut records: Vec<(&Raster, Rect)> = Vec::with_capacity(grid.present_count());

    for (col, row) in grid.positions() {
        let Some((tile, rect)) = grid.tile_with_placement(col, row) else {
            grid.sink().record(Diagnostic::MissingTile { col, row });
            continue;
        };

        let tile_channels = tile.dim().2;
        match channels {
            None => channels = Some(tile_channels),
            Some(expected) if expected != tile_channels => {
                return Err(MatchError::ChannelMismatch {
                    expected,
                    actual: tile_channels,
                    x: rect.x,
                    y: rect.y,
                });
            }
            Some(_) => {}
        }

        width = width.max(rect.right());
        height = height.max(rect.bottom());
        records.push((tile, rect));
    }

    let channels = channels.ok_or(MatchError::NoTiles)?;
    let mut canvas = Array3::zeros((height as usize, width as usize, channels));
    for (tile, rect) in records {
        let (x, y) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        canvas.slice_mut(s![y..y + h, x..x + w, ..]).assign(tile);
    }

    grid.sink().record(Diagnostic::CompositeBuilt {
        width: width as usize,
        height: height as usize,
        channels,
    });

    Ok(Composite {
        raster: canvas,
        rect: Rect::new(0, 0, width as u32, height as u32),
    })
}

/// Linear rescale of the whole raster onto `0..=255`, truncating.
///
/// `(v - min) / (max - min) * 255` over finite samples. A constant (or
/// entirely non-finite) raster maps to zeros.
pub fn rescale_to_bytes(raster: &Raster) -> Array3<u8> {
    let (vmin, vmax) = raster
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let dv = vmax - vmin;
    if dv.is_nan() || dv <= 0.0 {
        return Array3::zeros(raster.dim());
    }

    raster.mapv(|v| {
        if v.is_finite() {
            ((v - vmin) / dv * 255.0) as u8
        } else {
            0
        }
    })
}
