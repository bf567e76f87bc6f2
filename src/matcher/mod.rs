//! Brightness reconciliation across a tile grid.
//!
//! Both matchers walk the grid in the same order and never touch the tile at
//! `(0, 0)`, which anchors the composite:
//!
//! ```text
//!   row 0:   anchor ──► (1,0) ──► (2,0)        each tile is fitted to the
//!              │                               already-adjusted tile on its
//!              ▼                               left, or above it in col 0
//!   row 1:   (0,1) ──► (1,1) ──► (2,1)
//! ```
//!
//! # Components
//!
//! - [`TileMatcher`]: per-channel value curves fitted on each overlap
//! - [`BrightnessMatcher`]: a single gain per tile, then a byte rescale
//! - [`ValueMapper`]: the curve fitting used by `TileMatcher`
//! - [`composite_grid`]: flattening an adjusted grid onto one canvas
//! - [`stitch_tiles`]: picks a matcher from a [`MatchConfig`] and returns bytes

mod brightness;
mod composite;
mod curve;
mod options;
mod value_map;

pub use brightness::BrightnessMatcher;
pub use composite::{composite_grid, rescale_to_bytes, ByteComposite, Composite};
pub use curve::TileMatcher;
pub use options::{Extrapolation, MatchConfig, NeighborPolicy, Strategy};
pub use value_map::{ChannelMapper, ValueMapper};

use crate::diagnostics::SharedSink;
use crate::error::MatchError;
use crate::grid::Origin;
use crate::raster::{lab_to_rgb, raster_to_bytes, rgb_to_lab, stretch_channels, Raster};

/// Composite `tiles` with the strategy selected in `config`.
///
/// The curve strategy stretches the composite into `config.channel_ranges`
/// (when any are set) and then rounds to bytes. With `config.lab` the tiles
/// are matched in Lab and the composite is converted back to sRGB before
/// rounding. The brightness strategy applies its own full-range rescale.
///
/// # Errors
///
/// Besides the matchers' own errors, Lab matching fails with
/// `ChannelMismatch` on a tile that is not three-channel.
pub fn stitch_tiles<I>(
    name: &str,
    tiles: I,
    config: &MatchConfig,
    sink: SharedSink,
) -> Result<ByteComposite, MatchError>
where
    I: IntoIterator<Item = (Origin, Raster)>,
{
    match config.strategy {
        Strategy::Curve => {
            let mut matcher = TileMatcher::with_sink(name, sink).with_config(config.clone());
            for (origin, tile) in tiles {
                let tile = if config.lab {
                    rgb_to_lab(&tile).ok_or(MatchError::ChannelMismatch {
                        expected: 3,
                        actual: tile.dim().2,
                        x: origin.x,
                        y: origin.y,
                    })?
                } else {
                    tile
                };
                matcher.add(tile, origin)?;
            }
            let Composite { mut raster, rect } = matcher.composite()?;
            if !config.channel_ranges.is_empty() {
                stretch_channels(&mut raster, &config.channel_ranges);
            }
            if config.lab {
                // Every tile was converted, so the composite is three-channel.
                raster = lab_to_rgb(&raster).unwrap_or(raster);
            }
            Ok(ByteComposite {
                bytes: raster_to_bytes(&raster),
                rect,
            })
        }
        Strategy::Brightness => {
            let mut matcher = BrightnessMatcher::with_sink(name, sink);
            for (origin, tile) in tiles {
                matcher.add(tile, origin)?;
            }
            matcher.composite()
        }
    }
}
