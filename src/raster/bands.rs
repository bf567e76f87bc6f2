//! Per-channel range handling and band merging.

use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::RasterError;

use super::Raster;

/// Valid numeric range of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,

    /// Always stretch to the full range, not only when values fall outside it.
    #[serde(default)]
    pub stretch: bool,
}

impl ChannelRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            stretch: false,
        }
    }

    pub const fn stretched(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            stretch: true,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// CIE Lab channel ranges: L is always stretched, a and b only when they
/// leave their range.
pub const LAB_RANGES: [ChannelRange; 3] = [
    ChannelRange::stretched(0.0, 100.0),
    ChannelRange::new(-127.0, 128.0),
    ChannelRange::new(-128.0, 127.0),
];

/// Linearly rescale channels into their valid ranges, in place.
///
/// Channels beyond `ranges.len()` are untouched. A channel whose finite
/// values are constant cannot be stretched; it is clamped into range instead.
pub fn stretch_channels(raster: &mut Raster, ranges: &[ChannelRange]) {
    for (channel, range) in ranges.iter().enumerate() {
        if channel >= raster.dim().2 {
            break;
        }
        let mut values = raster.index_axis_mut(Axis(2), channel);

        let (min_in, max_in) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min_in > max_in {
            continue;
        }

        let out_of_range = !range.contains(min_in) || !range.contains(max_in);
        if !(range.stretch || out_of_range) {
            continue;
        }

        let d_in = max_in - min_in;
        if d_in <= 0.0 {
            values.mapv_inplace(|v| v.clamp(range.min, range.max));
            continue;
        }
        let scale = range.span() / d_in;
        values.mapv_inplace(|v| (v - min_in) * scale + range.min);
    }
}

/// Combine up to three single-color rasters into one RGB raster.
///
/// Band `i` takes channel `i` from its raster, or channel 0 when that raster
/// has a single channel. Absent bands are zero-filled.
///
/// # Errors
///
/// - `NoBands` if all three are `None`
/// - `BandSizeMismatch` if the present bands differ in size
pub fn merge_bands(bands: [Option<&Raster>; 3]) -> Result<Raster, RasterError> {
    let mut sizes: Vec<(usize, usize)> = bands
        .iter()
        .flatten()
        .map(|band| {
            let (h, w, _) = band.dim();
            (h, w)
        })
        .collect();
    sizes.sort_unstable();
    sizes.dedup();

    let (height, width) = match sizes.as_slice() {
        [] => return Err(RasterError::NoBands),
        [size] => *size,
        _ => return Err(RasterError::BandSizeMismatch { sizes }),
    };

    let mut merged = Array3::zeros((height, width, 3));
    for (channel, band) in bands.iter().enumerate() {
        let Some(band) = band else { continue };
        let source = if band.dim().2 == 1 { 0 } else { channel };
        if source >= band.dim().2 {
            return Err(RasterError::UnsupportedChannels {
                channels: band.dim().2,
            });
        }
        merged
            .index_axis_mut(Axis(2), channel)
            .assign(&band.index_axis(Axis(2), source));
    }
    Ok(merged)
}
