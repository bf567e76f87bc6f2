//! Raster types and conversions.
//!
//! A [`Raster`] is an `(rows, cols, channels)` array of `f64` samples. The
//! compositing core works exclusively on rasters; this module converts them
//! to and from `image` buffers at the edges of the system, and between sRGB
//! and CIE Lab for matching in a perceptual space.
//!
//! # Coordinate System
//!
//! - **ndarray**: `[row, col, channel]` = `[y, x, c]` with `(height, width, channels)` dims
//! - **image crate**: `(x, y)` with `(width, height)` dims

mod bands;
mod convert;
mod lab;

pub use bands::{merge_bands, stretch_channels, ChannelRange, LAB_RANGES};
pub use convert::{
    bytes_to_image, decode_raster, encode_png, gray_to_raster, raster_from_image,
    raster_to_bytes,
};
pub use lab::{lab_to_rgb, pixel_from_lab, pixel_to_lab, rgb_to_lab};

use ndarray::Array3;

/// Tile or composite samples, `(rows, cols, channels)`.
pub type Raster = Array3<f64>;
