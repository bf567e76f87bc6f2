//! Conversions between rasters and `image` buffers.
//!
//! Decoded rasters are always on the 8-bit scale `0..=255`. 16-bit samples
//! are divided by 257 so they keep their fractional precision without
//! saturating the byte output. Alpha is dropped.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use ndarray::{Array2, Array3, Axis};

use crate::error::RasterError;

use super::Raster;

/// Divisor mapping `0..=65535` onto `0..=255`.
const U16_TO_U8_SCALE: f64 = 257.0;

/// Decode an encoded image (PNG or JPEG) into a raster.
pub fn decode_raster(data: &[u8]) -> Result<Raster, RasterError> {
    let img = image::load_from_memory(data).map_err(|e| RasterError::Decode {
        message: e.to_string(),
    })?;
    Ok(raster_from_image(&img))
}

/// Convert a decoded image into a raster with one or three channels.
pub fn raster_from_image(img: &DynamicImage) -> Raster {
    let (width, height) = (img.width() as usize, img.height() as usize);

    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
            let gray = img.to_luma8();
            gray_to_raster(Array2::from_shape_fn((height, width), |(y, x)| {
                gray.get_pixel(x as u32, y as u32)[0] as f64
            }))
        }
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            let gray = img.to_luma16();
            gray_to_raster(Array2::from_shape_fn((height, width), |(y, x)| {
                gray.get_pixel(x as u32, y as u32)[0] as f64 / U16_TO_U8_SCALE
            }))
        }
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            let rgb = img.to_rgb16();
            Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
                rgb.get_pixel(x as u32, y as u32)[c] as f64 / U16_TO_U8_SCALE
            })
        }
        _ => {
            let rgb = img.to_rgb8();
            Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
                rgb.get_pixel(x as u32, y as u32)[c] as f64
            })
        }
    }
}

/// Promote a single-band array to a one-channel raster.
pub fn gray_to_raster(band: Array2<f64>) -> Raster {
    band.insert_axis(Axis(2))
}

/// Clamp to `0..=255` and round to bytes.
pub fn raster_to_bytes(raster: &Raster) -> Array3<u8> {
    raster.mapv(|v| {
        if v.is_finite() {
            v.round().clamp(0.0, 255.0) as u8
        } else {
            0
        }
    })
}

/// Wrap a byte array as a grayscale or RGB image.
pub fn bytes_to_image(bytes: &Array3<u8>) -> Result<DynamicImage, RasterError> {
    let (height, width, channels) = bytes.dim();
    let data: Vec<u8> = bytes.as_standard_layout().iter().copied().collect();
    let too_small = || RasterError::Encode {
        message: format!("buffer does not match {}x{}x{}", width, height, channels),
    };

    match channels {
        1 => GrayImage::from_raw(width as u32, height as u32, data)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(too_small),
        3 => RgbImage::from_raw(width as u32, height as u32, data)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(too_small),
        channels => Err(RasterError::UnsupportedChannels { channels }),
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RasterError> {
    let mut output = Cursor::new(Vec::new());
    img.write_to(&mut output, ImageFormat::Png)
        .map_err(|e| RasterError::Encode {
            message: e.to_string(),
        })?;
    Ok(output.into_inner())
}

// =============================================================================
// Tests
// =============================================================================
