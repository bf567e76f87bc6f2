//! Test utilities for integration tests.
//!
//! This module provides an in-memory image supplier and helpers for building
//! rasters and scratch directories.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, Rgb};
use ndarray::Array3;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use pano_stitch::error::SupplyError;
use pano_stitch::raster::{bytes_to_image, encode_png, Raster};
use pano_stitch::supply::ImageSupplier;

// =============================================================================
// Mock Supplier
// =============================================================================

/// Serves PNG-encoded images from memory and counts fetches.
#[derive(Default)]
pub struct MockSupplier {
    images: HashMap<String, Bytes>,
    fetch_count: AtomicUsize,
}

impl MockSupplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an 8-bit image under `id`.
    pub fn with_image(mut self, id: &str, pixels: Array3<u8>) -> Self {
        let png = encode_png(&bytes_to_image(&pixels).unwrap()).unwrap();
        self.images.insert(id.to_string(), Bytes::from(png));
        self
    }

    /// Register a 16-bit RGB image under `id`.
    pub fn with_image16(mut self, id: &str, pixels: Array3<u16>) -> Self {
        let (height, width, _) = pixels.dim();
        let data: Vec<u16> = pixels.as_standard_layout().iter().copied().collect();
        let img = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width as u32, height as u32, data)
            .unwrap();
        let png = encode_png(&DynamicImage::ImageRgb16(img)).unwrap();
        self.images.insert(id.to_string(), Bytes::from(png));
        self
    }

    /// Register arbitrary bytes, e.g. something that will not decode.
    pub fn with_bytes(mut self, id: &str, data: &[u8]) -> Self {
        self.images.insert(id.to_string(), Bytes::copy_from_slice(data));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSupplier for MockSupplier {
    async fn fetch_bytes(&self, id: &str) -> Result<Bytes, SupplyError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.images
            .get(id)
            .cloned()
            .ok_or_else(|| SupplyError::NotFound(id.to_string()))
    }
}

// =============================================================================
// Raster Builders
// =============================================================================

/// A tile filled with one value.
pub fn constant_tile(rows: usize, cols: usize, channels: usize, value: f64) -> Raster {
    Array3::from_elem((rows, cols, channels), value)
}

/// An 8-bit RGB frame filled with one value.
pub fn constant_frame(rows: usize, cols: usize, value: u8) -> Array3<u8> {
    Array3::from_elem((rows, cols, 3), value)
}

/// A horizontal ramp: column `x` holds `start + x * step` in every channel.
pub fn ramp_tile(rows: usize, cols: usize, channels: usize, start: f64, step: f64) -> Raster {
    Array3::from_shape_fn((rows, cols, channels), |(_, x, _)| start + x as f64 * step)
}

/// A fresh directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pano-stitch-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
