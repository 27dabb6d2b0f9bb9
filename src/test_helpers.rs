//! Shared test utilities for the webp-budget test suite.
//!
//! Generates synthetic images in memory so tests need no fixture files.
//! Everything is deterministic: the "noise" comes from a fixed-seed LCG.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let png = encode_png(&gradient_rgb(640, 480));
//! let path = write_file(tmp.path(), "hero.png", &png);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// Smooth diagonal gradient. Compresses very well.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let r = (x as f32 / w * 255.0) as u8;
        let g = (y as f32 / h * 255.0) as u8;
        let b = ((x + y) as f32 / (w + h) * 255.0) as u8;
        Rgb([r, g, b])
    }))
}

/// Per-pixel random colours. Compresses badly at any quality.
pub fn noisy_photo(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u8
    };
    let mut img = RgbImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([next(), next(), next()]);
    }
    DynamicImage::ImageRgb8(img)
}

/// Solid disc on a fully transparent background.
pub fn transparent_logo(width: u32, height: u32) -> DynamicImage {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = cx.min(cy) * 0.6;
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy <= radius * radius {
            Rgba([200, 40, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

// =========================================================================
// Encoders
// =========================================================================

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// JPEG has no alpha; the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(image.to_rgb8()), ImageFormat::Jpeg)
}

pub fn encode_gif(image: &DynamicImage) -> Vec<u8> {
    encode(&DynamicImage::ImageRgba8(image.to_rgba8()), ImageFormat::Gif)
}

// =========================================================================
// Filesystem
// =========================================================================

/// Write `bytes` to `dir/name`, creating `dir` if needed. Returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
