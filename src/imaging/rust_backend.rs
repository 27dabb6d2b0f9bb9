//! Pure Rust decoding and resizing, libwebp encoding.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, TIFF, BMP) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → lossy WebP | `webp::Encoder` (`from_rgba` keeps alpha, `from_rgb` otherwise) |
//!
//! The `image` crate's own WebP encoder is lossless-only, which is why the
//! encode side goes through libwebp.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Short name of the format detected from the leading bytes, if any.
pub fn detect_format(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .and_then(|fmt| fmt.extensions_str().first().copied())
}

/// Backend built on the `image` and `webp` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        image.dimensions().into()
    }

    fn resize(&self, image: &DynamicImage, target: Dimensions) -> DynamicImage {
        // resize_exact keeps the colour type, so RGBA stays RGBA
        image.resize_exact(target.width, target.height, FilterType::Lanczos3)
    }

    fn encode_webp(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let (width, height) = image.dimensions();
        let q = quality.value() as f32;

        let result = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, q)
        } else {
            let rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, q)
        };
        let encoded = result
            .map_err(|e| BackendError::Encode(format!("{e:?} ({width}x{height} at {quality})")))?;

        if encoded.is_empty() {
            return Err(BackendError::Encode(format!(
                "encoder produced no data ({width}x{height} at {quality})"
            )));
        }
        Ok(encoded.to_vec())
    }
}
