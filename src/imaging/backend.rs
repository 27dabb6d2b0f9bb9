//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations the budget search needs:
//! decode, dimensions, resize and lossy WebP encode. The search in
//! [`operations`](super::operations) only talks to this trait, so it can be
//! exercised against a mock that fakes encoded sizes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// Input bytes could not be interpreted as an image.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    /// The WebP encoder failed or is unavailable.
    #[error("Failed to encode WebP: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the batch runner shares one backend across
/// rayon workers, and every call works on its own buffers.
pub trait ImageBackend: Sync {
    /// In-memory decoded image.
    type Image;

    /// Decode encoded bytes in any supported raster format.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Resize to exact dimensions, preserving the alpha channel if present.
    fn resize(&self, image: &Self::Image, target: Dimensions) -> Self::Image;

    /// Encode as lossy WebP at the given quality.
    fn encode_webp(&self, image: &Self::Image, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
