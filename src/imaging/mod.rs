//! Image compression under a byte budget.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Clamp** | `Lanczos3` resize to the max dimension |
//! | **Encode** | lossy WebP via `webp` (libwebp) |
//! | **Search** | quality descent, then optional dimension fallback |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Requests, results, quality and search presets
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The budget search combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{clamp_to_max_dimension, fallback_scales, scale_dimensions, size_in_kb};
pub use operations::{compress_image_to_webp, compress_to_webp, is_webp};
pub use params::{
    CompressionRequest, CompressionResult, DEFAULT_MAX_DIMENSION, DEFAULT_TARGET_KB,
    DimensionFallback, Quality, QualitySearch, SearchProfile, Stage, TargetSize, WEBP_MAX_DIMENSION,
};
pub use rust_backend::{RustBackend, detect_format, supported_input_extensions};
