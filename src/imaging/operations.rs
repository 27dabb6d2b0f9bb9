//! The size-budget search.
//!
//! [`compress_to_webp`] takes encoded bytes and a [`CompressionRequest`] and
//! returns the first WebP candidate that fits the budget, or the smallest
//! candidate it produced along the way. Running out of options is never an
//! error: only decode and encode failures are.
//!
//! ## Search order
//!
//! ```text
//! decode ─► clamp to max_dimension ─► passthrough? (WebP input already fits)
//!        ─► quality descent  q95, q93, … ≥ q60   (first fit wins)
//!        ─► dimension fallback 95%, 90%, … @ q90 (Refined profile only)
//!        ─► smallest candidate seen, flagged target_met = false
//! ```

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{clamp_to_max_dimension, fallback_scales, scale_dimensions, size_in_kb};
use super::params::{CompressionRequest, CompressionResult, Quality, Stage, TargetSize};
use super::rust_backend::RustBackend;
use tracing::{debug, info, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Whether the bytes carry a RIFF/WEBP container header.
pub fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

/// Compress `bytes` to WebP with the default backend and profile.
///
/// `target_kb` is the budget in kilobytes; 200 is what the upload forms use.
pub fn compress_image_to_webp(bytes: &[u8], target_kb: u32) -> Result<CompressionResult> {
    let request = CompressionRequest::new(TargetSize::from_kb(target_kb));
    compress_to_webp(&RustBackend::new(), bytes, &request)
}

/// Smallest candidate seen so far.
struct BestSoFar {
    best: Option<CompressionResult>,
}

impl BestSoFar {
    fn new() -> Self {
        Self { best: None }
    }

    fn offer(&mut self, candidate: CompressionResult) {
        let smaller = self
            .best
            .as_ref()
            .is_none_or(|best| candidate.size_bytes() < best.size_bytes());
        if smaller {
            self.best = Some(candidate);
        }
    }

    fn into_inner(self) -> Option<CompressionResult> {
        self.best
    }
}

/// Re-encode `bytes` as WebP, aiming for `request.target`.
///
/// Fails only when the input cannot be decoded ([`BackendError::Decode`]) or
/// the encoder fails ([`BackendError::Encode`]).
pub fn compress_to_webp<B: ImageBackend>(
    backend: &B,
    bytes: &[u8],
    request: &CompressionRequest,
) -> Result<CompressionResult> {
    let source = backend.decode(bytes)?;
    let original = backend.dimensions(&source);
    let clamped: Dimensions =
        clamp_to_max_dimension(original.as_tuple(), request.max_dimension).into();

    debug!(
        "Decoded {}x{} source, working size {}x{}, target {:.1} KB",
        original.width,
        original.height,
        clamped.width,
        clamped.height,
        request.target.kb()
    );

    let mut best = BestSoFar::new();

    if is_webp(bytes) && clamped == original {
        let candidate = CompressionResult {
            bytes: bytes.to_vec(),
            width: original.width,
            height: original.height,
            quality: None,
            stage: Stage::Passthrough,
            target_met: request.target.is_met_by(bytes.len()),
        };
        if candidate.target_met {
            info!(
                "WebP source already fits: {:.2} KB, left untouched",
                candidate.size_kb()
            );
            return Ok(candidate);
        }
        best.offer(candidate);
    }

    let working = if clamped == original {
        source
    } else {
        backend.resize(&source, clamped)
    };

    for quality in request.search.qualities() {
        let candidate = encode_candidate(
            backend,
            &working,
            clamped,
            quality,
            Stage::QualitySearch,
            request.target,
        )?;
        if candidate.target_met {
            return Ok(report_success(candidate));
        }
        best.offer(candidate);
    }

    if let Some(fallback) = request.fallback {
        for percent in fallback_scales(fallback.step_percent, fallback.max_attempts) {
            let dims: Dimensions = scale_dimensions(clamped.as_tuple(), percent).into();
            // Each attempt resamples the clamped image, not the previous attempt
            let shrunk = backend.resize(&working, dims);
            let candidate = encode_candidate(
                backend,
                &shrunk,
                dims,
                fallback.quality,
                Stage::DimensionFallback,
                request.target,
            )?;
            if candidate.target_met {
                return Ok(report_success(candidate));
            }
            best.offer(candidate);
        }
    }

    match best.into_inner() {
        Some(result) => {
            warn!(
                "Size budget not met: {:.2} KB > {:.1} KB ({}x{}, {})",
                result.size_kb(),
                request.target.kb(),
                result.width,
                result.height,
                describe_quality(result.quality)
            );
            Ok(result)
        }
        // Only reachable when the descent is empty and there is no fallback
        None => {
            let quality = request.search.floor;
            let candidate = encode_candidate(
                backend,
                &working,
                clamped,
                quality,
                Stage::QualitySearch,
                request.target,
            )?;
            if candidate.target_met {
                Ok(report_success(candidate))
            } else {
                warn!(
                    "Size budget not met: {:.2} KB > {:.1} KB",
                    candidate.size_kb(),
                    request.target.kb()
                );
                Ok(candidate)
            }
        }
    }
}

fn encode_candidate<B: ImageBackend>(
    backend: &B,
    image: &B::Image,
    dims: Dimensions,
    quality: Quality,
    stage: Stage,
    target: TargetSize,
) -> Result<CompressionResult> {
    let bytes = backend.encode_webp(image, quality)?;
    debug!(
        "Encoded {}x{} at {}: {:.2} KB",
        dims.width,
        dims.height,
        quality,
        size_in_kb(bytes.len())
    );
    let target_met = target.is_met_by(bytes.len());
    Ok(CompressionResult {
        bytes,
        width: dims.width,
        height: dims.height,
        quality: Some(quality),
        stage,
        target_met,
    })
}

fn report_success(result: CompressionResult) -> CompressionResult {
    info!(
        "Image compressed to {:.2} KB ({}x{}, {})",
        result.size_kb(),
        result.width,
        result.height,
        describe_quality(result.quality)
    );
    result
}

fn describe_quality(quality: Option<Quality>) -> String {
    match quality {
        Some(q) => q.to_string(),
        None => "original".to_string(),
    }
}
