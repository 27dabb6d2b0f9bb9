//! Parameter types for a compression run.
//!
//! These structs describe *what* to aim for, not *how* to get there. They are
//! the interface between callers (the CLI, the batch runner, library users)
//! and the search in [`operations`](super::operations).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality as a percent (1–100). Clamped on construction.
//! - [`TargetSize`]: The byte budget the search tries to meet.
//! - [`QualitySearch`]: Start, step and floor of the quality descent.
//! - [`DimensionFallback`]: Optional shrink phase once quality alone fails.
//! - [`SearchProfile`]: Named presets combining the two.
//! - [`CompressionRequest`] / [`CompressionResult`]: One call's input and output.

use super::calculations::size_in_kb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default longer-edge limit in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1400;

/// Default byte budget in kilobytes.
pub const DEFAULT_TARGET_KB: u32 = 200;

/// Largest width or height libwebp will encode.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Quality setting for lossy WebP encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality in the `[0, 1]` range.
    pub fn as_fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Maximum desired encoded size.
///
/// Sizes are compared in kilobytes (bytes / 1024), which for a byte budget is
/// the same as comparing byte counts directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    bytes: u64,
}

impl TargetSize {
    pub fn from_kb(kb: u32) -> Self {
        Self {
            bytes: kb as u64 * 1024,
        }
    }

    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub fn bytes(self) -> u64 {
        self.bytes
    }

    pub fn kb(self) -> f64 {
        self.bytes as f64 / 1024.0
    }

    /// Whether an encoded size of `len` bytes fits the budget.
    pub fn is_met_by(self, len: usize) -> bool {
        size_in_kb(len) <= self.kb()
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::from_kb(DEFAULT_TARGET_KB)
    }
}

/// Quality descent: start at `initial`, lower by `step` while `>= floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySearch {
    pub initial: Quality,
    pub step: u32,
    pub floor: Quality,
}

impl QualitySearch {
    /// Every quality the descent will try, in order.
    pub fn qualities(&self) -> Vec<Quality> {
        let step = self.step.max(1);
        let mut out = Vec::new();
        let mut q = self.initial.value();
        while q >= self.floor.value() {
            out.push(Quality::new(q));
            match q.checked_sub(step) {
                Some(next) => q = next,
                None => break,
            }
        }
        out
    }
}

/// Shrink phase run after the quality descent misses the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionFallback {
    /// Percent removed from the clamped size per attempt.
    pub step_percent: u32,
    pub max_attempts: u32,
    /// Fixed quality every shrunken candidate is encoded at.
    pub quality: Quality,
}

impl Default for DimensionFallback {
    fn default() -> Self {
        Self {
            step_percent: 5,
            max_attempts: 5,
            quality: Quality::new(90),
        }
    }
}

/// Named search presets.
///
/// The two behaviours are never mixed: a request runs one profile's descent
/// and, only for `Refined`, its dimension fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProfile {
    /// Start at q95, step 2, stop below q60, then shrink up to 5 × 5%.
    #[default]
    Refined,
    /// Start at q85, step 5, stop below q10, no shrinking.
    Aggressive,
}

impl SearchProfile {
    pub fn quality_search(self) -> QualitySearch {
        match self {
            SearchProfile::Refined => QualitySearch {
                initial: Quality::new(95),
                step: 2,
                floor: Quality::new(60),
            },
            SearchProfile::Aggressive => QualitySearch {
                initial: Quality::new(85),
                step: 5,
                floor: Quality::new(10),
            },
        }
    }

    pub fn dimension_fallback(self) -> Option<DimensionFallback> {
        match self {
            SearchProfile::Refined => Some(DimensionFallback::default()),
            SearchProfile::Aggressive => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SearchProfile::Refined => "refined",
            SearchProfile::Aggressive => "aggressive",
        }
    }
}

impl FromStr for SearchProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "refined" => Ok(SearchProfile::Refined),
            "aggressive" => Ok(SearchProfile::Aggressive),
            other => Err(format!(
                "unknown profile '{other}' (expected 'refined' or 'aggressive')"
            )),
        }
    }
}

/// Everything one compression call needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    pub target: TargetSize,
    pub max_dimension: u32,
    pub search: QualitySearch,
    pub fallback: Option<DimensionFallback>,
}

impl CompressionRequest {
    /// Request with the default (`Refined`) profile and max dimension.
    pub fn new(target: TargetSize) -> Self {
        Self::with_profile(target, SearchProfile::default())
    }

    pub fn with_profile(target: TargetSize, profile: SearchProfile) -> Self {
        Self {
            target,
            max_dimension: DEFAULT_MAX_DIMENSION,
            search: profile.quality_search(),
            fallback: profile.dimension_fallback(),
        }
    }

    pub fn max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.clamp(1, WEBP_MAX_DIMENSION);
        self
    }
}

impl Default for CompressionRequest {
    fn default() -> Self {
        Self::new(TargetSize::default())
    }
}

/// Which phase of the search produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The input was already a WebP within bounds and was returned as-is.
    Passthrough,
    QualitySearch,
    DimensionFallback,
}

/// Output of a compression call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    /// Encoded WebP bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Encoder quality used; `None` for [`Stage::Passthrough`].
    pub quality: Option<Quality>,
    pub stage: Stage,
    /// `false` when the returned candidate is the best effort over budget.
    pub target_met: bool,
}

impl CompressionResult {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_kb(&self) -> f64 {
        size_in_kb(self.bytes.len())
    }
}
