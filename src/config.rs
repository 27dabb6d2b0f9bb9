//! Tool configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file, and command-line flags override both.
//!
//! ## Config File Location
//!
//! `webp-budget` looks for `config.toml` in the current directory unless
//! `--config PATH` points somewhere else. The file is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compression]
//! target_kb = 200           # Size budget per image, in KB (1 KB = 1024 bytes)
//! max_dimension = 1400      # Longer edge limit in pixels
//! profile = "refined"       # "refined" or "aggressive"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [compression]
//! target_kb = 100
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    CompressionRequest, DEFAULT_MAX_DIMENSION, DEFAULT_TARGET_KB, SearchProfile, TargetSize,
    WEBP_MAX_DIMENSION,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Size budget and search settings.
    pub compression: CompressionConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression.target_kb == 0 {
            return Err(ConfigError::Validation(
                "compression.target_kb must be greater than 0".into(),
            ));
        }
        if self.compression.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "compression.max_dimension must be greater than 0".into(),
            ));
        }
        if self.compression.max_dimension > WEBP_MAX_DIMENSION {
            return Err(ConfigError::Validation(format!(
                "compression.max_dimension must be at most {WEBP_MAX_DIMENSION} (largest side WebP can store)"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Size budget and search settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Target size per image in KB.
    pub target_kb: u32,
    /// Longer edge limit in pixels.
    pub max_dimension: u32,
    /// Quality search preset.
    pub profile: SearchProfile,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_kb: DEFAULT_TARGET_KB,
            max_dimension: DEFAULT_MAX_DIMENSION,
            profile: SearchProfile::default(),
        }
    }
}

impl CompressionConfig {
    /// Build the per-image request these settings describe.
    pub fn to_request(&self) -> CompressionRequest {
        CompressionRequest::with_profile(TargetSize::from_kb(self.target_kb), self.profile)
            .max_dimension(self.max_dimension)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILENAME))
}

/// Load an explicit config file path. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# webp-budget Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--target-kb, --max-dimension, --profile) override
# the values in this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compression]
# Size budget per image in KB (1 KB = 1024 bytes). Images that cannot be
# brought under the budget are still written, using the smallest attempt.
target_kb = 200

# Longer edge limit in pixels, at most 16383 (the WebP limit). Larger images
# are scaled down, preserving the aspect ratio. Smaller images are never
# scaled up.
max_dimension = 1400

# Search preset:
#   "refined"    - start at quality 95, step 2, stop below 60, then shrink
#                  dimensions 5% at a time (up to 5 times) at quality 90
#   "aggressive" - start at quality 85, step 5, stop below 10, no shrinking
profile = "refined"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compression workers. Omit for auto (number of CPU cores).
# max_processes = 4
"##
}
