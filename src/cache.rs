//! Compression cache for repeated runs.
//!
//! The budget search can encode an image twenty-odd times before it settles,
//! so re-running over a folder of unchanged uploads is wasteful. This module
//! lets the batch runner skip the search when the source bytes and the
//! compression settings haven't changed since the last run.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **content-addressed**: lookups are by the combination of
//! `source_hash` and `params_hash`, not by output file path. Renaming or
//! moving a source file does not invalidate its entry; only actual image
//! content or compression setting changes do.
//!
//! - **`source_hash`**: SHA-256 of the source bytes. Content-based rather than
//!   mtime-based so it survives `git checkout` and copies.
//!
//! - **`params_hash`**: SHA-256 of the [`CompressionRequest`]: target bytes,
//!   max dimension, the quality descent and the dimension fallback. Changing
//!   the budget or profile re-runs the search.
//!
//! A cache hit requires:
//! 1. An entry with matching `source_hash` and `params_hash` exists
//! 2. The previously-written output file still exists on disk
//!
//! When a hit is found but the output path has changed (e.g. the source was
//! renamed), the cached file is copied to the new location instead of
//! re-encoding.
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<output_dir>/.cache-manifest.json`.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `compress` to force a full run. This loads an empty
//! manifest, so every image is re-encoded and old outputs are overwritten.

use crate::imaging::CompressionRequest;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping output paths to their cache entries.
///
/// Lookups go through a runtime `content_index` that maps
/// `"{source_hash}:{params_hash}"` to the stored output path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// Runtime reverse index: `"{source_hash}:{params_hash}"` → output_path.
    /// Built at load time, maintained on insert. Never serialized.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or the first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let path = manifest_path(output_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache manifest {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = build_content_index(&manifest.entries);
        manifest
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Look up a cached output file by content hashes.
    ///
    /// Returns `Some(stored_output_path)` if an entry with matching
    /// `source_hash` and `params_hash` exists **and** the file is still
    /// on disk. The returned path may differ from the caller's expected
    /// output path; the caller copies the file over if needed.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let content_key = format!("{}:{}", source_hash, params_hash);
        let stored_path = self.content_index.get(&content_key)?;
        let entry = self.entries.get(stored_path)?;
        if entry.source_hash != source_hash || entry.params_hash != params_hash {
            return None;
        }
        if output_dir.join(stored_path).exists() {
            Some(stored_path.clone())
        } else {
            None
        }
    }

    /// Record a cache entry for an output file.
    ///
    /// If an entry with the same content already exists under a different
    /// output path, the old entry is removed. If `output_path` previously
    /// held different content, that content no longer resolves to it.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let content_key = format!("{}:{}", source_hash, params_hash);

        if let Some(previous) = self.entries.get(&output_path) {
            let previous_key = format!("{}:{}", previous.source_hash, previous.params_hash);
            if previous_key != content_key
                && self.content_index.get(&previous_key) == Some(&output_path)
            {
                self.content_index.remove(&previous_key);
            }
        }

        if let Some(old_path) = self.content_index.get(&content_key)
            && *old_path != output_path
        {
            self.entries.remove(old_path.as_str());
        }

        self.content_index.insert(content_key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// Build the content_index reverse map from the entries map.
fn build_content_index(entries: &HashMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(output_path, entry)| {
            let content_key = format!("{}:{}", entry.source_hash, entry.params_hash);
            (content_key, output_path.clone())
        })
        .collect()
}

/// SHA-256 of a byte slice, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of every setting that influences the compressed output.
pub fn hash_request_params(request: &CompressionRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"webp-budget\0");
    hasher.update(request.target.bytes().to_le_bytes());
    hasher.update(request.max_dimension.to_le_bytes());
    hasher.update(request.search.initial.value().to_le_bytes());
    hasher.update(request.search.step.to_le_bytes());
    hasher.update(request.search.floor.value().to_le_bytes());
    match request.fallback {
        Some(fallback) => {
            hasher.update(b"\x01");
            hasher.update(fallback.step_percent.to_le_bytes());
            hasher.update(fallback.max_attempts.to_le_bytes());
            hasher.update(fallback.quality.value().to_le_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 || self.copies > 0 {
            if self.copies > 0 {
                write!(
                    f,
                    "{} cached, {} copied, {} encoded ({} total)",
                    self.hits,
                    self.copies,
                    self.misses,
                    self.total()
                )
            } else {
                write!(
                    f,
                    "{} cached, {} encoded ({} total)",
                    self.hits,
                    self.misses,
                    self.total()
                )
            }
        } else {
            write!(f, "{} encoded", self.misses)
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
