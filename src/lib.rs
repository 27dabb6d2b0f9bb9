//! # webp-budget
//!
//! Compress uploaded images to WebP under a per-file size budget.
//!
//! Admin upload forms for menu items, banners, logos and event posters all
//! want the same thing: a reasonably sharp WebP no larger than about 200 KB,
//! with its longer edge at most 1400 px. This crate does that for one image
//! ([`imaging::compress_to_webp`]) or for whole directories
//! ([`batch::compress_paths`]).
//!
//! # The Search
//!
//! ```text
//! decode → clamp to max dimension → quality descent → dimension fallback → best effort
//!            (never upscales)          95, 93, … 61       95%, 90%, … at q90
//! ```
//!
//! The first candidate under the budget wins. If none fits, the smallest
//! candidate is returned with `target_met = false` rather than an error:
//! an upload slightly over budget is better than a failed upload.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, resize, encode, and the budget search itself |
//! | [`batch`] | Expands files/directories into jobs and runs them in parallel |
//! | [`cache`] | Content-addressed manifest so unchanged inputs are not re-encoded |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`naming`] | Output file names and relative output paths |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Lossy WebP via libwebp
//!
//! The `image` crate decodes every input format we accept but only writes
//! lossless WebP, which cannot trade quality for size. Encoding goes through
//! the `webp` crate's libwebp bindings instead. The rest of the pipeline
//! (decode, Lanczos3 resize) stays in `image`.
//!
//! ## Backend Trait
//!
//! The search only talks to [`imaging::ImageBackend`]. Production uses
//! [`imaging::RustBackend`]; tests use a mock whose "encoded size" is a pure
//! function of dimensions and quality, so every branch of the search can be
//! driven with exact numbers and no real encoding.
//!
//! ## WebP Passthrough
//!
//! A WebP input already within the dimension limit and under budget is
//! returned untouched. Re-encoding it would only lose quality, and it makes
//! running the tool twice over its own output a no-op.

pub mod batch;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
