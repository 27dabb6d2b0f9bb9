//! Compress many files in one run.
//!
//! The CLI hands this module a list of files and directories. Each supported
//! image becomes a [`Job`] with a source path and an output path relative to
//! the output directory (see [`naming`](crate::naming)). Jobs run in parallel
//! on the rayon pool; every job owns its decode/encode buffers, so nothing is
//! shared between workers except the cache manifest.
//!
//! ## Failure handling
//!
//! Planning errors (missing input, two sources mapping to one output, nothing
//! to do) abort the run before any work starts. Per-file errors (unreadable
//! file, undecodable bytes) do not: the file is reported as
//! [`FileStatus::Failed`] and the rest of the batch carries on.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── .cache-manifest.json     # see crate::cache
//! ├── logo.webp                # from a file argument
//! └── desserts/                # from a directory argument, sub-path kept
//!     └── tiramisu.webp
//! ```

use crate::cache::{CacheManifest, CacheStats, hash_bytes, hash_request_params};
use crate::imaging::{
    BackendError, CompressionRequest, CompressionResult, ImageBackend, Quality, RustBackend,
    Stage, compress_to_webp,
};
use crate::naming::{is_supported_input, output_relative_path};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{first} and {second} would both be written to {output}")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("No supported images found in the given inputs")]
    NoInputs,
}

/// Settings shared by every job in a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub request: CompressionRequest,
}

/// One file to compress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    /// Output path relative to the output directory.
    pub output: PathBuf,
}

/// Facts about a freshly compressed file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedFile {
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub quality: Option<Quality>,
    pub stage: Stage,
    pub target_met: bool,
}

impl From<&CompressionResult> for CompressedFile {
    fn from(result: &CompressionResult) -> Self {
        Self {
            width: result.width,
            height: result.height,
            size_bytes: result.size_bytes(),
            quality: result.quality,
            stage: result.stage,
            target_met: result.target_met,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Compressed(CompressedFile),
    /// Output already on disk from a previous run with the same settings.
    Cached,
    /// Same content was compressed under another name; the file was copied.
    Copied,
    Failed(String),
}

/// Progress report for one job. Sent as each job finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEvent {
    /// Position of the job in the plan (0-based).
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
}

/// Everything a batch run produced, in plan order.
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<BatchEvent>,
    pub cache_stats: CacheStats,
}

impl BatchResult {
    pub fn compressed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|e| matches!(e.status, FileStatus::Compressed(_)))
            .count()
    }

    pub fn over_budget(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|e| matches!(&e.status, FileStatus::Compressed(f) if !f.target_met))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|e| matches!(e.status, FileStatus::Failed(_)))
            .count()
    }
}

/// Expand command-line inputs into jobs.
///
/// Directories are walked recursively in file-name order; only files with a
/// supported extension are kept. Files passed directly are always kept, so
/// a mislabelled image still gets a chance to decode. Anything under
/// `output_dir` is skipped so re-running into a nested output folder does not
/// pick up its own results. Paths are compared by where they resolve, so
/// `./webp/logo.webp` is inside `webp`.
pub fn plan_jobs(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<Job>, BatchError> {
    // A missing output directory has nothing in it to skip
    let output_root = output_dir.canonicalize().ok();
    let mut jobs = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let walker = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_within(e.path(), output_root.as_deref()));
            for entry in walker {
                let entry = entry?;
                let path = entry.path();
                if !entry.file_type().is_file() || !is_supported_input(path) {
                    continue;
                }
                jobs.push(Job {
                    source: path.to_path_buf(),
                    output: output_relative_path(Some(input), path),
                });
            }
        } else if input.is_file() {
            jobs.push(Job {
                source: input.clone(),
                output: output_relative_path(None, input),
            });
        } else {
            return Err(BatchError::InputNotFound(input.clone()));
        }
    }

    if jobs.is_empty() {
        return Err(BatchError::NoInputs);
    }

    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    for job in &jobs {
        if let Some(first) = claimed.insert(&job.output, &job.source) {
            return Err(BatchError::OutputCollision {
                output: job.output.clone(),
                first: first.to_path_buf(),
                second: job.source.clone(),
            });
        }
    }

    Ok(jobs)
}

fn is_within(path: &Path, root: Option<&Path>) -> bool {
    root.is_some_and(|root| path.canonicalize().is_ok_and(|p| p.starts_with(root)))
}

/// Compress every input with the default backend.
pub fn compress_paths(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &BatchConfig,
    use_cache: bool,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    compress_paths_with_backend(
        &RustBackend::new(),
        inputs,
        output_dir,
        config,
        use_cache,
        events,
    )
}

/// Compress every input using a specific backend.
///
/// Runs in two passes. The first reads every source, hashes it and decides
/// against the manifest as loaded whether the job can reuse or copy an
/// earlier output; bytes to be copied are read here too. The second pass
/// encodes and writes. Nothing is written until every lookup is done, so a
/// copy never picks up a file that this run has already replaced.
pub fn compress_paths_with_backend<B: ImageBackend>(
    backend: &B,
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &BatchConfig,
    use_cache: bool,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    let jobs = plan_jobs(inputs, output_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let manifest = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };
    let params_hash = hash_request_params(&config.request);

    tracing::debug!("Compressing {} files into {}", jobs.len(), output_dir.display());

    let steps: Vec<Result<Step, BatchError>> = jobs
        .par_iter()
        .map(|job| plan_step(job, &manifest, &params_hash, output_dir))
        .collect();

    let manifest = Mutex::new(manifest);
    let stats = Mutex::new(CacheStats::default());
    let shared = JobContext {
        output_dir,
        request: &config.request,
        params_hash,
        manifest: &manifest,
        stats: &stats,
    };

    let outcomes: Vec<BatchEvent> = jobs
        .par_iter()
        .zip(steps)
        .enumerate()
        .map(|(index, (job, step))| {
            let status = match step.and_then(|step| run_step(backend, job, step, &shared)) {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!("{}: {}", job.source.display(), e);
                    FileStatus::Failed(e.to_string())
                }
            };
            let event = BatchEvent {
                index,
                source: job.source.clone(),
                output: job.output.clone(),
                status,
            };
            if let Some(tx) = &events {
                // Receiver gone means nobody is listening; the result still counts
                let _ = tx.send(event.clone());
            }
            event
        })
        .collect();

    let manifest = manifest.into_inner().unwrap_or_else(PoisonError::into_inner);
    manifest.save(output_dir)?;

    Ok(BatchResult {
        outcomes,
        cache_stats: stats.into_inner().unwrap_or_else(PoisonError::into_inner),
    })
}

/// What a job does in the write pass.
enum Step {
    /// The job's own output is current.
    Reuse,
    /// Same content was written under another name; these are its bytes.
    Copy { encoded: Vec<u8>, source_hash: String },
    Encode,
}

struct JobContext<'a> {
    output_dir: &'a Path,
    request: &'a CompressionRequest,
    params_hash: String,
    manifest: &'a Mutex<CacheManifest>,
    stats: &'a Mutex<CacheStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn output_key(job: &Job) -> String {
    job.output.to_string_lossy().replace('\\', "/")
}

fn plan_step(
    job: &Job,
    manifest: &CacheManifest,
    params_hash: &str,
    output_dir: &Path,
) -> Result<Step, BatchError> {
    let source_hash = hash_bytes(&std::fs::read(&job.source)?);
    match manifest.find_cached(&source_hash, params_hash, output_dir) {
        Some(stored) if stored == output_key(job) => Ok(Step::Reuse),
        Some(stored) => Ok(Step::Copy {
            encoded: std::fs::read(output_dir.join(&stored))?,
            source_hash,
        }),
        None => Ok(Step::Encode),
    }
}

fn run_step<B: ImageBackend>(
    backend: &B,
    job: &Job,
    step: Step,
    ctx: &JobContext<'_>,
) -> Result<FileStatus, BatchError> {
    let output_path = ctx.output_dir.join(&job.output);

    match step {
        Step::Reuse => {
            lock(ctx.stats).hit();
            Ok(FileStatus::Cached)
        }
        Step::Copy {
            encoded,
            source_hash,
        } => {
            create_parent(&output_path)?;
            std::fs::write(&output_path, &encoded)?;
            lock(ctx.manifest).insert(output_key(job), source_hash, ctx.params_hash.clone());
            lock(ctx.stats).copy();
            Ok(FileStatus::Copied)
        }
        Step::Encode => {
            let bytes = std::fs::read(&job.source)?;
            let result = compress_to_webp(backend, &bytes, ctx.request)?;
            create_parent(&output_path)?;
            std::fs::write(&output_path, &result.bytes)?;

            lock(ctx.manifest).insert(output_key(job), hash_bytes(&bytes), ctx.params_hash.clone());
            lock(ctx.stats).miss();
            Ok(FileStatus::Compressed(CompressedFile::from(&result)))
        }
    }
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent),
        None => Ok(()),
    }
}
