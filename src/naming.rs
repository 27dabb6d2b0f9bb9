//! Output naming for compressed files.
//!
//! A compressed file keeps its stem and swaps the extension for `.webp`:
//! `hero-banner.JPG` → `hero-banner.webp`. When a directory is compressed,
//! the sub-path below that directory is kept: compressing `menu/` sends
//! `menu/desserts/tiramisu.png` to `<output>/desserts/tiramisu.webp`.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};

/// `<stem>.webp` for a source path. Files without a stem become `image.webp`.
pub fn webp_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".into());
    format!("{stem}.webp")
}

/// Whether the path's extension has a decoder compiled in (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            supported_input_extensions().contains(&ext.as_str())
        })
}

/// Output path of `file` relative to the output directory.
///
/// `input_root` is the directory the user passed on the command line, or
/// `None` when the file itself was passed.
pub fn output_relative_path(input_root: Option<&Path>, file: &Path) -> PathBuf {
    let name = webp_file_name(file);
    let parent = input_root
        .and_then(|root| file.strip_prefix(root).ok())
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty());

    match parent {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
