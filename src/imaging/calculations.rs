//! Pure calculation functions for image dimensions and sizes.
//!
//! All functions here are pure and testable without any I/O or images.

/// Clamp dimensions so the longer edge is at most `max_dimension`.
///
/// Images already within bounds are returned unchanged (no upscaling).
/// Otherwise the longer edge becomes exactly `max_dimension` and the shorter
/// edge scales proportionally, rounded to the nearest pixel.
///
/// # Examples
/// ```
/// # use webp_budget::imaging::clamp_to_max_dimension;
/// // 4000x3000 landscape → 1400x1050
/// assert_eq!(clamp_to_max_dimension((4000, 3000), 1400), (1400, 1050));
///
/// // Already small enough → unchanged
/// assert_eq!(clamp_to_max_dimension((800, 600), 1400), (800, 600));
/// ```
pub fn clamp_to_max_dimension(original: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (w, h) = original;
    if w <= max_dimension && h <= max_dimension {
        return original;
    }

    if w >= h {
        // Landscape or square: width is the longer edge
        let scaled = (h as f64 * max_dimension as f64 / w as f64).round() as u32;
        (max_dimension, scaled.max(1))
    } else {
        // Portrait
        let scaled = (w as f64 * max_dimension as f64 / h as f64).round() as u32;
        (scaled.max(1), max_dimension)
    }
}

/// Shrink dimensions proportionally to `percent` of their current size.
///
/// Each side is rounded independently and never drops below one pixel.
pub fn scale_dimensions(dims: (u32, u32), percent: u32) -> (u32, u32) {
    let scale = |side: u32| ((side as f64 * percent as f64 / 100.0).round() as u32).max(1);
    (scale(dims.0), scale(dims.1))
}

/// Percentages tried by the dimension fallback, largest first.
///
/// `step_percent = 5, max_attempts = 5` gives `[95, 90, 85, 80, 75]`.
/// The sequence stops early rather than reaching zero.
pub fn fallback_scales(step_percent: u32, max_attempts: u32) -> Vec<u32> {
    if step_percent == 0 {
        return Vec::new();
    }
    (1..=max_attempts)
        .map_while(|attempt| 100u32.checked_sub(step_percent * attempt))
        .take_while(|&percent| percent > 0)
        .collect()
}

/// Convert a byte count to kilobytes (1 KB = 1024 bytes).
pub fn size_in_kb(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}
