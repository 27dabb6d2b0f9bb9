//! End-to-end behaviour of the compressor through the public API, using real
//! encoders on synthetic images.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;
use webp_budget::batch::{BatchConfig, FileStatus, compress_paths};
use webp_budget::imaging::{
    BackendError, CompressionRequest, ImageBackend, Quality, RustBackend, SearchProfile, Stage,
    TargetSize, compress_image_to_webp, compress_to_webp, is_webp,
};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) * 255 / (width + height)) as u8,
        ])
    }))
}

fn noise(width: u32, height: u32) -> DynamicImage {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        };
        Rgb([channel(), channel(), channel()])
    }))
}

/// Gradient with ripples and per-pixel grain, roughly what a phone photo of
/// a dish looks like to the encoder.
fn textured_photo(width: u32, height: u32) -> DynamicImage {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut grain = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % 13) as i32 - 6
    };
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let ripple = ((x as f32 / 17.0).sin() * (y as f32 / 23.0).cos() * 40.0) as i32;
        let base = [
            (x * 200 / width) as i32 + 30,
            (y * 180 / height) as i32 + 40,
            ((x + y) * 160 / (width + height)) as i32 + 50,
        ];
        let px = |b: i32, g: i32| (b + ripple + g).clamp(0, 255) as u8;
        Rgb([px(base[0], grain()), px(base[1], grain()), px(base[2], grain())])
    }))
}

fn logo_with_alpha(size: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(size, size, |x, y| {
        if x < size / 2 && y < size / 2 {
            Rgba([20, 120, 220, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => image.clone(),
    };
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn decoded(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

// =========================================================================
// Dimension clamp
// =========================================================================

#[test]
fn large_portrait_is_clamped_on_longer_edge() {
    let png = encode(&gradient(1000, 3000), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 200).unwrap();

    assert_eq!((result.width, result.height), (467, 1400));
    assert_eq!(decoded(&result.bytes).dimensions(), (467, 1400));
}

#[test]
fn small_image_is_never_upscaled() {
    let png = encode(&gradient(300, 200), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 200).unwrap();

    assert_eq!(decoded(&result.bytes).dimensions(), (300, 200));
}

#[test]
fn custom_max_dimension() {
    let png = encode(&gradient(1600, 800), ImageFormat::Png);
    let request = CompressionRequest::new(TargetSize::from_kb(200)).max_dimension(800);
    let result = compress_to_webp(&RustBackend::new(), &png, &request).unwrap();

    assert_eq!((result.width, result.height), (800, 400));
}

// =========================================================================
// Output format
// =========================================================================

#[test]
fn jpeg_png_and_gif_all_become_webp() {
    let source = gradient(120, 80);
    for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif] {
        let input = encode(&source, format);
        let result = compress_image_to_webp(&input, 200).unwrap();
        assert!(is_webp(&result.bytes), "{format:?} input did not produce WebP");
        assert_eq!(
            image::guess_format(&result.bytes).unwrap(),
            ImageFormat::WebP
        );
    }
}

// =========================================================================
// Budget
// =========================================================================

#[test]
fn smooth_photo_meets_default_budget() {
    let png = encode(&gradient(3000, 2000), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 200).unwrap();

    assert!(result.target_met);
    assert!(result.bytes.len() <= 200 * 1024);
    assert_eq!(result.stage, Stage::QualitySearch);
    assert_eq!((result.width, result.height), (1400, 933));
}

#[test]
fn detailed_photo_meets_default_budget() {
    let png = encode(&textured_photo(3000, 2000), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 200).unwrap();

    assert!(result.target_met);
    assert!(result.bytes.len() <= 200 * 1024);
    assert_eq!(decoded(&result.bytes).dimensions(), (result.width, result.height));
    assert!(result.width <= 1400 && result.height <= 1400);
}

#[test]
fn textured_photo_steps_down_until_it_fits() {
    let backend = RustBackend::new();
    let photo = textured_photo(1400, 933);
    let first_try = backend.encode_webp(&photo, Quality::new(95)).unwrap();

    // Two thirds of what the first attempt produces: q95 can never be the answer
    let target = TargetSize::from_bytes(first_try.len() as u64 * 2 / 3);
    let png = encode(&photo, ImageFormat::Png);
    let result = compress_to_webp(&backend, &png, &CompressionRequest::new(target)).unwrap();

    assert!(result.target_met);
    assert!(target.is_met_by(result.bytes.len()));
    assert_ne!(result.quality, Some(Quality::new(95)));
    assert_ne!(result.stage, Stage::Passthrough);
    assert!(result.bytes.len() < first_try.len());
}

#[test]
fn impossible_budget_returns_best_effort() {
    let png = encode(&noise(400, 400), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 1).unwrap();

    assert!(!result.target_met);
    assert!(is_webp(&result.bytes));
    let (w, h) = decoded(&result.bytes).dimensions();
    assert!(w > 0 && h > 0 && w <= 400 && h <= 400);
}

#[test]
fn aggressive_profile_never_shrinks() {
    let png = encode(&noise(300, 300), ImageFormat::Png);
    let request = CompressionRequest::with_profile(TargetSize::from_kb(1), SearchProfile::Aggressive);
    let result = compress_to_webp(&RustBackend::new(), &png, &request).unwrap();

    assert!(!result.target_met);
    assert_eq!(result.stage, Stage::QualitySearch);
    assert_eq!((result.width, result.height), (300, 300));
}

// =========================================================================
// Transparency
// =========================================================================

#[test]
fn png_transparency_survives() {
    let png = encode(&logo_with_alpha(128), ImageFormat::Png);
    let result = compress_image_to_webp(&png, 200).unwrap();

    let rgba = decoded(&result.bytes).to_rgba8();
    assert!(rgba.pixels().any(|p| p[3] < 255));
    assert!(rgba.pixels().any(|p| p[3] == 255));
}

// =========================================================================
// Idempotence
// =========================================================================

#[test]
fn recompressing_output_does_not_grow() {
    let png = encode(&gradient(2000, 1500), ImageFormat::Png);
    let first = compress_image_to_webp(&png, 200).unwrap();
    let second = compress_image_to_webp(&first.bytes, 200).unwrap();

    assert!(second.bytes.len() <= first.bytes.len());
    assert_eq!((second.width, second.height), (first.width, first.height));
    assert_eq!(second.stage, Stage::Passthrough);
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn non_image_bytes_fail_to_decode() {
    let result = compress_image_to_webp(b"%PDF-1.7 definitely not an image", 200);
    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[test]
fn empty_input_fails_to_decode() {
    assert!(matches!(
        compress_image_to_webp(&[], 200),
        Err(BackendError::Decode(_))
    ));
}

// =========================================================================
// Batch
// =========================================================================

#[test]
fn batch_compresses_a_directory_tree() {
    let tmp = TempDir::new().unwrap();
    let uploads = tmp.path().join("uploads");
    std::fs::create_dir_all(uploads.join("menu")).unwrap();
    std::fs::write(
        uploads.join("logo.png"),
        encode(&logo_with_alpha(64), ImageFormat::Png),
    )
    .unwrap();
    std::fs::write(
        uploads.join("menu/burger.jpg"),
        encode(&gradient(200, 150), ImageFormat::Jpeg),
    )
    .unwrap();
    std::fs::write(uploads.join("menu/broken.png"), b"nope").unwrap();
    let out = tmp.path().join("out");

    let result = compress_paths(
        &[uploads],
        &out,
        &BatchConfig::default(),
        true,
        None,
    )
    .unwrap();

    assert_eq!(result.compressed(), 2);
    assert_eq!(result.failed(), 1);
    assert!(is_webp(&std::fs::read(out.join("logo.webp")).unwrap()));
    assert!(is_webp(&std::fs::read(out.join("menu/burger.webp")).unwrap()));

    let failed: Vec<&PathBuf> = result
        .outcomes
        .iter()
        .filter(|e| matches!(e.status, FileStatus::Failed(_)))
        .map(|e| &e.output)
        .collect();
    assert_eq!(failed, vec![&PathBuf::from("menu/broken.webp")]);
}
