//! End-to-end pipeline tests over the mock inference backend
//!
//! These exercise the full load → segment → composite → encode path with a
//! deterministic matte, so every assertion is exact.

use bgswap::backends::MockBackend;
use bgswap::{
    BackgroundColor, BackgroundReplacer, OutputFormat, ReplacementConfig,
};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::path::Path;

const MOCK_TARGET: u32 = 64;

fn replacer(
    backend: MockBackend,
    color: BackgroundColor,
    format: OutputFormat,
) -> BackgroundReplacer {
    let config = ReplacementConfig::builder()
        .color(color)
        .output_format(format)
        .build()
        .expect("valid config");
    BackgroundReplacer::with_backend(config, Box::new(backend)).expect("replacer")
}

fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8])
    }))
}

fn save_fixture(dir: &Path, name: &str, image: &DynamicImage) -> std::path::PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("write fixture");
    path
}

#[test]
fn all_background_matte_yields_uniform_color() {
    let color = BackgroundColor::new(0, 0, 255);
    let mut replacer = replacer(MockBackend::constant(MOCK_TARGET, 0.0), color, OutputFormat::Png);

    let result = replacer.process_image(&gradient_image(20, 15)).unwrap();
    let rgba = result.image.to_rgba8();
    assert!(rgba.pixels().all(|p| p.0 == [0, 0, 255, 255]));
}

#[test]
fn all_foreground_matte_preserves_source_rgb_exactly() {
    let source = gradient_image(20, 15);
    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 1.0),
        BackgroundColor::RED,
        OutputFormat::Png,
    );

    let result = replacer.process_image(&source).unwrap();
    let out = result.image.to_rgba8();
    let original = source.to_rgba8();
    for (expected, actual) in original.pixels().zip(out.pixels()) {
        assert_eq!(&expected.0[..3], &actual.0[..3]);
        assert_eq!(actual.0[3], 255);
    }
}

#[test]
fn every_palette_color_paints_a_fully_background_image() {
    for &(_, color) in bgswap::PALETTE {
        let mut replacer = replacer(
            MockBackend::constant(MOCK_TARGET, 0.0),
            color,
            OutputFormat::Png,
        );
        let result = replacer.process_image(&gradient_image(8, 8)).unwrap();
        let expected = [color.r, color.g, color.b, 255];
        assert!(
            result.image.to_rgba8().pixels().all(|p| p.0 == expected),
            "color {color}"
        );
    }
}

#[test]
fn output_dimensions_always_match_input() {
    for (w, h) in [(1, 1), (7, 3), (33, 64), (100, 41)] {
        let mut replacer = replacer(
            MockBackend::constant(MOCK_TARGET, 0.5),
            BackgroundColor::WHITE,
            OutputFormat::Png,
        );
        let result = replacer.process_image(&gradient_image(w, h)).unwrap();
        assert_eq!(result.dimensions(), (w, h));
    }
}

#[test]
fn checkerboard_matte_blends_per_pixel() {
    // 2x2 source, 64-cell tensor with 32-cell blocks: each source pixel
    // lands on its own block. Matte [255, 0, 0, 255] against blue.
    let source = gradient_image(2, 2);
    let blue = BackgroundColor::new(0, 0, 255);
    let mut replacer = replacer(MockBackend::checkerboard(MOCK_TARGET, 32), blue, OutputFormat::Png);

    let result = replacer.process_image(&source).unwrap();
    assert_eq!(result.matte.data, vec![255, 0, 0, 255]);

    let out = result.image.to_rgba8();
    let original = source.to_rgba8();
    // Pixels 1 and 4 keep original RGB
    assert_eq!(&out.get_pixel(0, 0).0[..3], &original.get_pixel(0, 0).0[..3]);
    assert_eq!(&out.get_pixel(1, 1).0[..3], &original.get_pixel(1, 1).0[..3]);
    // Pixels 2 and 3 become exactly blue
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 255, 255]);
    assert_eq!(out.get_pixel(0, 1).0, [0, 0, 255, 255]);
}

#[test]
fn replacing_an_already_replaced_background_is_a_no_op() {
    let color = BackgroundColor::new(40, 80, 120);
    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 0.0),
        color,
        OutputFormat::Png,
    );

    let first = replacer.process_image(&gradient_image(10, 10)).unwrap();
    let second = replacer.process_image(&first.image).unwrap();
    assert_eq!(first.image.to_rgba8(), second.image.to_rgba8());
}

#[test]
fn jpg_output_file_has_no_alpha_channel() {
    let dir = tempfile::tempdir().unwrap();
    let input = save_fixture(dir.path(), "input.png", &gradient_image(12, 12));
    let output = dir.path().join("result.jpg");

    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 0.0),
        BackgroundColor::GREEN,
        OutputFormat::Jpeg,
    );
    replacer.replace_and_save(&input, &output).unwrap();

    let saved = image::open(&output).unwrap();
    assert!(!saved.color().has_alpha());
    assert_eq!((saved.width(), saved.height()), (12, 12));
}

#[test]
fn png_output_file_is_uniformly_opaque() {
    let dir = tempfile::tempdir().unwrap();
    let input = save_fixture(dir.path(), "input.png", &gradient_image(12, 12));
    let output = dir.path().join("result.png");

    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 0.5),
        BackgroundColor::BLACK,
        OutputFormat::Png,
    );
    replacer.replace_and_save(&input, &output).unwrap();

    let saved = image::open(&output).unwrap().to_rgba8();
    assert!(saved.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn file_round_trip_records_timings() {
    let dir = tempfile::tempdir().unwrap();
    let input = save_fixture(dir.path(), "input.png", &gradient_image(16, 16));
    let output = dir.path().join("out.png");

    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 1.0),
        BackgroundColor::WHITE,
        OutputFormat::Png,
    );
    let result = replacer.replace_and_save(&input, &output).unwrap();

    assert!(output.is_file());
    assert!(result.timings().encode_ms.is_some());
    assert_eq!(result.metadata.model_name, "mock-segmenter");
}

#[test]
fn missing_input_is_an_error_not_a_panic() {
    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 1.0),
        BackgroundColor::WHITE,
        OutputFormat::Png,
    );
    let err = replacer.process_file("/no/such/image.png").unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn rgba_source_with_existing_alpha_is_flattened_by_matte() {
    // The matte overrides any alpha already present in the source
    let source = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
        5,
        5,
        image::Rgba([200, 100, 50, 20]),
    ));
    let mut replacer = replacer(
        MockBackend::constant(MOCK_TARGET, 1.0),
        BackgroundColor::BLUE,
        OutputFormat::Png,
    );

    let result = replacer.process_image(&source).unwrap();
    assert!(result
        .image
        .to_rgba8()
        .pixels()
        .all(|p| p.0 == [200, 100, 50, 255]));
}
