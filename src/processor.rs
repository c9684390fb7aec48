//! Background replacement orchestration
//!
//! Sequential, single-threaded pipeline: load, segment, composite, convert,
//! encode. Each invocation owns its buffers exclusively from load to save;
//! nothing is shared and nothing is retried.

use crate::compositor;
use crate::config::ReplacementConfig;
use crate::error::{BgSwapError, Result};
use crate::inference::InferenceBackend;
use crate::segmenter::Segmenter;
use crate::services::{ImageIoService, OutputFormatHandler};
use crate::types::{ProcessingTimings, ReplacementMetadata, ReplacementResult};
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// One-shot background replacer: segments an image and composites the
/// foreground over the configured solid color.
#[derive(Debug)]
pub struct BackgroundReplacer {
    config: ReplacementConfig,
    segmenter: Segmenter,
}

impl BackgroundReplacer {
    /// Create a replacer over the default inference backend
    ///
    /// # Errors
    /// - Invalid configuration
    #[cfg(feature = "tract")]
    pub fn new(config: ReplacementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter: Segmenter::with_default_backend(),
        })
    }

    /// Create a replacer over an explicit inference backend (the seam for
    /// swapping models and for exercising the pipeline in tests)
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn with_backend(
        config: ReplacementConfig,
        backend: Box<dyn InferenceBackend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter: Segmenter::new(backend),
        })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ReplacementConfig {
        &self.config
    }

    /// Replace the background of an image file and return the composited
    /// result without saving it.
    ///
    /// # Errors
    /// - Input path missing or undecodable
    /// - Segmentation failures
    pub fn process_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<ReplacementResult> {
        let input_path = input_path.as_ref();

        let decode_start = Instant::now();
        let image = ImageIoService::load_image(input_path)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        debug!(
            path = %input_path.display(),
            width = image.width(),
            height = image.height(),
            "decoded input image"
        );

        let mut result = self.process_image(&image)?;
        result.metadata.timings.decode_ms = decode_ms;
        result.metadata.timings.total_ms += decode_ms;
        Ok(result)
    }

    /// Replace the background of an in-memory image.
    ///
    /// # Errors
    /// - Segmentation failures
    /// - Matte/image dimension mismatches
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<ReplacementResult> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::default();
        let original_dimensions = (image.width(), image.height());

        if original_dimensions.0 == 0 || original_dimensions.1 == 0 {
            return Err(BgSwapError::processing("input image has zero dimensions"));
        }

        // Model loading happens on the first invocation only
        if let Some(load_time) = self.segmenter.initialize(&self.config)? {
            timings.model_load_ms = load_time.as_millis() as u64;
        }

        info!(
            model = %self.segmenter.model_name(),
            color = %self.config.color,
            "replacing background"
        );

        let inference_start = Instant::now();
        let matte = self.segmenter.matte(image, &self.config)?;
        let segmented = matte.apply(image)?;
        timings.inference_ms = inference_start.elapsed().as_millis() as u64;

        debug!(
            foreground_ratio = matte.foreground_ratio(),
            "matte computed"
        );

        let composite_start = Instant::now();
        let composited = compositor::composite_over_color(&segmented, self.config.color);
        let final_image =
            OutputFormatHandler::convert_format(composited, self.config.output_format);
        timings.composite_ms = composite_start.elapsed().as_millis() as u64;

        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let mut metadata = ReplacementMetadata::new(self.segmenter.model_name());
        metadata.timings = timings;

        Ok(ReplacementResult::new(
            final_image,
            matte,
            original_dimensions,
            metadata,
        ))
    }

    /// Replace the background of `input_path` and write the composite to
    /// `output_path` in the configured format.
    ///
    /// # Errors
    /// - Any processing failure
    /// - Output path unwritable or encoder failure
    pub fn replace_and_save<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
    ) -> Result<ReplacementResult> {
        let output_path = output_path.as_ref();
        let mut result = self.process_file(input_path)?;

        let encode_start = Instant::now();
        ImageIoService::save_image(
            output_path,
            &result.image,
            self.config.output_format,
            self.config.jpeg_quality,
        )?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;
        result.metadata.timings.encode_ms = Some(encode_ms);
        result.metadata.timings.total_ms += encode_ms;

        info!(
            path = %output_path.display(),
            total_ms = result.metadata.timings.total_ms,
            "saved composited image"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;
    use crate::color::BackgroundColor;
    use crate::config::OutputFormat;
    use image::{ImageBuffer, Rgb};

    fn replacer_with(
        backend: MockBackend,
        color: BackgroundColor,
        format: OutputFormat,
    ) -> BackgroundReplacer {
        let config = ReplacementConfig::builder()
            .color(color)
            .output_format(format)
            .build()
            .unwrap();
        BackgroundReplacer::with_backend(config, Box::new(backend)).unwrap()
    }

    fn plain_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn test_all_background_yields_uniform_color() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 0.0),
            BackgroundColor::new(0, 0, 255),
            OutputFormat::Png,
        );

        let result = replacer.process_image(&plain_image(6, 6, [50, 50, 50])).unwrap();
        let rgba = result.image.to_rgba8();
        assert!(rgba.pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn test_all_foreground_preserves_source() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 1.0),
            BackgroundColor::RED,
            OutputFormat::Png,
        );

        let result = replacer.process_image(&plain_image(6, 6, [12, 34, 56])).unwrap();
        let rgba = result.image.to_rgba8();
        assert!(rgba.pixels().all(|p| p.0 == [12, 34, 56, 255]));
    }

    #[test]
    fn test_dimensions_preserved() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 0.5),
            BackgroundColor::WHITE,
            OutputFormat::Png,
        );

        let result = replacer.process_image(&plain_image(17, 9, [0, 0, 0])).unwrap();
        assert_eq!(result.dimensions(), (17, 9));
        assert_eq!(result.original_dimensions, (17, 9));
    }

    #[test]
    fn test_jpeg_output_has_no_alpha() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 0.0),
            BackgroundColor::WHITE,
            OutputFormat::Jpeg,
        );

        let result = replacer.process_image(&plain_image(4, 4, [1, 2, 3])).unwrap();
        assert!(matches!(result.image, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_metadata_carries_model_name() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 1.0),
            BackgroundColor::WHITE,
            OutputFormat::Png,
        );

        let result = replacer.process_image(&plain_image(4, 4, [0, 0, 0])).unwrap();
        assert_eq!(result.metadata.model_name, "mock-segmenter");
    }

    #[test]
    fn test_missing_input_file_fails() {
        let mut replacer = replacer_with(
            MockBackend::constant(32, 1.0),
            BackgroundColor::WHITE,
            OutputFormat::Png,
        );

        assert!(replacer.process_file("/no/such/input.png").is_err());
    }
}
