//! Core types for background replacement operations

use crate::error::{BgSwapError, Result};
use image::{DynamicImage, ImageBuffer, Luma, Rgba, RgbaImage};

/// Per-pixel foreground confidence at the source image's dimensions.
///
/// 0 means pure background, 255 pure foreground; intermediate values occur
/// at soft edges such as hair or motion blur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMatte {
    /// Confidence values in row-major order (one byte per pixel)
    pub data: Vec<u8>,

    /// Matte dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl AlphaMatte {
    /// Create a matte from raw confidence values
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create a matte where every pixel carries the same confidence
    #[must_use]
    pub fn uniform(value: u8, dimensions: (u32, u32)) -> Self {
        let (width, height) = dimensions;
        Self::new(vec![value; (width * height) as usize], dimensions)
    }

    /// Create a matte from a grayscale image
    #[must_use]
    pub fn from_luma(image: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Self {
        Self::new(image.as_raw().clone(), image.dimensions())
    }

    /// Convert the matte to a grayscale image
    ///
    /// # Errors
    /// - Data length does not match the recorded dimensions
    pub fn to_luma(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            BgSwapError::processing("matte data length does not match its dimensions")
        })
    }

    /// Apply the matte to an image, producing the segmented RGBA image
    /// whose alpha channel encodes foreground opacity.
    ///
    /// # Errors
    /// - Image and matte dimensions differ
    pub fn apply(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let rgba = image.to_rgba8();
        if rgba.dimensions() != self.dimensions {
            return Err(BgSwapError::processing(format!(
                "image is {}x{} but matte is {}x{}",
                rgba.width(),
                rgba.height(),
                self.dimensions.0,
                self.dimensions.1
            )));
        }

        let (width, _) = self.dimensions;
        let mut out = RgbaImage::new(rgba.width(), rgba.height());
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let idx = (y * width + x) as usize;
            let alpha = self.data.get(idx).copied().unwrap_or(0);
            out.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        }
        Ok(out)
    }

    /// Fraction of pixels classified as foreground (confidence above 127)
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&v| v > 127).count();
        foreground as f32 / self.data.len() as f32
    }
}

/// Timing breakdown for one replacement invocation
#[derive(Debug, Clone, Default)]
pub struct ProcessingTimings {
    /// Image loading and decoding
    pub decode_ms: u64,

    /// Model loading (first invocation only)
    pub model_load_ms: u64,

    /// Segmentation inference (preprocess + infer + matte extraction)
    pub inference_ms: u64,

    /// Canvas compositing and format conversion
    pub composite_ms: u64,

    /// Final image encoding (when saving to a file)
    pub encode_ms: Option<u64>,

    /// Total end-to-end time
    pub total_ms: u64,
}

/// Metadata about one replacement invocation
#[derive(Debug, Clone)]
pub struct ReplacementMetadata {
    /// Display name of the segmentation model used
    pub model_name: String,

    /// Timing breakdown
    pub timings: ProcessingTimings,
}

impl ReplacementMetadata {
    /// Create metadata for the given model
    #[must_use]
    pub fn new(model_name: String) -> Self {
        Self {
            model_name,
            timings: ProcessingTimings::default(),
        }
    }
}

/// Result of a background replacement operation
#[derive(Debug, Clone)]
pub struct ReplacementResult {
    /// The composited image, fully opaque, in its output representation
    pub image: DynamicImage,

    /// The foreground matte the composite was built from
    pub matte: AlphaMatte,

    /// Source image dimensions (always equal to the output dimensions)
    pub original_dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: ReplacementMetadata,
}

impl ReplacementResult {
    /// Create a new replacement result
    #[must_use]
    pub fn new(
        image: DynamicImage,
        matte: AlphaMatte,
        original_dimensions: (u32, u32),
        metadata: ReplacementMetadata,
    ) -> Self {
        Self {
            image,
            matte,
            original_dimensions,
            metadata,
        }
    }

    /// Output image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Timing breakdown for this invocation
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }
}
