//! Output format conversion
//!
//! Keeps the alpha-channel decision out of the compositor: alpha-capable
//! targets keep the (already opaque) RGBA buffer, the JPEG family is
//! flattened to RGB.

use crate::config::OutputFormat;
use image::{DynamicImage, ImageBuffer, Rgb, RgbaImage};

/// Conversion of composited RGBA buffers into their output representation
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert a composited RGBA image into the representation the target
    /// format encodes. Formats without alpha support get the alpha channel
    /// dropped; compositing already made the image fully opaque, so no
    /// information is lost.
    #[must_use]
    pub fn convert_format(rgba: RgbaImage, format: OutputFormat) -> DynamicImage {
        if format.supports_alpha() {
            return DynamicImage::ImageRgba8(rgba);
        }

        let (width, height) = rgba.dimensions();
        let mut rgb: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            rgb.put_pixel(x, y, Rgb([pixel[0], pixel[1], pixel[2]]));
        }
        DynamicImage::ImageRgb8(rgb)
    }
}
