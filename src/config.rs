//! Configuration types for background replacement operations

use crate::color::BackgroundColor;
use crate::error::{BgSwapError, Result};
use crate::models::ModelSpec;
use std::path::Path;

/// Output image format options, sniffed from the output path's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG (alpha-capable, lossless)
    Png,
    /// JPEG (no alpha channel; composite is flattened to RGB)
    Jpeg,
    /// WebP (alpha-capable)
    WebP,
    /// BMP (no alpha channel; composite is flattened to RGB)
    Bmp,
    /// TIFF (alpha-capable, lossless)
    Tiff,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl OutputFormat {
    /// Determine the output format from a path's extension.
    ///
    /// A path without an extension defaults to PNG. An extension the tool
    /// cannot encode is an error surfaced before any processing starts.
    ///
    /// # Errors
    /// - `UnsupportedFormat` for extensions outside PNG/JPEG/WebP/BMP/TIFF
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return Ok(Self::Png);
        };

        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(BgSwapError::unsupported_format(format!(
                "cannot encode '.{other}' output (use png, jpg, webp, bmp or tiff)"
            ))),
        }
    }

    /// Whether the encoded file can carry an alpha channel
    #[must_use]
    pub fn supports_alpha(self) -> bool {
        match self {
            Self::Png | Self::WebP | Self::Tiff => true,
            Self::Jpeg | Self::Bmp => false,
        }
    }

    /// The matching `image` crate format
    #[must_use]
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// Configuration for one background replacement invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementConfig {
    /// Solid color the background is replaced with
    pub color: BackgroundColor,

    /// Output format (from the output path's extension)
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Segmentation model specification
    pub model_spec: ModelSpec,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            color: BackgroundColor::WHITE,
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            model_spec: ModelSpec::default(),
        }
    }
}

impl ReplacementConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> ReplacementConfigBuilder {
        ReplacementConfigBuilder::default()
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    /// - JPEG quality outside 0-100
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(BgSwapError::invalid_config(format!(
                "JPEG quality {} out of range (valid: 0-100)",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Builder for [`ReplacementConfig`]
#[derive(Debug, Default)]
pub struct ReplacementConfigBuilder {
    config: ReplacementConfig,
}

impl ReplacementConfigBuilder {
    /// Set the replacement background color
    #[must_use]
    pub fn color(mut self, color: BackgroundColor) -> Self {
        self.config.color = color;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality (values above 100 are clamped)
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Set the segmentation model specification
    #[must_use]
    pub fn model_spec(mut self, model_spec: ModelSpec) -> Self {
        self.config.model_spec = model_spec;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any validation failure from [`ReplacementConfig::validate`]
    pub fn build(self) -> Result<ReplacementConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("out.png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path("out.JPG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path("out.jpeg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path("out.webp").unwrap(), OutputFormat::WebP);
        assert_eq!(OutputFormat::from_path("out.tif").unwrap(), OutputFormat::Tiff);
        assert_eq!(OutputFormat::from_path("out.bmp").unwrap(), OutputFormat::Bmp);
    }

    #[test]
    fn test_format_from_path_defaults_and_errors() {
        // No extension: default to PNG
        assert_eq!(OutputFormat::from_path("plain").unwrap(), OutputFormat::Png);

        // Unknown extension: refused up front, not at encode time
        let err = OutputFormat::from_path("out.xyz").unwrap_err();
        assert!(matches!(err, BgSwapError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_alpha_support() {
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::WebP.supports_alpha());
        assert!(OutputFormat::Tiff.supports_alpha());
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(!OutputFormat::Bmp.supports_alpha());
    }

    #[test]
    fn test_default_config() {
        let config = ReplacementConfig::default();
        assert_eq!(config.color, BackgroundColor::WHITE);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.jpeg_quality, 90);
    }

    #[test]
    fn test_builder_chaining_and_clamping() {
        let config = ReplacementConfig::builder()
            .color(BackgroundColor::BLUE)
            .output_format(OutputFormat::Jpeg)
            .jpeg_quality(150)
            .build()
            .unwrap();

        assert_eq!(config.color, BackgroundColor::BLUE);
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.jpeg_quality, 100);
    }

    #[test]
    fn test_validation_rejects_bad_quality() {
        let mut config = ReplacementConfig::default();
        assert!(config.validate().is_ok());

        config.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }
}
