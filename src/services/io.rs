//! Image loading and saving

use crate::config::OutputFormat;
use crate::error::{BgSwapError, Result};
use image::DynamicImage;
use std::path::Path;

/// Filesystem image I/O with contextual errors
pub struct ImageIoService;

impl ImageIoService {
    /// Load and decode an image file.
    ///
    /// # Errors
    /// - Path does not reference an existing file
    /// - File exists but cannot be decoded as an image
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BgSwapError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input image '{}' does not exist", path.display()),
            )));
        }

        image::open(path).map_err(|e| BgSwapError::image_load_error(path, &e))
    }

    /// Encode and write an image, creating parent directories as needed.
    ///
    /// # Errors
    /// - Parent directory cannot be created
    /// - Encoder failure or unwritable output path
    pub fn save_image<P: AsRef<Path>>(
        path: P,
        image: &DynamicImage,
        format: OutputFormat,
        jpeg_quality: u8,
    ) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BgSwapError::file_io_error("create output directory", parent, &e))?;
            }
        }

        match format {
            OutputFormat::Jpeg => {
                let file = std::fs::File::create(path)
                    .map_err(|e| BgSwapError::file_io_error("create output file", path, &e))?;
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(file, jpeg_quality);
                encoder
                    .encode_image(&image.to_rgb8())
                    .map_err(|e| BgSwapError::image_write_error(path, &e))?;
            },
            _ => {
                image
                    .save_with_format(path, format.to_image_format())
                    .map_err(|e| BgSwapError::image_write_error(path, &e))?;
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn small_rgba() -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(4, 4, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImageIoService::load_image("/no/such/image.png").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let err = ImageIoService::load_image(&path).unwrap_err();
        assert!(matches!(err, BgSwapError::Image(_)));
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        ImageIoService::save_image(&path, &small_rgba(), OutputFormat::Png, 90).unwrap();
        let reloaded = ImageIoService::load_image(&path).unwrap();
        assert_eq!(reloaded.width(), 4);
        assert_eq!(reloaded.to_rgba8().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.png");

        ImageIoService::save_image(&path, &small_rgba(), OutputFormat::Png, 90).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_save_jpeg_is_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");

        // RGBA input goes through the quality-aware JPEG encoder as RGB
        ImageIoService::save_image(&path, &small_rgba(), OutputFormat::Jpeg, 85).unwrap();
        let reloaded = ImageIoService::load_image(&path).unwrap();
        assert!(matches!(reloaded, DynamicImage::ImageRgb8(_)));
    }
}
