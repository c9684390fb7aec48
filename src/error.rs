//! Error types for background replacement operations

use thiserror::Error;

/// Result type alias for background replacement operations
pub type Result<T> = std::result::Result<T, BgSwapError>;

/// Error types for background replacement operations
#[derive(Error, Debug)]
pub enum BgSwapError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Model loading or initialization errors
    #[error("Model error: {0}")]
    Model(String),

    /// Segmentation inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// Network errors while fetching model files
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported output format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Pixel processing or compositing errors
    #[error("Processing error: {0}")]
    Processing(String),
}

impl BgSwapError {
    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a network error with operation context
    pub fn network_error(operation: &str, error: &reqwest::Error) -> Self {
        Self::Network(format!("{operation}: {error}"))
    }

    /// Create a file I/O error with operation and path context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path.as_ref().display(), error),
        ))
    }

    /// Create an image loading error with path context
    pub fn image_load_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        Self::Image(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Failed to load image '{}': {}. Supported formats: PNG, JPEG, BMP, TIFF, WebP",
                path.as_ref().display(),
                error
            ),
        )))
    }

    /// Create an image writing error with path context
    pub fn image_write_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        Self::Image(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to write image '{}': {}", path.as_ref().display(), error),
        )))
    }
}
