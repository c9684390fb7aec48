#![allow(clippy::uninlined_format_args)]

//! # bgswap
//!
//! Background replacement for images: segment the foreground with a
//! pretrained ONNX model and composite it over a solid color.
//!
//! The library is a thin, synchronous pipeline around two capabilities:
//! an inference runtime (Tract, pure Rust) behind the [`InferenceBackend`]
//! trait, and the `image` crate for decoding and encoding. The model is
//! downloaded from Hugging Face into an XDG cache on first use.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bgswap::{BackgroundColor, replace_background_from_path};
//!
//! # fn example() -> bgswap::Result<()> {
//! // Segments photo.jpg, paints the background blue, writes out.png
//! replace_background_from_path("photo.jpg", "out.png", BackgroundColor::BLUE)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom configuration
//!
//! ```rust,no_run
//! use bgswap::{
//!     BackgroundColor, BackgroundReplacer, ModelDownloader, ModelSource, ModelSpec,
//!     OutputFormat, ReplacementConfig, DEFAULT_MODEL_URL,
//! };
//!
//! # fn example() -> bgswap::Result<()> {
//! // One-time model download into the cache
//! let downloader = ModelDownloader::new()?;
//! let model_id = downloader.download_model(DEFAULT_MODEL_URL, true)?;
//!
//! let config = ReplacementConfig::builder()
//!     .color(BackgroundColor::new(255, 0, 0))
//!     .output_format(OutputFormat::Jpeg)
//!     .jpeg_quality(95)
//!     .model_spec(ModelSpec {
//!         source: ModelSource::Downloaded(model_id),
//!         variant: None,
//!     })
//!     .build()?;
//!
//! let mut replacer = BackgroundReplacer::new(config)?;
//! replacer.replace_and_save("photo.jpg", "photo_red.jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! The interactive console front end lives behind the `cli` feature; the
//! `tract` feature gates the inference runtime.

pub mod backends;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod compositor;
pub mod config;
pub mod download;
pub mod error;
pub mod inference;
pub mod models;
pub mod processor;
pub mod segmenter;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
#[cfg(feature = "tract")]
pub use backends::TractBackend;
pub use cache::{format_size, CachedModelInfo, ModelCache};
pub use color::{BackgroundColor, PALETTE};
pub use compositor::{composite_over_color, solid_canvas};
pub use config::{OutputFormat, ReplacementConfig, ReplacementConfigBuilder};
pub use download::ModelDownloader;
pub use error::{BgSwapError, Result};
pub use inference::InferenceBackend;
pub use models::{
    ModelInfo, ModelManager, ModelSource, ModelSpec, PreprocessingConfig, DEFAULT_MODEL_URL,
};
pub use processor::BackgroundReplacer;
pub use segmenter::Segmenter;
pub use services::{ImageIoService, OutputFormatHandler};
pub use types::{AlphaMatte, ProcessingTimings, ReplacementResult};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig};

/// Replace the background of an image file in one call.
///
/// Downloads the default model on first use, sniffs the output format from
/// `output_path`'s extension, and writes the composited image there.
///
/// # Errors
/// - Input missing or undecodable, model unavailable, or output unwritable
#[cfg(feature = "tract")]
pub fn replace_background_from_path<P, Q>(
    input_path: P,
    output_path: Q,
    color: BackgroundColor,
) -> Result<ReplacementResult>
where
    P: AsRef<std::path::Path>,
    Q: AsRef<std::path::Path>,
{
    let output_format = OutputFormat::from_path(output_path.as_ref())?;

    let downloader = ModelDownloader::new()?;
    let model_id = downloader.download_model(DEFAULT_MODEL_URL, false)?;

    let config = ReplacementConfig::builder()
        .color(color)
        .output_format(output_format)
        .model_spec(ModelSpec {
            source: ModelSource::Downloaded(model_id),
            variant: None,
        })
        .build()?;

    let mut replacer = BackgroundReplacer::new(config)?;
    replacer.replace_and_save(input_path, output_path)
}
