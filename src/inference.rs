//! Inference backend abstraction

use crate::config::ReplacementConfig;
use crate::error::Result;
use crate::models::{ModelInfo, PreprocessingConfig};
use ndarray::Array4;

// Use instant for cross-platform time compatibility
use instant::Duration;

/// Trait for segmentation inference backends.
///
/// A backend consumes a normalized NCHW image tensor and produces a
/// single-channel foreground-confidence tensor of the model's square size.
/// Everything before and after (resizing, normalization, matte extraction)
/// is backend-independent and lives in [`crate::segmenter`].
pub trait InferenceBackend {
    /// Initialize the backend, loading the model if necessary.
    ///
    /// Returns the model loading time on a cold start, `None` when the
    /// backend was already initialized.
    ///
    /// # Errors
    /// - Model resolution or parsing failures
    fn initialize(&mut self, config: &ReplacementConfig) -> Result<Option<Duration>>;

    /// Run inference on the input tensor (1x3xSxS in, 1x1xSxS out)
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Inference execution failures or malformed model output
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Preprocessing parameters the loaded model expects
    ///
    /// # Errors
    /// - Model metadata unavailable
    fn preprocessing_config(&self) -> Result<PreprocessingConfig>;

    /// Information about the loaded model
    ///
    /// # Errors
    /// - Model metadata unavailable
    fn model_info(&self) -> Result<ModelInfo>;

    /// Whether the backend has been initialized
    fn is_initialized(&self) -> bool;
}
