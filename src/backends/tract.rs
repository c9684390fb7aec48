//! Tract backend for segmentation model inference
//!
//! Tract is a pure Rust ONNX inference runtime: no C++ dependencies, no FFI
//! boundary, portable across platforms. CPU is its only execution provider,
//! which is all a one-shot interactive tool needs.

use crate::config::ReplacementConfig;
use crate::error::{BgSwapError, Result};
use crate::inference::InferenceBackend;
use crate::models::{ModelInfo, ModelManager, PreprocessingConfig};
use ndarray::Array4;
use tract_onnx::prelude::*;

/// Type alias for the runnable Tract model graph
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant for cross-platform time compatibility
use instant::{Duration, Instant};

/// Pure Rust inference backend for segmentation models
#[derive(Debug)]
pub struct TractBackend {
    model: Option<TractModel>,
    manager: Option<ModelManager>,
    initialized: bool,
}

impl TractBackend {
    /// Create an uninitialized backend; the model is resolved at
    /// [`InferenceBackend::initialize`] time from the configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            manager: None,
            initialized: false,
        }
    }

    /// Create a backend with a pre-resolved model manager
    #[must_use]
    pub fn with_model_manager(manager: ModelManager) -> Self {
        Self {
            model: None,
            manager: Some(manager),
            initialized: false,
        }
    }

    fn load_model(&mut self, config: &ReplacementConfig) -> Result<Duration> {
        let load_start = Instant::now();

        if self.manager.is_none() {
            self.manager = Some(ModelManager::from_spec(&config.model_spec)?);
        }
        let manager = self.manager.as_ref().ok_or_else(|| {
            BgSwapError::model("no model manager available for Tract backend")
        })?;

        let model_data = manager.load_model_data()?;
        let model_info = manager.model_info()?;

        log::info!(
            "loading model {} ({}, {:.1} MB) into Tract",
            model_info.name,
            model_info.precision,
            model_info.size_bytes as f64 / (1024.0 * 1024.0)
        );

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(model_data))
            .map_err(|e| BgSwapError::model(format!("failed to parse ONNX model: {e}")))?
            .into_optimized()
            .map_err(|e| BgSwapError::model(format!("failed to optimize model graph: {e}")))?
            .into_runnable()
            .map_err(|e| BgSwapError::model(format!("failed to make model runnable: {e}")))?;

        self.model = Some(model);
        self.initialized = true;

        let load_time = load_start.elapsed();
        log::info!("Tract backend ready in {}ms", load_time.as_millis());
        Ok(load_time)
    }
}

impl Default for TractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self, config: &ReplacementConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }
        self.load_model(config).map(Some)
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| BgSwapError::inference("Tract model not initialized"))?;

        log::debug!("running Tract inference on tensor {:?}", input.shape());
        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());
        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| BgSwapError::inference(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BgSwapError::inference("model produced no output tensor"))?
            .into_arc_tensor();

        let view = output_tensor
            .to_array_view::<f32>()
            .map_err(|e| BgSwapError::inference(format!("unexpected output tensor type: {e}")))?;

        let shape = view.shape();
        if shape.len() != 4 {
            return Err(BgSwapError::inference(format!(
                "expected 4D matte tensor, got {}D",
                shape.len()
            )));
        }

        let dims = (
            shape.first().copied().unwrap_or(1),
            shape.get(1).copied().unwrap_or(1),
            shape.get(2).copied().unwrap_or(0),
            shape.get(3).copied().unwrap_or(0),
        );
        let output = Array4::from_shape_vec(dims, view.to_owned().into_raw_vec_and_offset().0)
            .map_err(|e| BgSwapError::inference(format!("failed to reshape matte tensor: {e}")))?;

        log::debug!(
            "Tract inference completed in {}ms",
            inference_start.elapsed().as_millis()
        );
        Ok(output)
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        self.manager
            .as_ref()
            .ok_or_else(|| BgSwapError::model("model manager not initialized"))?
            .preprocessing_config()
    }

    fn model_info(&self) -> Result<ModelInfo> {
        self.manager
            .as_ref()
            .ok_or_else(|| BgSwapError::model("model manager not initialized"))?
            .model_info()
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelSource, ModelSpec};

    #[test]
    fn test_backend_starts_uninitialized() {
        let backend = TractBackend::new();
        assert!(!backend.is_initialized());
        assert!(backend.model_info().is_err());
        assert!(backend.preprocessing_config().is_err());
    }

    #[test]
    fn test_infer_without_model_fails() {
        let mut backend = TractBackend::new();
        let input = Array4::<f32>::zeros((1, 3, 8, 8));
        assert!(backend.infer(&input).is_err());
    }

    #[test]
    fn test_initialize_with_missing_model_fails_gracefully() {
        let mut backend = TractBackend::new();
        let config = ReplacementConfig {
            model_spec: ModelSpec {
                source: ModelSource::External("/no/such/model.onnx".into()),
                variant: None,
            },
            ..ReplacementConfig::default()
        };

        assert!(backend.initialize(&config).is_err());
        assert!(!backend.is_initialized());
    }
}
