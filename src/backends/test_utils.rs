//! Mock inference backend for tests
//!
//! Produces deterministic mattes without any model file, so the full
//! pipeline can be exercised offline and its output asserted pixel by
//! pixel.

use crate::config::ReplacementConfig;
use crate::error::{BgSwapError, Result};
use crate::inference::InferenceBackend;
use crate::models::{ModelInfo, PreprocessingConfig};
use ndarray::Array4;

// Use instant for cross-platform time compatibility
use instant::Duration;

/// Matte patterns the mock backend can produce
#[derive(Debug, Clone, Copy)]
enum MattePattern {
    /// Every tensor cell carries the same confidence
    Constant(f32),
    /// Alternating blocks of 1.0 and 0.0 confidence, `block` cells wide
    Checkerboard { block: usize },
}

/// Deterministic inference backend for tests
#[derive(Debug)]
pub struct MockBackend {
    target_size: u32,
    pattern: MattePattern,
    initialized: bool,
}

impl MockBackend {
    /// Backend whose matte is `confidence` everywhere
    #[must_use]
    pub fn constant(target_size: u32, confidence: f32) -> Self {
        Self {
            target_size,
            pattern: MattePattern::Constant(confidence),
            initialized: false,
        }
    }

    /// Backend producing a checkerboard matte with `block`-cell squares,
    /// starting with foreground at the origin
    #[must_use]
    pub fn checkerboard(target_size: u32, block: usize) -> Self {
        Self {
            target_size,
            pattern: MattePattern::Checkerboard { block: block.max(1) },
            initialized: false,
        }
    }

    fn value_at(&self, x: usize, y: usize) -> f32 {
        match self.pattern {
            MattePattern::Constant(confidence) => confidence,
            MattePattern::Checkerboard { block } => {
                if (x / block + y / block) % 2 == 0 {
                    1.0
                } else {
                    0.0
                }
            },
        }
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(&mut self, _config: &ReplacementConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }
        self.initialized = true;
        Ok(Some(Duration::from_millis(0)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        if !self.initialized {
            return Err(BgSwapError::inference("mock backend not initialized"));
        }

        let shape = input.shape();
        let height = shape.get(2).copied().unwrap_or(0);
        let width = shape.get(3).copied().unwrap_or(0);

        Ok(Array4::from_shape_fn((1, 1, height, width), |(_, _, y, x)| {
            self.value_at(x, y)
        }))
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        Ok(PreprocessingConfig {
            target_size: [self.target_size, self.target_size],
            normalization_mean: [0.5, 0.5, 0.5],
            normalization_std: [1.0, 1.0, 1.0],
        })
    }

    fn model_info(&self) -> Result<ModelInfo> {
        let side = self.target_size as usize;
        Ok(ModelInfo {
            name: "mock-segmenter".to_string(),
            precision: "fp32".to_string(),
            size_bytes: 1,
            input_shape: (1, 3, side, side),
            output_shape: (1, 1, side, side),
        })
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
