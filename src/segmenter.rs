//! Segmentation: preprocessing, inference and matte extraction
//!
//! Wraps an [`InferenceBackend`] into the one capability the rest of the
//! tool relies on: image in, foreground matte out. Swapping the model or
//! runtime never touches the compositing contract.

use crate::config::ReplacementConfig;
use crate::error::{BgSwapError, Result};
use crate::inference::InferenceBackend;
use crate::models::PreprocessingConfig;
use crate::types::AlphaMatte;
use image::{DynamicImage, ImageBuffer, Rgb, RgbaImage};
use ndarray::Array4;

// Use instant for cross-platform time compatibility
use instant::Duration;

/// Foreground/background segmentation over a pluggable inference backend
pub struct Segmenter {
    backend: Box<dyn InferenceBackend>,
}

impl Segmenter {
    /// Create a segmenter over an explicit backend
    #[must_use]
    pub fn new(backend: Box<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Create a segmenter over the default Tract backend
    #[cfg(feature = "tract")]
    #[must_use]
    pub fn with_default_backend() -> Self {
        Self::new(Box::new(crate::backends::TractBackend::new()))
    }

    /// Initialize the backend (loads the model on first call)
    ///
    /// # Errors
    /// - Model resolution or loading failures
    pub fn initialize(&mut self, config: &ReplacementConfig) -> Result<Option<Duration>> {
        self.backend.initialize(config)
    }

    /// Display name of the model behind this segmenter
    #[must_use]
    pub fn model_name(&self) -> String {
        self.backend
            .model_info()
            .map_or_else(|_| "unknown".to_string(), |info| info.name)
    }

    /// Compute the foreground matte for an image at its own dimensions.
    ///
    /// # Errors
    /// - Backend initialization or inference failures
    /// - Malformed model output
    pub fn matte(&mut self, image: &DynamicImage, config: &ReplacementConfig) -> Result<AlphaMatte> {
        if !self.backend.is_initialized() {
            self.backend.initialize(config)?;
        }

        let preprocessing = self.backend.preprocessing_config()?;
        let input = preprocess_for_inference(image, &preprocessing)?;
        let output = self.backend.infer(&input)?;
        matte_from_tensor(&output, (image.width(), image.height()))
    }

    /// Remove the background: the source image with its alpha channel set
    /// to per-pixel foreground confidence.
    ///
    /// # Errors
    /// - Any failure from [`Segmenter::matte`]
    pub fn segment(
        &mut self,
        image: &DynamicImage,
        config: &ReplacementConfig,
    ) -> Result<RgbaImage> {
        let matte = self.matte(image, config)?;
        matte.apply(image)
    }
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter")
            .field("initialized", &self.backend.is_initialized())
            .finish()
    }
}

/// Geometry of the aspect-preserving resize into the model's square input
#[derive(Debug, Clone, Copy)]
struct InputGeometry {
    scale: f32,
    offset_x: u32,
    offset_y: u32,
}

impl InputGeometry {
    fn for_dimensions(target_size: u32, (width, height): (u32, u32)) -> Self {
        let target = target_size as f32;
        let scale = (target / width as f32).min(target / height as f32);
        let scaled_w = (width as f32 * scale).round() as u32;
        let scaled_h = (height as f32 * scale).round() as u32;
        Self {
            scale,
            offset_x: (target_size - scaled_w.min(target_size)) / 2,
            offset_y: (target_size - scaled_h.min(target_size)) / 2,
        }
    }
}

/// Resize, pad and normalize an image into the NCHW tensor the model expects
pub(crate) fn preprocess_for_inference(
    image: &DynamicImage,
    config: &PreprocessingConfig,
) -> Result<Array4<f32>> {
    let target_size = config.target_size[0];
    if target_size == 0 {
        return Err(BgSwapError::processing("model target size is zero"));
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(BgSwapError::processing("cannot segment an empty image"));
    }

    let geometry = InputGeometry::for_dimensions(target_size, (width, height));
    let scaled_w = ((width as f32) * geometry.scale).round().max(1.0) as u32;
    let scaled_h = ((height as f32) * geometry.scale).round().max(1.0) as u32;

    let resized = image::imageops::resize(
        &rgb,
        scaled_w,
        scaled_h,
        image::imageops::FilterType::Triangle,
    );

    // Center the resized image on a white square canvas
    let mut canvas: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(target_size, target_size, Rgb([255, 255, 255]));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let cx = x + geometry.offset_x;
        let cy = y + geometry.offset_y;
        if cx < target_size && cy < target_size {
            canvas.put_pixel(cx, cy, *pixel);
        }
    }

    let side = target_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for channel in 0..3 {
            let scaled = f32::from(pixel[channel]) / 255.0;
            let normalized = (scaled - config.normalization_mean[channel])
                / config.normalization_std[channel];
            if let Some(cell) = tensor.get_mut([0, channel, y as usize, x as usize]) {
                *cell = normalized;
            }
        }
    }

    Ok(tensor)
}

/// Map the model's square matte tensor back onto the source dimensions
pub(crate) fn matte_from_tensor(
    tensor: &Array4<f32>,
    original_dimensions: (u32, u32),
) -> Result<AlphaMatte> {
    let shape = tensor.shape();
    if shape.first().copied() != Some(1) || shape.get(1).copied() != Some(1) {
        return Err(BgSwapError::inference(format!(
            "expected a 1x1xHxW matte tensor, got {shape:?}"
        )));
    }
    let tensor_h = shape.get(2).copied().unwrap_or(0) as u32;
    let tensor_w = shape.get(3).copied().unwrap_or(0) as u32;
    if tensor_w == 0 || tensor_h == 0 {
        return Err(BgSwapError::inference("matte tensor has zero dimensions"));
    }

    let (width, height) = original_dimensions;
    let geometry = InputGeometry::for_dimensions(tensor_w, (width, height));

    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let tx = (x as f32 * geometry.scale).round() as u32 + geometry.offset_x;
            let ty = (y as f32 * geometry.scale).round() as u32 + geometry.offset_y;

            let confidence = if tx < tensor_w && ty < tensor_h {
                tensor
                    .get([0, 0, ty as usize, tx as usize])
                    .copied()
                    .unwrap_or(0.0)
            } else {
                // Outside the model's prediction area
                0.0
            };
            data.push((confidence.clamp(0.0, 1.0) * 255.0).round() as u8);
        }
    }

    Ok(AlphaMatte::new(data, original_dimensions))
}
