//! Segmentation model resolution and metadata

use crate::cache::ModelCache;
use crate::error::{BgSwapError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Repository the default model is fetched from on first use
pub const DEFAULT_MODEL_URL: &str = "https://huggingface.co/imgly/isnet-general-onnx";

/// Model source specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// ONNX model file on the local filesystem
    External(PathBuf),
    /// Downloaded model in the cache, addressed by model ID
    Downloaded(String),
}

impl ModelSource {
    /// Display name for logging
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::External(path) => format!(
                "external:{}",
                path.file_name().unwrap_or_default().to_string_lossy()
            ),
            Self::Downloaded(model_id) => format!("cached:{model_id}"),
        }
    }
}

/// Complete model specification including source and optional precision variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub source: ModelSource,
    pub variant: Option<String>,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            source: ModelSource::Downloaded(ModelCache::url_to_model_id(DEFAULT_MODEL_URL)),
            variant: None,
        }
    }
}

/// Model information and metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub precision: String,
    pub size_bytes: u64,
    /// Expected input tensor shape, NCHW
    pub input_shape: (usize, usize, usize, usize),
    /// Expected output tensor shape, NCHW (single-channel matte)
    pub output_shape: (usize, usize, usize, usize),
}

/// Preprocessing parameters a model expects its input normalized with
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    /// Square input size (width, height)
    pub target_size: [u32; 2],
    /// Per-channel normalization mean (applied after scaling to [0,1])
    pub normalization_mean: [f32; 3],
    /// Per-channel normalization standard deviation
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        // ISNet conventions
        Self {
            target_size: [1024, 1024],
            normalization_mean: [0.5, 0.5, 0.5],
            normalization_std: [1.0, 1.0, 1.0],
        }
    }
}

/// Provider trait for loading model data and metadata
pub trait ModelProvider: std::fmt::Debug {
    /// Load the ONNX model bytes
    ///
    /// # Errors
    /// - Model file missing or unreadable
    fn load_model_data(&self) -> Result<Vec<u8>>;

    /// Model metadata
    ///
    /// # Errors
    /// - Model file metadata unavailable
    fn model_info(&self) -> Result<ModelInfo>;

    /// Preprocessing parameters for this model
    ///
    /// # Errors
    /// - Metadata file present but unparseable
    fn preprocessing_config(&self) -> Result<PreprocessingConfig>;
}

/// Provider for models downloaded into the cache (Hugging Face layout)
#[derive(Debug)]
pub struct DownloadedModelProvider {
    model_id: String,
    model_dir: PathBuf,
    weights_path: PathBuf,
    precision: String,
}

impl DownloadedModelProvider {
    /// Resolve a cached model by ID, selecting the requested precision
    /// variant or the best available one (fp32 preferred).
    ///
    /// # Errors
    /// - Model not present in the cache
    /// - Requested variant not available
    pub fn new(model_id: &str, variant: Option<&str>, cache: &ModelCache) -> Result<Self> {
        let model_dir = cache.model_path(model_id);
        if !cache.is_model_cached(model_id) {
            return Err(BgSwapError::model(format!(
                "model '{model_id}' is not in the cache; download it first"
            )));
        }

        let (weights_path, precision) = Self::select_weights(&model_dir, variant)?;
        Ok(Self {
            model_id: model_id.to_string(),
            model_dir,
            weights_path,
            precision,
        })
    }

    fn select_weights(model_dir: &Path, variant: Option<&str>) -> Result<(PathBuf, String)> {
        let candidates: &[(&str, &str)] = match variant {
            Some("fp16") => &[("onnx/model_fp16.onnx", "fp16")],
            Some("fp32") | None => &[
                ("onnx/model.onnx", "fp32"),
                ("onnx/model_fp16.onnx", "fp16"),
            ],
            Some(other) => {
                return Err(BgSwapError::model(format!(
                    "unknown model variant '{other}' (expected fp16 or fp32)"
                )))
            },
        };

        for (relative, precision) in candidates {
            let path = model_dir.join(relative);
            if path.is_file() {
                return Ok((path, (*precision).to_string()));
            }
        }

        Err(BgSwapError::model(format!(
            "no ONNX weights found under '{}'",
            model_dir.display()
        )))
    }

    /// Parse `preprocessor_config.json` in the Hugging Face layout,
    /// filling gaps with the ISNet defaults.
    fn parse_preprocessor_config(path: &Path) -> Result<PreprocessingConfig> {
        let text = fs::read_to_string(path)
            .map_err(|e| BgSwapError::file_io_error("read preprocessor config", path, &e))?;
        let raw: RawPreprocessorConfig = serde_json::from_str(&text).map_err(|e| {
            BgSwapError::model(format!(
                "invalid preprocessor config '{}': {e}",
                path.display()
            ))
        })?;

        let mut config = PreprocessingConfig::default();
        if let Some(size) = raw.size {
            if let (Some(w), Some(h)) = (size.width, size.height) {
                config.target_size = [w, h];
            }
        }
        if let Some(mean) = as_triple(raw.image_mean) {
            config.normalization_mean = mean;
        }
        if let Some(std) = as_triple(raw.image_std) {
            config.normalization_std = std;
        }

        Ok(config)
    }
}

/// On-disk shape of `preprocessor_config.json` (unknown fields ignored)
#[derive(Debug, serde::Deserialize)]
struct RawPreprocessorConfig {
    #[serde(default)]
    size: Option<RawSize>,
    #[serde(default)]
    image_mean: Option<Vec<f32>>,
    #[serde(default)]
    image_std: Option<Vec<f32>>,
}

#[derive(Debug, serde::Deserialize)]
struct RawSize {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

fn as_triple(values: Option<Vec<f32>>) -> Option<[f32; 3]> {
    let values = values?;
    match values.as_slice() {
        [r, g, b] => Some([*r, *g, *b]),
        _ => None,
    }
}

impl ModelProvider for DownloadedModelProvider {
    fn load_model_data(&self) -> Result<Vec<u8>> {
        fs::read(&self.weights_path)
            .map_err(|e| BgSwapError::file_io_error("read model weights", &self.weights_path, &e))
    }

    fn model_info(&self) -> Result<ModelInfo> {
        let size_bytes = fs::metadata(&self.weights_path)
            .map_err(|e| BgSwapError::file_io_error("stat model weights", &self.weights_path, &e))?
            .len();
        let config = self.preprocessing_config()?;
        let side = config.target_size[0] as usize;

        Ok(ModelInfo {
            name: self.model_id.clone(),
            precision: self.precision.clone(),
            size_bytes,
            input_shape: (1, 3, side, side),
            output_shape: (1, 1, side, side),
        })
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        let path = self.model_dir.join("preprocessor_config.json");
        if path.is_file() {
            Self::parse_preprocessor_config(&path)
        } else {
            log::debug!(
                "no preprocessor config for '{}', using defaults",
                self.model_id
            );
            Ok(PreprocessingConfig::default())
        }
    }
}

/// Provider for a bare ONNX file outside the cache
#[derive(Debug)]
pub struct ExternalModelProvider {
    model_path: PathBuf,
}

impl ExternalModelProvider {
    /// Use the ONNX model at the given path.
    ///
    /// # Errors
    /// - Path does not reference an existing `.onnx` file
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.is_file() {
            return Err(BgSwapError::model(format!(
                "model file '{}' does not exist",
                model_path.display()
            )));
        }
        if model_path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            return Err(BgSwapError::model(format!(
                "'{}' is not an ONNX model file",
                model_path.display()
            )));
        }
        Ok(Self { model_path })
    }
}

impl ModelProvider for ExternalModelProvider {
    fn load_model_data(&self) -> Result<Vec<u8>> {
        fs::read(&self.model_path)
            .map_err(|e| BgSwapError::file_io_error("read model weights", &self.model_path, &e))
    }

    fn model_info(&self) -> Result<ModelInfo> {
        let size_bytes = fs::metadata(&self.model_path)
            .map_err(|e| BgSwapError::file_io_error("stat model weights", &self.model_path, &e))?
            .len();
        let name = self
            .model_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let precision = if name.contains("fp16") { "fp16" } else { "fp32" };
        let config = self.preprocessing_config()?;
        let side = config.target_size[0] as usize;

        Ok(ModelInfo {
            name,
            precision: precision.to_string(),
            size_bytes,
            input_shape: (1, 3, side, side),
            output_shape: (1, 1, side, side),
        })
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        // A sibling preprocessor_config.json wins over the defaults
        let sibling = self
            .model_path
            .parent()
            .map(|dir| dir.join("preprocessor_config.json"));
        match sibling {
            Some(path) if path.is_file() => {
                DownloadedModelProvider::parse_preprocessor_config(&path)
            },
            _ => Ok(PreprocessingConfig::default()),
        }
    }
}

/// Facade over the provider selected by a [`ModelSpec`]
#[derive(Debug)]
pub struct ModelManager {
    provider: Box<dyn ModelProvider>,
}

impl ModelManager {
    /// Resolve a model manager from a specification
    ///
    /// # Errors
    /// - Cached model missing, unknown variant, or invalid external path
    pub fn from_spec(spec: &ModelSpec) -> Result<Self> {
        let provider: Box<dyn ModelProvider> = match &spec.source {
            ModelSource::Downloaded(model_id) => {
                let cache = ModelCache::new()?;
                Box::new(DownloadedModelProvider::new(
                    model_id,
                    spec.variant.as_deref(),
                    &cache,
                )?)
            },
            ModelSource::External(path) => Box::new(ExternalModelProvider::new(path)?),
        };
        Ok(Self { provider })
    }

    /// Load the ONNX model bytes
    ///
    /// # Errors
    /// - Provider failures reading the weights
    pub fn load_model_data(&self) -> Result<Vec<u8>> {
        self.provider.load_model_data()
    }

    /// Model metadata
    ///
    /// # Errors
    /// - Provider failures reading metadata
    pub fn model_info(&self) -> Result<ModelInfo> {
        self.provider.model_info()
    }

    /// Preprocessing parameters
    ///
    /// # Errors
    /// - Provider failures reading or parsing metadata
    pub fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        self.provider.preprocessing_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_default_spec_points_at_default_model() {
        let spec = ModelSpec::default();
        match spec.source {
            ModelSource::Downloaded(id) => assert_eq!(id, "imgly--isnet-general-onnx"),
            ModelSource::External(_) => panic!("default spec should use the cache"),
        }
        assert!(spec.variant.is_none());
    }

    #[test]
    fn test_display_names() {
        let downloaded = ModelSource::Downloaded("some--model".to_string());
        assert_eq!(downloaded.display_name(), "cached:some--model");

        let external = ModelSource::External(PathBuf::from("/models/u2net.onnx"));
        assert_eq!(external.display_name(), "external:u2net.onnx");
    }

    #[test]
    fn test_external_provider_rejects_missing_and_non_onnx() {
        assert!(ExternalModelProvider::new("/definitely/not/there.onnx").is_err());

        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("model.txt");
        File::create(&txt).unwrap().write_all(b"not a model").unwrap();
        assert!(ExternalModelProvider::new(&txt).is_err());
    }

    #[test]
    fn test_external_provider_reads_bytes_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.onnx");
        File::create(&path).unwrap().write_all(&[1, 2, 3]).unwrap();

        let provider = ExternalModelProvider::new(&path).unwrap();
        assert_eq!(provider.load_model_data().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            provider.preprocessing_config().unwrap(),
            PreprocessingConfig::default()
        );

        let info = provider.model_info().unwrap();
        assert_eq!(info.name, "tiny");
        assert_eq!(info.precision, "fp32");
        assert_eq!(info.size_bytes, 3);
        assert_eq!(info.input_shape, (1, 3, 1024, 1024));
        assert_eq!(info.output_shape, (1, 1, 1024, 1024));
    }

    #[test]
    fn test_preprocessor_config_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor_config.json");
        File::create(&path)
            .unwrap()
            .write_all(
                br#"{
                    "size": {"width": 320, "height": 320},
                    "image_mean": [0.485, 0.456, 0.406],
                    "image_std": [0.229, 0.224, 0.225]
                }"#,
            )
            .unwrap();

        let config = DownloadedModelProvider::parse_preprocessor_config(&path).unwrap();
        assert_eq!(config.target_size, [320, 320]);
        assert!((config.normalization_mean[0] - 0.485).abs() < 1e-6);
        assert!((config.normalization_std[2] - 0.225).abs() < 1e-6);
    }

    #[test]
    fn test_preprocessor_config_partial_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor_config.json");
        File::create(&path).unwrap().write_all(b"{}").unwrap();

        let config = DownloadedModelProvider::parse_preprocessor_config(&path).unwrap();
        assert_eq!(config, PreprocessingConfig::default());
    }
}
