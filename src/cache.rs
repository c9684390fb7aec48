//! On-disk cache for downloaded segmentation models
//!
//! Cache location follows the XDG Base Directory convention
//! (`~/.cache/bgswap/models` on Linux/macOS) with a `BGSWAP_CACHE_DIR`
//! environment override.

use crate::error::{BgSwapError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Information about one cached model
#[derive(Debug, Clone)]
pub struct CachedModelInfo {
    /// Cache-safe model identifier
    pub model_id: String,
    /// Model directory in the cache
    pub path: PathBuf,
    /// Total size of the model directory in bytes
    pub size_bytes: u64,
    /// Available precision variants (fp32/fp16)
    pub variants: Vec<String>,
}

/// Model cache manager
#[derive(Debug)]
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Open (creating if needed) the model cache directory
    ///
    /// # Errors
    /// - No cache directory can be determined
    /// - Cache directory cannot be created
    pub fn new() -> Result<Self> {
        let cache_dir = Self::resolve_cache_dir()?;
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)
                .map_err(|e| BgSwapError::file_io_error("create cache directory", &cache_dir, &e))?;
        }
        Ok(Self { cache_dir })
    }

    /// Open a cache rooted at an explicit directory (used by tests)
    ///
    /// # Errors
    /// - Directory cannot be created
    pub fn with_cache_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let cache_dir = dir.as_ref().join("models");
        fs::create_dir_all(&cache_dir)
            .map_err(|e| BgSwapError::file_io_error("create cache directory", &cache_dir, &e))?;
        Ok(Self { cache_dir })
    }

    fn resolve_cache_dir() -> Result<PathBuf> {
        if let Ok(overridden) = std::env::var("BGSWAP_CACHE_DIR") {
            return Ok(PathBuf::from(overridden).join("models"));
        }

        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                BgSwapError::invalid_config(
                    "cannot determine a cache directory; set BGSWAP_CACHE_DIR",
                )
            })?
            .join("bgswap")
            .join("models"))
    }

    /// Derive a cache-safe model ID from a repository URL.
    ///
    /// Hugging Face URLs map to `owner--repo`; anything else gets a short
    /// content-derived identifier.
    #[must_use]
    pub fn url_to_model_id(url: &str) -> String {
        const HF_PREFIX: &str = "https://huggingface.co/";
        if let Some(repo) = url.strip_prefix(HF_PREFIX) {
            repo.trim_end_matches('/').replace('/', "--")
        } else {
            use sha2::{Digest, Sha256};
            let digest = Sha256::digest(url.as_bytes());
            format!("url-{:x}", digest)
                .chars()
                .take(16)
                .collect()
        }
    }

    /// Whether a model is cached and structurally valid
    #[must_use]
    pub fn is_model_cached(&self, model_id: &str) -> bool {
        let dir = self.cache_dir.join(model_id);
        dir.is_dir() && Self::is_valid_model_dir(&dir)
    }

    /// Path to a model directory (which may not exist yet)
    #[must_use]
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.cache_dir.join(model_id)
    }

    /// Root of the cache
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// List all valid cached models
    ///
    /// # Errors
    /// - Cache directory unreadable
    pub fn scan_cached_models(&self) -> Result<Vec<CachedModelInfo>> {
        let mut models = Vec::new();

        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| BgSwapError::file_io_error("read cache directory", &self.cache_dir, &e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| BgSwapError::file_io_error("read cache entry", &self.cache_dir, &e))?;
            let path = entry.path();
            if !path.is_dir() || !Self::is_valid_model_dir(&path) {
                continue;
            }

            let model_id = entry.file_name().to_string_lossy().into_owned();
            models.push(CachedModelInfo {
                size_bytes: dir_size(&path),
                variants: Self::available_variants(&path),
                path,
                model_id,
            });
        }

        models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        Ok(models)
    }

    /// A model directory is valid when it has its config and at least one
    /// ONNX weights file.
    fn is_valid_model_dir(dir: &Path) -> bool {
        dir.join("config.json").is_file() && !Self::available_variants(dir).is_empty()
    }

    fn available_variants(dir: &Path) -> Vec<String> {
        let mut variants = Vec::new();
        if dir.join("onnx").join("model.onnx").is_file() {
            variants.push("fp32".to_string());
        }
        if dir.join("onnx").join("model_fp16.onnx").is_file() {
            variants.push("fp16".to_string());
        }
        variants
    }
}

/// Total size of a directory tree in bytes (best effort)
fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            }
        })
        .sum()
}

/// Human-readable byte size (e.g. "172.3 MB")
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
