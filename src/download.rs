//! Model downloading from Hugging Face repositories
//!
//! Files are fetched into a temporary directory and moved into the cache in
//! one rename, so an interrupted download never leaves a half-cached model.

use crate::cache::ModelCache;
use crate::error::{BgSwapError, Result};
#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Metadata files every Hugging Face model repository carries
const REQUIRED_FILES: &[&str] = &["config.json", "preprocessor_config.json"];

/// ONNX weight files to attempt, with their precision variants
const ONNX_FILES: &[(&str, &str)] = &[
    ("onnx/model.onnx", "fp32"),
    ("onnx/model_fp16.onnx", "fp16"),
];

/// Progress bar abstraction that works with and without the CLI feature
#[derive(Debug)]
enum ProgressIndicator {
    #[cfg(feature = "cli")]
    Bar(ProgressBar),
    NoOp,
}

impl ProgressIndicator {
    fn for_console() -> Self {
        #[cfg(feature = "cli")]
        {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Self::Bar(bar)
        }
        #[cfg(not(feature = "cli"))]
        {
            Self::NoOp
        }
    }

    fn start_file(&self, name: &str, total: Option<u64>) {
        match self {
            #[cfg(feature = "cli")]
            Self::Bar(bar) => {
                bar.set_message(name.to_string());
                bar.set_length(total.unwrap_or(0));
                bar.set_position(0);
            },
            Self::NoOp => {
                let _ = (name, total);
            },
        }
    }

    fn advance_to(&self, position: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Bar(bar) => bar.set_position(position),
            Self::NoOp => {
                let _ = position;
            },
        }
    }

    fn finish(&self, message: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Bar(bar) => bar.finish_with_message(message),
            Self::NoOp => {
                let _ = message;
            },
        }
    }
}

/// Blocking model downloader
#[derive(Debug)]
pub struct ModelDownloader {
    client: reqwest::blocking::Client,
    cache: ModelCache,
}

impl ModelDownloader {
    /// Create a downloader with a fresh cache handle
    ///
    /// # Errors
    /// - HTTP client construction failure
    /// - Cache directory unavailable
    pub fn new() -> Result<Self> {
        Self::with_cache(ModelCache::new()?)
    }

    /// Create a downloader against an explicit cache
    ///
    /// # Errors
    /// - HTTP client construction failure
    pub fn with_cache(cache: ModelCache) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| BgSwapError::network_error("create HTTP client", &e))?;
        Ok(Self { client, cache })
    }

    /// Download a model repository into the cache, returning its model ID.
    ///
    /// Already-cached models short-circuit without touching the network.
    ///
    /// # Errors
    /// - URL is not a Hugging Face repository
    /// - Network failures, missing weights, or cache I/O failures
    pub fn download_model(&self, url: &str, show_progress: bool) -> Result<String> {
        let model_id = ModelCache::url_to_model_id(url);

        if self.cache.is_model_cached(&model_id) {
            log::info!("model already cached: {model_id}");
            return Ok(model_id);
        }

        if !url.starts_with("https://huggingface.co/") {
            return Err(BgSwapError::invalid_config(format!(
                "only Hugging Face model URLs are supported, got '{url}'"
            )));
        }

        log::info!("downloading model {model_id} from {url}");

        let temp_dir = Self::create_temp_dir(&model_id)?;
        let final_dir = self.cache.model_path(&model_id);
        let progress = if show_progress {
            ProgressIndicator::for_console()
        } else {
            ProgressIndicator::NoOp
        };

        match self.fetch_repository(url, &temp_dir, &progress) {
            Ok(()) => {
                if final_dir.exists() {
                    fs::remove_dir_all(&final_dir).map_err(|e| {
                        BgSwapError::file_io_error("replace cached model", &final_dir, &e)
                    })?;
                }
                fs::rename(&temp_dir, &final_dir).map_err(|e| {
                    BgSwapError::file_io_error("move model into cache", &final_dir, &e)
                })?;
                progress.finish(format!("downloaded {model_id}"));
                log::info!("model ready: {model_id}");
                Ok(model_id)
            },
            Err(e) => {
                if temp_dir.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&temp_dir) {
                        log::warn!("failed to clean up temp download dir: {cleanup}");
                    }
                }
                progress.finish("download failed".to_string());
                Err(e)
            },
        }
    }

    fn create_temp_dir(model_id: &str) -> Result<PathBuf> {
        let temp_dir = std::env::temp_dir().join(format!("bgswap-download-{model_id}"));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir)
                .map_err(|e| BgSwapError::file_io_error("clear temp directory", &temp_dir, &e))?;
        }
        fs::create_dir_all(&temp_dir)
            .map_err(|e| BgSwapError::file_io_error("create temp directory", &temp_dir, &e))?;
        Ok(temp_dir)
    }

    /// Fetch metadata files and at least one ONNX weights variant
    fn fetch_repository(
        &self,
        base_url: &str,
        download_dir: &Path,
        progress: &ProgressIndicator,
    ) -> Result<()> {
        for file in REQUIRED_FILES {
            let url = format!("{}/resolve/main/{file}", base_url.trim_end_matches('/'));
            self.fetch_file(&url, &download_dir.join(file), progress)?;
        }

        let mut weights_found = 0usize;
        for (file, variant) in ONNX_FILES {
            let url = format!("{}/resolve/main/{file}", base_url.trim_end_matches('/'));
            match self.fetch_file(&url, &download_dir.join(file), progress) {
                Ok(()) => {
                    weights_found += 1;
                    log::debug!("fetched {variant} weights ({file})");
                },
                Err(e) => {
                    // fp16-only and fp32-only repositories both exist
                    log::debug!("no {variant} weights in repository: {e}");
                },
            }
        }

        if weights_found == 0 {
            return Err(BgSwapError::model(format!(
                "repository '{base_url}' has no ONNX weights under onnx/"
            )));
        }
        Ok(())
    }

    /// Stream one file to disk, reporting progress and recording its digest
    fn fetch_file(&self, url: &str, destination: &Path, progress: &ProgressIndicator) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BgSwapError::file_io_error("create download directory", parent, &e))?;
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| BgSwapError::network_error("request model file", &e))?
            .error_for_status()
            .map_err(|e| BgSwapError::network_error("fetch model file", &e))?;

        let total = response.content_length();
        let file_name = destination
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        progress.start_file(&file_name, total);

        let mut file = fs::File::create(destination)
            .map_err(|e| BgSwapError::file_io_error("create download file", destination, &e))?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut buffer = [0u8; 64 * 1024];

        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|e| BgSwapError::Network(format!("read model file body: {e}")))?;
            if read == 0 {
                break;
            }
            let chunk = buffer.get(..read).unwrap_or(&buffer);
            file.write_all(chunk)
                .map_err(|e| BgSwapError::file_io_error("write download file", destination, &e))?;
            hasher.update(chunk);
            written += read as u64;
            progress.advance_to(written);
        }

        if written == 0 {
            return Err(BgSwapError::Network(format!("'{url}' returned an empty body")));
        }

        log::debug!("{file_name}: {written} bytes, sha256 {:x}", hasher.finalize());
        Ok(())
    }
}
