//! Interactive CLI entry point

use crate::cache::{format_size, ModelCache};
use crate::cli::prompt::{self, PromptedRequest};
use crate::config::{OutputFormat, ReplacementConfig};
use crate::download::ModelDownloader;
use crate::error::Result;
use crate::models::{ModelSource, ModelSpec, DEFAULT_MODEL_URL};
use crate::processor::BackgroundReplacer;
use crate::tracing_config::init_cli_tracing;
use std::io::Write;
use tracing::info;

/// Run the interactive background replacement session.
///
/// Recoverable input problems are handled inside the prompt pipeline;
/// anything unrecoverable is printed as a plain message and ends the
/// invocation without a panic or stack trace.
///
/// # Errors
/// - Tracing subscriber installation failures
/// - Console I/O failures
pub fn main() -> anyhow::Result<()> {
    init_cli_tracing()?;

    println!("Welcome to Image Background Changer!");
    println!("===================================");

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    let request = match prompt::gather_request(&mut input, &mut out) {
        Ok(Some(request)) => request,
        Ok(None) => {
            println!("\nProcess cancelled by user.");
            return Ok(());
        },
        Err(e) => {
            eprintln!("\nAn unexpected error occurred: {e}");
            std::process::exit(1);
        },
    };

    println!("\nProcessing image...");
    out.flush()?;

    match run_replacement(&request) {
        Ok(()) => {
            println!(
                "Successfully saved processed image to {}",
                request.output_path.display()
            );
        },
        Err(e) => {
            eprintln!("An error occurred: {e}");
            std::process::exit(1);
        },
    }

    Ok(())
}

/// One-shot replacement for a prompted request
fn run_replacement(request: &PromptedRequest) -> Result<()> {
    let output_format = OutputFormat::from_path(&request.output_path)?;
    let model_id = ensure_default_model()?;

    let config = ReplacementConfig::builder()
        .color(request.color)
        .output_format(output_format)
        .model_spec(ModelSpec {
            source: ModelSource::Downloaded(model_id),
            variant: None,
        })
        .build()?;

    let mut replacer = build_replacer(config)?;
    replacer.replace_and_save(&request.input_path, &request.output_path)?;
    Ok(())
}

/// Make sure the default segmentation model is in the cache, downloading it
/// with a progress bar on first use.
fn ensure_default_model() -> Result<String> {
    let downloader = ModelDownloader::new()?;
    let model_id = downloader.download_model(DEFAULT_MODEL_URL, true)?;

    let cache = ModelCache::new()?;
    if let Some(model) = cache
        .scan_cached_models()?
        .into_iter()
        .find(|m| m.model_id == model_id)
    {
        info!(
            model = %model.model_id,
            size = %format_size(model.size_bytes),
            variants = ?model.variants,
            "segmentation model ready"
        );
    }

    Ok(model_id)
}

#[cfg(feature = "tract")]
fn build_replacer(config: ReplacementConfig) -> Result<BackgroundReplacer> {
    BackgroundReplacer::new(config)
}

#[cfg(not(feature = "tract"))]
fn build_replacer(_config: ReplacementConfig) -> Result<BackgroundReplacer> {
    Err(crate::error::BgSwapError::model(
        "no inference backend compiled in (rebuild with the tract feature)",
    ))
}
