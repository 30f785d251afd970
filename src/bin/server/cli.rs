//! CLI mode for text extraction, image conditioning and the language catalog.

use crate::config::{ExtractConfig, OutputFormat};
use crate::ocr::{ExtractResponse, LipiEngine, ServiceError, download_bytes};
use lipi::core::PipelineConfig;
use lipi::domain::{
    LANGUAGES, Language, LanguageSpec, Region, languages_by_region, search_languages,
};
use lipi::pipeline::{FnObserver, ProgressEvent, prepare_image};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Process an image downloaded from a URL
pub async fn process_url(
    url: &str,
    config: &ExtractConfig,
    language: Option<LanguageSpec>,
    translate_to: Option<&str>,
    output_format: OutputFormat,
) -> CliResult {
    let start = Instant::now();

    info!("Downloading image from URL...");
    let bytes = download_bytes(url).await?;
    info!(
        "Downloaded {} bytes in {:.2}ms",
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    process_bytes(&bytes, config, language, translate_to, output_format).await
}

/// Process a local image file
pub async fn process_file(
    path: &Path,
    config: &ExtractConfig,
    language: Option<LanguageSpec>,
    translate_to: Option<&str>,
    output_format: OutputFormat,
) -> CliResult {
    let start = Instant::now();

    info!("Loading image from file...");
    let bytes = tokio::fs::read(path).await?;
    info!(
        "Loaded {} bytes in {:.2}ms",
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    process_bytes(&bytes, config, language, translate_to, output_format).await
}

async fn process_bytes(
    bytes: &[u8],
    config: &ExtractConfig,
    language: Option<LanguageSpec>,
    translate_to: Option<&str>,
    output_format: OutputFormat,
) -> CliResult {
    let engine = LipiEngine::new(config)?;
    info!(backend = engine.backend_name(), "Extracting text...");

    let observer = Arc::new(FnObserver::new(|event: &ProgressEvent| {
        info!(
            stage = %event.stage,
            progress = event.progress,
            "{}",
            event.status
        );
    }));

    let response = engine
        .extract_response(bytes, language, translate_to, observer, Instant::now())
        .await
        .map_err(|e| e.user_message())?;

    output_result(&response, output_format)?;
    Ok(())
}

/// Output the extraction result in the specified format
fn output_result(response: &ExtractResponse, format: OutputFormat) -> Result<(), ServiceError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string(response).map_err(lipi::core::OCRError::from)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("{}", response.text);
            if let Some(translation) = &response.translation {
                println!();
                println!("{}", translation.translated_text);
            }
        }
        OutputFormat::Pretty => {
            println!("\n=== Extraction Results ===");
            println!(
                "Image size: {}x{}",
                response.image_width, response.image_height
            );
            println!("Backend: {}", response.backend);
            if let Some(script) = &response.detected_script {
                println!("Detected script: {script}");
            }
            println!("Languages: {}", response.languages);
            println!("Text language: {}", response.text_language);
            match response.confidence {
                Some(confidence) => println!("Confidence: {:.1}%", confidence * 100.0),
                None => println!("Confidence: n/a"),
            }
            if let Some(ms) = response.processing_time_ms {
                println!("Processing time: {ms:.2}ms");
            }
            println!();

            if response.text.is_empty() {
                println!("No text detected.");
            } else {
                println!("--- Extracted Text ---");
                println!("{}", response.text);
            }

            if let Some(translation) = &response.translation {
                println!();
                println!(
                    "--- Translation ({} -> {}, {}) ---",
                    translation.source_language,
                    translation.target_language,
                    translation.translator
                );
                println!("{}", translation.translated_text);
            }
        }
    }

    Ok(())
}

/// Writes the conditioned version of `input` to `output` as PNG
pub async fn condition_file(input: &Path, output: &Path, config: &PipelineConfig) -> CliResult {
    let start = Instant::now();
    let bytes = tokio::fs::read(input).await?;
    let prepared = prepare_image(bytes, &config.conditioning).await?;
    tokio::fs::write(output, prepared.image.bytes()).await?;
    info!(
        "Conditioned {}x{} -> {}x{} in {:.2}ms",
        prepared.original_width,
        prepared.original_height,
        prepared.image.width(),
        prepared.image.height(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    println!("{}", output.display());
    Ok(())
}

/// Prints the language catalog, optionally filtered
pub fn list_languages(
    region: Option<Region>,
    search: Option<&str>,
    format: OutputFormat,
) -> CliResult {
    let mut languages: Vec<&'static Language> = match search {
        Some(query) => search_languages(query),
        None => LANGUAGES.iter().collect(),
    };
    if let Some(region) = region {
        let in_region = languages_by_region(region);
        languages.retain(|lang| in_region.contains(lang));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&languages)?),
        OutputFormat::Text => {
            for lang in &languages {
                println!("{}", lang.code);
            }
        }
        OutputFormat::Pretty => {
            if languages.is_empty() {
                println!("No languages match.");
            }
            for lang in &languages {
                println!(
                    "{:<4} {:<12} {:<18} {:<12} {}",
                    lang.code,
                    lang.name,
                    lang.native_name,
                    lang.region.to_string(),
                    lang.tesseract_pack
                );
            }
        }
    }
    Ok(())
}
