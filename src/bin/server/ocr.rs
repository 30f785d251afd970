//! Extraction logic shared between CLI and server modes.

use crate::config::{Backend, ExtractConfig, TranslatorKind};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use lipi::core::traits::{Availability, GenerativeService, Translator};
use lipi::core::{OCRError, ProgressObserver};
use lipi::domain::{LanguageSpec, detect_language_code, language_by_code, language_spec_for_code};
use lipi::pipeline::{PipelineResult, ScriptOcrPipeline, TextExtractor};
use lipi::services::{
    GoogleTranslator, LibreTranslator, MyMemoryTranslator, OllamaClient, TesseractEngine,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to download image: {0}")]
    Download(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Pipeline(#[from] OCRError),
}

impl ServiceError {
    /// Message shown to API and CLI users.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Pipeline(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Request to extract text from an image
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// URL of the image to process
    #[serde(default)]
    pub url: Option<String>,
    /// Base64 image, optionally as a `data:` URL
    #[serde(default)]
    pub image: Option<String>,
    /// UI language code (`hi`) or pack set (`hin+eng`). Omit for script detection.
    #[serde(default)]
    pub language: Option<String>,
    /// Translate the extracted text into this language code.
    #[serde(default)]
    pub translate_to: Option<String>,
}

/// Response from text extraction
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_script: Option<String>,
    pub languages: String,
    /// ISO 639-1 code guessed from the extracted text.
    pub text_language: String,
    pub backend: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl ExtractResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            text: String::new(),
            confidence: None,
            detected_script: None,
            languages: String::new(),
            text_language: String::new(),
            backend: String::new(),
            image_width: 0,
            image_height: 0,
            translation: None,
            error: Some(message),
            processing_time_ms: None,
        }
    }
}

/// Request to translate text
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Response from translation
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub translator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslateResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            translated_text: String::new(),
            source_language: String::new(),
            target_language: String::new(),
            translator: String::new(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetectLanguageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectLanguageResponse {
    pub language: String,
    pub name: String,
}

/// Extractor, translator and language detection behind one handle.
#[derive(Debug)]
pub struct LipiEngine {
    extractor: TextExtractor,
    translator: Arc<dyn Translator>,
    /// Set when a configured feature uses Ollama; also drives language detection.
    ollama: Option<OllamaClient>,
}

impl LipiEngine {
    /// Builds the collaborators named by `config`.
    pub fn new(config: &ExtractConfig) -> Result<Self, ServiceError> {
        let ollama = config.uses_ollama().then(|| {
            OllamaClient::new()
                .with_base_url(config.ollama.url.clone())
                .with_vision_model(config.ollama.vision_model.clone())
                .with_text_model(config.ollama.text_model.clone())
        });

        let extractor = match (config.backend, &ollama) {
            (Backend::Ollama, Some(client)) => {
                TextExtractor::Generative(Arc::new(client.clone()) as Arc<dyn GenerativeService>)
            }
            _ => {
                let tesseract = Arc::new(
                    TesseractEngine::new()
                        .with_binary(config.tesseract_binary.clone())
                        .with_tessdata_dir(config.tessdata_dir.clone()),
                );
                TextExtractor::Recognition(
                    ScriptOcrPipeline::new(tesseract.clone(), tesseract)
                        .with_config(config.pipeline.clone()),
                )
            }
        };

        let translator: Arc<dyn Translator> = match (config.translator.kind, &ollama) {
            (TranslatorKind::MyMemory, _) => Arc::new(MyMemoryTranslator::new()),
            (TranslatorKind::Libre, _) => Arc::new(
                LibreTranslator::new(config.translator.libre_url.clone())
                    .with_api_key(config.translator.libre_api_key.clone()),
            ),
            (TranslatorKind::Google, _) => {
                let key = config.translator.google_api_key.clone().ok_or_else(|| {
                    ServiceError::Config(
                        "the google translator needs an API key (--google-api-key)".to_string(),
                    )
                })?;
                Arc::new(GoogleTranslator::new(key))
            }
            (TranslatorKind::Ollama, Some(client)) => Arc::new(client.clone()),
            (TranslatorKind::Ollama, None) => {
                return Err(ServiceError::Config(
                    "ollama translator selected without an ollama client".to_string(),
                ));
            }
        };

        info!(
            backend = extractor.backend_name(),
            translator = translator.name(),
            "engine configured"
        );
        Ok(Self {
            extractor,
            translator,
            ollama,
        })
    }

    pub fn backend_name(&self) -> &str {
        self.extractor.backend_name()
    }

    pub fn translator_name(&self) -> &str {
        self.translator.name()
    }

    /// Runs extraction on raw image bytes.
    pub async fn extract(
        &self,
        bytes: &[u8],
        language: Option<LanguageSpec>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<PipelineResult, ServiceError> {
        Ok(self.extractor.extract(bytes, language, observer).await?)
    }

    pub async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslateResponse, ServiceError> {
        let result = self.translator.translate(text, target, source).await?;
        Ok(TranslateResponse {
            success: true,
            translated_text: result.translated_text,
            source_language: result.source_language,
            target_language: result.target_language,
            translator: self.translator.name().to_string(),
            error: None,
        })
    }

    /// ISO 639-1 code of `text`, asking Ollama first when it is configured.
    pub async fn detect_language(&self, text: &str) -> String {
        match &self.ollama {
            Some(client) => client.detect_language(text).await,
            None => detect_language_code(text).to_string(),
        }
    }

    /// Availability of the Ollama server, or `None` when it is not used.
    pub async fn ollama_status(&self) -> Option<Availability> {
        match &self.ollama {
            Some(client) => Some(client.check_availability().await),
            None => None,
        }
    }

    /// Extracts text and optionally translates it.
    pub async fn extract_response(
        &self,
        bytes: &[u8],
        language: Option<LanguageSpec>,
        translate_to: Option<&str>,
        observer: Arc<dyn ProgressObserver>,
        start: Instant,
    ) -> Result<ExtractResponse, ServiceError> {
        let result = self.extract(bytes, language, observer).await?;
        let text_language = self.detect_language(&result.text).await;
        let translation = match translate_to {
            Some(target) => Some(
                self.translate(&result.text, target, Some(&text_language))
                    .await?,
            ),
            None => None,
        };
        Ok(result_to_response(
            &result,
            self.backend_name(),
            text_language,
            translation,
            start.elapsed().as_secs_f64() * 1000.0,
        ))
    }
}

/// Convert a pipeline result to an API response
pub fn result_to_response(
    result: &PipelineResult,
    backend: &str,
    text_language: String,
    translation: Option<TranslateResponse>,
    processing_time_ms: f64,
) -> ExtractResponse {
    ExtractResponse {
        success: true,
        text: result.text.clone(),
        confidence: result.confidence,
        detected_script: result.detected_script.as_ref().map(|s| s.to_string()),
        languages: result.languages.to_string(),
        text_language,
        backend: backend.to_string(),
        image_width: result.image_width,
        image_height: result.image_height,
        translation,
        error: None,
        processing_time_ms: Some(processing_time_ms),
    }
}

/// Parses a language selection: a catalog code such as `hi`, or a pack set such
/// as `hin+eng`.
pub fn parse_language(input: &str) -> Result<LanguageSpec, ServiceError> {
    let input = input.trim();
    if language_by_code(input).is_some() {
        return Ok(language_spec_for_code(input));
    }
    input
        .parse()
        .map_err(|e: lipi::domain::LanguageSpecError| ServiceError::InvalidRequest(e.to_string()))
}

/// Decodes a base64 image, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, ServiceError> {
    let payload = match encoded.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => encoded,
    };
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|e| ServiceError::InvalidRequest(format!("image is not valid base64: {e}")))
}

/// Download bytes from a URL
pub async fn download_bytes(url: &str) -> Result<Vec<u8>, ServiceError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| ServiceError::Download(format!("Failed to fetch URL: {e}")))?;

    if !response.status().is_success() {
        return Err(ServiceError::Download(format!(
            "HTTP error: {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ServiceError::Download(format!("Failed to read response body: {e}")))?;

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_accepts_codes_and_pack_sets() {
        assert_eq!(parse_language("hi").unwrap().to_string(), "hin");
        assert_eq!(parse_language("zh").unwrap().to_string(), "chi_sim");
        assert_eq!(parse_language("hin+eng").unwrap().to_string(), "hin+eng");
        assert!(parse_language("hin++eng").is_err());
    }

    #[test]
    fn test_decode_base64_image() {
        assert_eq!(decode_base64_image("aGk=").unwrap(), b"hi");
        assert_eq!(
            decode_base64_image("data:image/png;base64,aGk=").unwrap(),
            b"hi"
        );
        assert!(matches!(
            decode_base64_image("not base64!"),
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ExtractResponse::error("boom".to_string())).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("confidence").is_none());
    }
}
