//! Client for a local Ollama server, used for vision transcription, translation
//! and language detection.

use crate::core::OCRError;
use crate::core::traits::{Availability, GenerativeService, TranslationResult, Translator};
use crate::domain::{detect_language_code, language_name};
use crate::pipeline::progress::StageProgress;
use crate::services::translation::require_target;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_VISION_MODEL: &str = "qwen3-vl:235b-cloud";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-oss:120b-cloud";

/// Sampling temperature for translations.
const TRANSLATION_TEMPERATURE: f32 = 0.3;

/// Characters of input sent along with a language detection prompt.
const DETECTION_SAMPLE_CHARS: usize = 200;

const EXTRACTION_PROMPT: &str = "Extract ALL text from this image exactly as it appears. Include:
- Every word, number, symbol, and punctuation mark
- Preserve the exact line breaks and formatting
- Keep the original case (uppercase/lowercase)
- Include any signs like @, #, $, %, &, *, +, =, etc.
- Extract text in any language present

Return ONLY the extracted text, nothing else. Do not add any explanations or commentary.";

/// Ollama HTTP client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    vision_model: String,
    text_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Per-request timeout. Default: 120 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_generate(&self, request: &GenerateRequest<'_>) -> Result<String, OCRError> {
        debug!(
            model = request.model,
            images = request.images.len(),
            "sending generate request"
        );
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OCRError::generation(
                "ollama",
                format!("API error {status}: {}", body.trim()),
            ));
        }
        let body: GenerateResponse = response.json().await?;
        Ok(body.response.trim().to_string())
    }

    /// Returns the ISO 639-1 code of `text`.
    ///
    /// Asks the text model first. If the request fails or the answer is not a
    /// two-letter code, falls back to [`detect_language_code`].
    pub async fn detect_language(&self, text: &str) -> String {
        let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
        match self.generate(&detection_prompt(&sample), None).await {
            Ok(answer) => match parse_language_reply(&answer) {
                Some(code) => return code,
                None => warn!(answer = %answer, "unusable language detection reply"),
            },
            Err(e) => warn!(error = %e, "ollama language detection failed"),
        }
        detect_language_code(text).to_string()
    }
}

#[async_trait]
impl GenerativeService for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn check_availability(&self) -> Availability {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.timeout)
            .send()
            .await;
        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "ollama tags request rejected");
                return Availability::default();
            }
            Err(e) => {
                debug!(error = %e, "ollama not reachable");
                return Availability::default();
            }
        };
        // A reachable server with an unexpected body still counts as available.
        let models = response
            .json::<TagsResponse>()
            .await
            .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
            .unwrap_or_default();
        Availability {
            available: true,
            models,
        }
    }

    async fn extract_text(
        &self,
        image: &[u8],
        progress: &StageProgress,
    ) -> Result<String, OCRError> {
        progress.report(0.1, Some("Sending to vision model..."));
        let request = GenerateRequest {
            model: &self.vision_model,
            prompt: EXTRACTION_PROMPT,
            images: vec![BASE64_STANDARD.encode(image)],
            stream: false,
            options: None,
        };
        let text = self.post_generate(&request).await?;
        progress.report(1.0, Some("Text extraction complete"));
        Ok(text)
    }

    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, OCRError> {
        let request = GenerateRequest {
            model: &self.text_model,
            prompt,
            images: Vec::new(),
            stream: false,
            options: temperature.map(|temperature| GenerateOptions { temperature }),
        };
        self.post_generate(&request).await
    }
}

#[async_trait]
impl Translator for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, OCRError> {
        require_target(target)?;
        if text.trim().is_empty() {
            return Ok(TranslationResult {
                translated_text: String::new(),
                source_language: source.unwrap_or("auto").to_string(),
                target_language: target.to_string(),
            });
        }
        let prompt = translation_prompt(text, target, source);
        let translated_text = self
            .generate(&prompt, Some(TRANSLATION_TEMPERATURE))
            .await?;
        Ok(TranslationResult {
            translated_text,
            source_language: source
                .unwrap_or_else(|| detect_language_code(text))
                .to_string(),
            target_language: target.to_string(),
        })
    }
}

fn translation_prompt(text: &str, target: &str, source: Option<&str>) -> String {
    let target_name = language_name(target);
    let source_name = source.map_or("the source language", language_name);
    format!(
        "Translate the following text from {source_name} to {target_name}.

Important instructions:
- Provide ONLY the translation, no explanations
- Preserve all formatting, line breaks, and punctuation
- Keep numbers, symbols, and special characters as they are
- Maintain the original tone and meaning
- Do not add any commentary or notes

Text to translate:
{text}

Translation:"
    )
}

fn detection_prompt(sample: &str) -> String {
    format!(
        "What language is this text written in? Reply with ONLY the ISO 639-1 language code \
         (e.g., 'en' for English, 'hi' for Hindi, 'es' for Spanish, etc.). \
         Do not include any other text.\n\nText: {sample}"
    )
}

/// Takes the first two characters of the reply, lowercased, if both are ASCII letters.
fn parse_language_reply(reply: &str) -> Option<String> {
    let code: String = reply
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '`')
        .chars()
        .take(2)
        .collect::<String>()
        .to_ascii_lowercase();
    (code.len() == 2 && code.chars().all(|c| c.is_ascii_lowercase())).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> OllamaClient {
        OllamaClient::new()
            .with_base_url("http://127.0.0.1:9/")
            .with_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_parse_language_reply() {
        assert_eq!(parse_language_reply(" HI\n"), Some("hi".to_string()));
        assert_eq!(parse_language_reply("'es'"), Some("es".to_string()));
        assert_eq!(parse_language_reply("english"), Some("en".to_string()));
        assert_eq!(parse_language_reply("1"), None);
        assert_eq!(parse_language_reply(""), None);
    }

    #[test]
    fn test_translation_prompt_names_languages() {
        let prompt = translation_prompt("नमस्ते", "ta", Some("hi"));
        assert!(prompt.starts_with("Translate the following text from Hindi to Tamil."));
        assert!(prompt.contains("Text to translate:\nनमस्ते\n"));

        let prompt = translation_prompt("hello", "xx", None);
        assert!(prompt.starts_with("Translate the following text from the source language to xx."));
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            images: Vec::new(),
            stream: false,
            options: Some(GenerateOptions { temperature: 0.3 }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("images").is_none());
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        assert_eq!(unreachable().base_url(), "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = unreachable();
        assert!(!client.check_availability().await.available);
        assert_eq!(client.detect_language("Привет").await, "ru");
        assert!(matches!(
            client.generate("hi", None).await,
            Err(OCRError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_translation_short_circuits() {
        let result = unreachable().translate("  ", "hi", None).await.unwrap();
        assert_eq!(result.translated_text, "");
        assert_eq!(result.target_language, "hi");
    }
}
