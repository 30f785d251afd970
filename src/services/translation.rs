//! HTTP translation clients.
//!
//! - [`MyMemoryTranslator`] - free public API, no key
//! - [`LibreTranslator`] - self-hosted or public LibreTranslate instance
//! - [`GoogleTranslator`] - Google Cloud Translation v2, API key required
//!
//! All of them return an empty translation for blank input without a request.

use crate::core::OCRError;
use crate::core::traits::{TranslationResult, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";
pub const LIBRE_TRANSLATE_URL: &str = "https://libretranslate.com/translate";
pub const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn blank(text: &str, target: &str, source: Option<&str>) -> Option<TranslationResult> {
    text.trim().is_empty().then(|| TranslationResult {
        translated_text: String::new(),
        source_language: source.unwrap_or("auto").to_string(),
        target_language: target.to_string(),
    })
}

/// Rejects an empty target language code before any request is made.
pub(crate) fn require_target(target: &str) -> Result<(), OCRError> {
    if target.trim().is_empty() {
        return Err(OCRError::invalid_input("target language code is empty"));
    }
    Ok(())
}

async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, OCRError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(OCRError::generation(
        service,
        format!("request failed with {status}: {}", body.trim()),
    ))
}

/// Maps a UI language code to the locale MyMemory expects. Unmapped codes pass through.
pub fn mymemory_locale(code: &str) -> &str {
    match code {
        "hi" => "hi-IN",
        "ta" => "ta-IN",
        "te" => "te-IN",
        "kn" => "kn-IN",
        "ml" => "ml-IN",
        "mr" => "mr-IN",
        "bn" => "bn-IN",
        "gu" => "gu-IN",
        "pa" => "pa-IN",
        "ur" => "ur-PK",
        "or" => "or-IN",
        "as" => "as-IN",
        "en" => "en-US",
        "es" => "es-ES",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "zh" => "zh-CN",
        "ja" => "ja-JP",
        "ko" => "ko-KR",
        "ar" => "ar-SA",
        "ru" => "ru-RU",
        "pt" => "pt-PT",
        "it" => "it-IT",
        other => other,
    }
}

/// Client for the MyMemory translation API.
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    /// A number on success, sometimes a string on errors.
    response_status: serde_json::Value,
    response_data: Option<MyMemoryData>,
    #[serde(default)]
    response_details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: String,
}

impl Default for MyMemoryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MyMemoryTranslator {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            url: MYMEMORY_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// MyMemory has no auto-detection; an unknown source is sent as English.
fn mymemory_langpair(target: &str, source: Option<&str>) -> String {
    let source = source.map_or("en-US", mymemory_locale);
    format!("{source}|{}", mymemory_locale(target))
}

fn parse_mymemory(body: MyMemoryResponse) -> Result<String, OCRError> {
    let status = match &body.response_status {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    };
    match (status, body.response_data) {
        (Some(200), Some(data)) => Ok(data.translated_text),
        _ => Err(OCRError::generation(
            "mymemory",
            body.response_details
                .unwrap_or_else(|| format!("unexpected status {}", body.response_status)),
        )),
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, OCRError> {
        require_target(target)?;
        if let Some(result) = blank(text, target, source) {
            return Ok(result);
        }
        let langpair = mymemory_langpair(target, source);
        debug!(%langpair, "requesting MyMemory translation");
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let body: MyMemoryResponse = ensure_success("mymemory", response).await?.json().await?;
        Ok(TranslationResult {
            translated_text: parse_mymemory(body)?,
            source_language: source.unwrap_or("auto").to_string(),
            target_language: target.to_string(),
        })
    }
}

/// Client for a LibreTranslate instance.
#[derive(Debug, Clone)]
pub struct LibreTranslator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
    #[serde(default)]
    detected_language: Option<LibreDetected>,
}

#[derive(Deserialize)]
struct LibreDetected {
    language: String,
}

impl Default for LibreTranslator {
    fn default() -> Self {
        Self::new(LIBRE_TRANSLATE_URL)
    }
}

impl LibreTranslator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, OCRError> {
        require_target(target)?;
        if let Some(result) = blank(text, target, source) {
            return Ok(result);
        }
        let request = LibreRequest {
            q: text,
            source: source.unwrap_or("auto"),
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let body: LibreResponse = ensure_success("libretranslate", response)
            .await?
            .json()
            .await?;
        let source_language = body
            .detected_language
            .map(|d| d.language)
            .unwrap_or_else(|| source.unwrap_or("auto").to_string());
        Ok(TranslationResult {
            translated_text: body.translated_text,
            source_language,
            target_language: target.to_string(),
        })
    }
}

/// Client for Google Cloud Translation v2.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Serialize)]
struct GoogleRequest<'a> {
    q: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    format: &'a str,
}

#[derive(Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

impl GoogleTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: GOOGLE_TRANSLATE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, OCRError> {
        require_target(target)?;
        if let Some(result) = blank(text, target, source) {
            return Ok(result);
        }
        let request = GoogleRequest {
            q: text,
            target,
            source,
            format: "text",
        };
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let body: GoogleResponse = ensure_success("google", response).await?.json().await?;
        let translation = body
            .data
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| OCRError::generation("google", "response contained no translations"))?;
        Ok(TranslationResult {
            translated_text: translation.translated_text,
            source_language: translation
                .detected_source_language
                .unwrap_or_else(|| source.unwrap_or("auto").to_string()),
            target_language: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mymemory_locales() {
        assert_eq!(mymemory_locale("hi"), "hi-IN");
        assert_eq!(mymemory_locale("ur"), "ur-PK");
        assert_eq!(mymemory_locale("sw"), "sw");
        assert_eq!(mymemory_langpair("ta", None), "en-US|ta-IN");
        assert_eq!(mymemory_langpair("en", Some("hi")), "hi-IN|en-US");
    }

    #[test]
    fn test_parse_mymemory_success() {
        let body: MyMemoryResponse = serde_json::from_str(
            r#"{"responseData":{"translatedText":"नमस्ते"},"responseStatus":200}"#,
        )
        .unwrap();
        assert_eq!(parse_mymemory(body).unwrap(), "नमस्ते");
    }

    #[test]
    fn test_parse_mymemory_error_status() {
        let body: MyMemoryResponse = serde_json::from_str(
            r#"{"responseData":{"translatedText":""},"responseStatus":"403","responseDetails":"INVALID LANGUAGE PAIR"}"#,
        )
        .unwrap();
        let err = parse_mymemory(body).unwrap_err();
        assert!(err.to_string().contains("INVALID LANGUAGE PAIR"));
    }

    #[test]
    fn test_libre_request_shape() {
        let request = LibreRequest {
            q: "hello",
            source: "auto",
            target: "hi",
            format: "text",
            api_key: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["source"], "auto");
        assert!(json.get("api_key").is_none());
    }

    #[test]
    fn test_google_response_parse() {
        let body: GoogleResponse = serde_json::from_str(
            r#"{"data":{"translations":[{"translatedText":"hola","detectedSourceLanguage":"en"}]}}"#,
        )
        .unwrap();
        let t = &body.data.translations[0];
        assert_eq!(t.translated_text, "hola");
        assert_eq!(t.detected_source_language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_blank_input_skips_request() {
        let translator = GoogleTranslator::new("key").with_url("http://127.0.0.1:9");
        let result = translator.translate(" \n", "fr", Some("en")).await.unwrap();
        assert_eq!(result.translated_text, "");
        assert_eq!(result.source_language, "en");
    }

    #[tokio::test]
    async fn test_empty_target_is_rejected() {
        let translator = LibreTranslator::new("http://127.0.0.1:9/translate");
        let err = translator.translate("hello", " ", None).await.unwrap_err();
        assert!(matches!(err, OCRError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let translator = MyMemoryTranslator::new().with_url("http://127.0.0.1:9/get");
        let err = translator.translate("hello", "hi", None).await.unwrap_err();
        assert!(matches!(err, OCRError::Http(_)));
    }
}
