//! Trait definitions for the collaborators of the pipeline.
//!
//! The pipeline owns pixel conditioning and routing. Everything that needs a model
//! sits behind one of these traits:
//!
//! - **RecognitionEngine**: loads language packs and turns a conditioned image into text
//! - **ScriptDetector**: names the writing system of a conditioned image
//! - **GenerativeService**: vision/text generation used as an alternative extractor
//! - **Translator**: translates extracted text
//! - **ProgressObserver**: receives progress events of a run
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ decode + │──▶│ScriptDetect │──▶│ route script │──▶│RecognitionEngine │
//! │ condition│   │(optional)   │   │ → languages  │   │• load_languages  │
//! └──────────┘   └─────────────┘   └──────────────┘   │• recognize       │
//!                                                     └──────────────────┘
//! ```

use crate::core::OCRError;
use crate::core::config::RecognitionParams;
use crate::domain::LanguageSpec;
use crate::pipeline::progress::{ProgressEvent, StageProgress};
use crate::processors::EncodedImage;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

/// Confidence as reported by a recognition engine, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawConfidence {
    /// On a 0..=100 scale.
    Percent(f32),
    /// On a 0..=1 scale.
    Unit(f32),
    /// The engine did not report a confidence.
    Unknown,
}

impl RawConfidence {
    /// Normalizes to `[0, 1]`. Non-finite values are treated as unknown.
    pub fn normalize(self) -> Option<f32> {
        let value = match self {
            RawConfidence::Percent(p) => p / 100.0,
            RawConfidence::Unit(u) => u,
            RawConfidence::Unknown => return None,
        };
        value.is_finite().then(|| value.clamp(0.0, 1.0))
    }
}

/// Text returned by a recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutput {
    pub text: String,
    pub confidence: RawConfidence,
}

/// Trait for OCR engines that recognize text with preloaded language packs.
#[async_trait]
pub trait RecognitionEngine: Send + Sync + Debug {
    /// Short engine name used in errors and logs.
    fn name(&self) -> &str;

    /// Makes the packs in `languages` ready for recognition.
    ///
    /// # Errors
    ///
    /// `OCRError::ModelLoad` if any pack is unavailable.
    async fn load_languages(
        &self,
        languages: &LanguageSpec,
        progress: &StageProgress,
    ) -> Result<(), OCRError>;

    /// Recognizes the text in a conditioned image.
    ///
    /// # Errors
    ///
    /// `OCRError::Recognition` if the engine fails.
    async fn recognize(
        &self,
        image: &EncodedImage,
        languages: &LanguageSpec,
        params: &RecognitionParams,
        progress: &StageProgress,
    ) -> Result<RecognitionOutput, OCRError>;
}

/// Trait for detectors that name the dominant writing system of an image.
#[async_trait]
pub trait ScriptDetector: Send + Sync + Debug {
    /// Returns the raw script label, e.g. `"Devanagari"`.
    ///
    /// Failures should be reported as `OCRError::Classification`; callers fall
    /// back to Latin.
    async fn detect_script(
        &self,
        image: &EncodedImage,
        progress: &StageProgress,
    ) -> Result<String, OCRError>;
}

/// Result of probing a generative service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    /// Models the service reports as installed.
    pub models: Vec<String>,
}

/// Trait for vision and text generation services.
#[async_trait]
pub trait GenerativeService: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Probes whether the service is reachable. Never fails; an unreachable
    /// service is reported as unavailable.
    async fn check_availability(&self) -> Availability;

    /// Transcribes all text in an encoded image.
    async fn extract_text(
        &self,
        image: &[u8],
        progress: &StageProgress,
    ) -> Result<String, OCRError>;

    /// Completes a text prompt. `temperature` overrides the service default.
    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, OCRError>;
}

/// A translated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub translated_text: String,
    /// Source language code, as given or as detected by the service.
    pub source_language: String,
    pub target_language: String,
}

/// Trait for translation services.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Translates `text` into `target`. `source` of `None` asks the service to
    /// detect the source language.
    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, OCRError>;
}

/// Receives progress events of a pipeline run.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_normalization() {
        assert_eq!(RawConfidence::Percent(87.5).normalize(), Some(0.875));
        assert_eq!(RawConfidence::Unit(0.4).normalize(), Some(0.4));
        assert_eq!(RawConfidence::Percent(140.0).normalize(), Some(1.0));
        assert_eq!(RawConfidence::Percent(-1.0).normalize(), Some(0.0));
        assert_eq!(RawConfidence::Unit(f32::NAN).normalize(), None);
        assert_eq!(RawConfidence::Unknown.normalize(), None);
    }
}
