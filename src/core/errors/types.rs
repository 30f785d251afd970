//! Core error types for the recognition pipeline.
//!
//! This module defines the fundamental error types used throughout the crate,
//! including the main OCRError enum, the DecodeError raised by the image decoder
//! and the ProcessingStage enum used to tag conditioning failures.

use thiserror::Error;

/// Errors raised while turning encoded bytes into a pixel buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("image data is empty")]
    Empty,
    /// The bytes are not a raster format the decoder understands.
    #[error("unsupported or malformed image")]
    Unsupported(#[source] image::ImageError),
    /// The decoded image has a zero width or height.
    #[error("image has zero dimensions ({width}x{height})")]
    ZeroDimensions {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
    /// Raw samples do not match the declared dimensions.
    #[error("buffer of {actual} samples does not match {width}x{height} RGBA ({expected} samples)")]
    SampleCount {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Expected sample count (`width * height * 4`).
        expected: usize,
        /// Actual sample count.
        actual: usize,
    },
}

/// Enum representing different stages of processing in the pipeline.
///
/// This enum is used to identify which stage an error occurred in,
/// providing context for debugging and error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred while encoding the conditioned buffer.
    Encoding,
    /// Error occurred during pipeline execution.
    PipelineExecution,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Encoding => write!(f, "encoding"),
            ProcessingStage::PipelineExecution => write!(f, "pipeline execution"),
        }
    }
}

/// Enum representing the errors that can occur while extracting text.
///
/// `Decode`, `ModelLoad`, `Recognition` and `Processing` are fatal for a pipeline
/// run. `Classification` is only ever produced by script detectors and is absorbed
/// by the classifier before it can reach a caller.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The input image could not be decoded.
    #[error("image decode failed")]
    Decode(#[from] DecodeError),

    /// Script detection failed. Never surfaced by the pipeline.
    #[error("script detection failed: {message}")]
    Classification {
        /// A message describing the failure.
        message: String,
    },

    /// The recognition engine could not load the requested language set.
    #[error("failed to load language models '{languages}': {reason}")]
    ModelLoad {
        /// The language set that was requested, e.g. `hin+mar+san`.
        languages: String,
        /// Short reason string.
        reason: String,
        /// Underlying source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The recognition engine ran but did not produce a result.
    #[error("recognition failed in engine '{engine}': {context}")]
    Recognition {
        /// The name of the engine where recognition failed.
        engine: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A generative or translation service returned an error.
    #[error("service '{service}' failed: {message}")]
    Generation {
        /// Name of the service.
        service: String,
        /// A message describing the failure.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("http")]
    Http(#[from] reqwest::Error),
}

impl From<image::ImageError> for OCRError {
    /// Converts an image::ImageError to OCRError::Decode.
    fn from(error: image::ImageError) -> Self {
        Self::Decode(DecodeError::Unsupported(error))
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    /// Converts a ConfigError to OCRError::ConfigError.
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl OCRError {
    /// Creates a model load error with a reason and an optional source.
    pub fn model_load(
        languages: impl std::fmt::Display,
        reason: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            languages: languages.to_string(),
            reason: reason.into(),
            source,
        }
    }

    /// Creates a recognition error for the given engine.
    pub fn recognition(engine: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Recognition {
            engine: engine.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Wraps a failure that happened inside a processing stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a classification error. Only script detectors should build these.
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    /// Creates an error for a failing generative or translation service.
    pub fn generation(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns the single human-readable message shown to the user for a failed run.
    ///
    /// Only the top-level cause is named; the `source` chain stays available for logs.
    pub fn user_message(&self) -> String {
        match self {
            OCRError::Decode(_) => {
                "The image could not be read. Please upload a PNG, JPEG, WebP, BMP or TIFF file."
                    .to_string()
            }
            OCRError::ModelLoad { languages, .. } => format!(
                "Language models '{languages}' could not be loaded. Try selecting a language explicitly."
            ),
            OCRError::Recognition { .. } | OCRError::Processing { .. } => {
                "Failed to extract text from image".to_string()
            }
            OCRError::Generation { service, .. } => {
                format!("The {service} service is unavailable. Make sure it is running.")
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_image_error_maps_to_decode() {
        let err = image::load_from_memory(b"definitely not an image").unwrap_err();
        let err: OCRError = err.into();
        assert!(matches!(err, OCRError::Decode(DecodeError::Unsupported(_))));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_model_load_message_names_languages() {
        let err = OCRError::model_load("hin+mar+san", "missing pack 'san'", None);
        assert_eq!(
            err.to_string(),
            "failed to load language models 'hin+mar+san': missing pack 'san'"
        );
        assert!(err.user_message().contains("hin+mar+san"));
    }

    #[test]
    fn test_recognition_user_message_is_generic() {
        let err = OCRError::recognition("tesseract", "exit status 1");
        assert_eq!(err.user_message(), "Failed to extract text from image");
    }

    #[test]
    fn test_processing_display_includes_stage() {
        let io = std::io::Error::other("boom");
        let err = OCRError::processing(ProcessingStage::Encoding, "png write", io);
        assert_eq!(err.to_string(), "encoding failed: png write");
    }
}
