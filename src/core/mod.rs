//! The core module of the pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration management
//! - Error handling
//! - Traits defining the collaborator interfaces
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{
    ConditioningConfig, ConfigError, ConfigValidator, PageSegmentation, ParallelPolicy,
    PipelineConfig, RecognitionParams,
};
pub use errors::{DecodeError, OCRError, OcrResult, ProcessingStage};
pub use traits::{
    Availability, GenerativeService, ProgressObserver, RawConfidence, RecognitionEngine,
    RecognitionOutput, ScriptDetector, TranslationResult, Translator,
};
