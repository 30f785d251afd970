//! Error handling for the recognition pipeline.

mod types;

pub use types::{DecodeError, OCRError, ProcessingStage};

/// Convenience result alias used across the crate.
pub type OcrResult<T> = Result<T, OCRError>;
