//! # Lipi
//!
//! Image conditioning and script-aware language routing for OCR.
//!
//! Lipi takes an uploaded image, normalizes it into a form recognition engines read
//! reliably, works out which writing system the image is in, and runs recognition
//! with the language packs that belong to that script. Progress is reported through
//! an observer with fixed checkpoints so a UI can show a steady progress bar.
//!
//! ## Features
//!
//! - Deterministic pixel conditioning: upscaling, grayscale, sharpening, contrast stretch
//! - Script detection with a total mapping from script names to language packs
//! - Tesseract recognition through the installed CLI
//! - Optional vision-model transcription and translation via Ollama
//! - MyMemory, LibreTranslate and Google translation clients
//! - Rayon-backed parallelism for large images
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors and the collaborator traits
//! * [`domain`] - Script labels, language specs and the language catalog
//! * [`pipeline`] - The staged pipeline, script classifier and progress reporting
//! * [`processors`] - Decoding, conditioning and PNG encoding
//! * [`services`] - Tesseract, Ollama and translation API clients
//! * [`utils`] - Tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lipi::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tesseract = Arc::new(TesseractEngine::new());
//! let pipeline = ScriptOcrPipeline::new(tesseract.clone(), tesseract);
//!
//! let bytes = std::fs::read("receipt.jpg")?;
//! let observer = Arc::new(FnObserver::new(|event: &ProgressEvent| {
//!     println!("{:>3.0}% {}", event.progress * 100.0, event.status);
//! }));
//!
//! let result = pipeline.run(&bytes, None, observer).await?;
//! println!("[{}] {}", result.languages, result.text);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod services;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use lipi::prelude::*;
/// ```
///
/// Included items cover a typical run:
/// - Pipeline entry points (`ScriptOcrPipeline`, `TextExtractor`, `PipelineResult`)
/// - Progress observers (`FnObserver`, `ChannelObserver`, `NoopObserver`, `ProgressEvent`)
/// - Language routing (`LanguageSpec`, `ScriptLabel`)
/// - Bundled collaborators (`TesseractEngine`, `OllamaClient`)
/// - Essential error and result types (`OCRError`, `OcrResult`)
///
/// Traits and lower level helpers live in their own modules
/// (`lipi::core::traits`, `lipi::processors`, `lipi::services`).
pub mod prelude {
    pub use crate::pipeline::{
        ChannelObserver, FnObserver, NoopObserver, PipelineResult, PipelineStage, ProgressEvent,
        ScriptOcrPipeline, TextExtractor,
    };

    pub use crate::core::{OCRError, OcrResult, PipelineConfig};
    pub use crate::domain::{LanguageSpec, ScriptLabel};
    pub use crate::services::{OllamaClient, TesseractEngine};
}
