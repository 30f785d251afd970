//! Implementations of the collaborator traits.
//!
//! - [`TesseractEngine`] - recognition and script detection via the `tesseract` CLI
//! - [`OllamaClient`] - vision transcription, translation and language detection
//! - [`MyMemoryTranslator`], [`LibreTranslator`], [`GoogleTranslator`] - translation APIs

pub mod ollama;
pub mod tesseract;
pub mod translation;

pub use ollama::{DEFAULT_OLLAMA_URL, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL, OllamaClient};
pub use tesseract::TesseractEngine;
pub use translation::{
    GoogleTranslator, LIBRE_TRANSLATE_URL, LibreTranslator, MyMemoryTranslator, mymemory_locale,
};
