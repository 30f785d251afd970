//! Configuration types for the lipi server and CLI.

use clap::ValueEnum;
use lipi::core::PipelineConfig;
use std::path::PathBuf;

/// Where text extraction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Conditioning, script routing and the tesseract CLI.
    Tesseract,
    /// Vision model served by Ollama.
    Ollama,
}

/// Which service translates extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslatorKind {
    #[value(name = "mymemory")]
    MyMemory,
    Libre,
    Google,
    Ollama,
}

/// CLI output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Text,
}

/// Ollama connection settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub vision_model: String,
    pub text_model: String,
}

/// Translation settings.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub kind: TranslatorKind,
    pub libre_url: String,
    pub libre_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

/// Configuration for text extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub backend: Backend,
    pub pipeline: PipelineConfig,
    pub tesseract_binary: PathBuf,
    pub tessdata_dir: Option<PathBuf>,
    pub ollama: OllamaConfig,
    pub translator: TranslatorConfig,
}

impl ExtractConfig {
    /// Whether any configured feature talks to Ollama.
    pub fn uses_ollama(&self) -> bool {
        self.backend == Backend::Ollama || self.translator.kind == TranslatorKind::Ollama
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub extract: ExtractConfig,
    pub host: String,
    pub port: u16,
}
