//! Lipi server and CLI
//!
//! A binary for script-aware text extraction and translation via CLI or HTTP server.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! lipi-server extract --file receipt.jpg
//! lipi-server extract --url "https://example.com/sign.png" --lang hi --translate-to en
//! lipi-server extract --file page.png --backend ollama --output json
//! lipi-server condition --file scan.jpg --out scan-conditioned.png
//! lipi-server languages --region india
//! ```
//!
//! ## Server Mode
//! ```bash
//! lipi-server serve --port 8080
//! ```

mod cli;
mod config;
mod ocr;
mod server;

use clap::{Args, Parser, Subcommand};
use config::{
    Backend, ExtractConfig, OllamaConfig, OutputFormat, ServerConfig, TranslatorConfig,
    TranslatorKind,
};
use lipi::core::PipelineConfig;
use lipi::domain::Region;
use lipi::services::{
    DEFAULT_OLLAMA_URL, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL, LIBRE_TRANSLATE_URL,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "lipi-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Script-aware text extraction via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by `extract` and `serve`.
#[derive(Args)]
struct EngineArgs {
    /// Extraction backend
    #[arg(long, value_enum, default_value = "tesseract", env = "LIPI_BACKEND")]
    backend: Backend,

    /// Pipeline configuration file (JSON)
    #[arg(long, env = "LIPI_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the tesseract executable
    #[arg(long, default_value = "tesseract", env = "LIPI_TESSERACT")]
    tesseract: PathBuf,

    /// Directory holding the traineddata files
    #[arg(long = "tessdata-dir", env = "TESSDATA_PREFIX")]
    tessdata_dir: Option<PathBuf>,

    /// Ollama server URL
    #[arg(long = "ollama-url", default_value = DEFAULT_OLLAMA_URL, env = "LIPI_OLLAMA_URL")]
    ollama_url: String,

    /// Ollama model used for image transcription
    #[arg(long = "vision-model", default_value = DEFAULT_VISION_MODEL, env = "LIPI_VISION_MODEL")]
    vision_model: String,

    /// Ollama model used for translation and language detection
    #[arg(long = "text-model", default_value = DEFAULT_TEXT_MODEL, env = "LIPI_TEXT_MODEL")]
    text_model: String,

    /// Translation service
    #[arg(long, value_enum, default_value = "mymemory", env = "LIPI_TRANSLATOR")]
    translator: TranslatorKind,

    /// LibreTranslate endpoint
    #[arg(long = "libre-url", default_value = LIBRE_TRANSLATE_URL, env = "LIPI_LIBRE_URL")]
    libre_url: String,

    /// LibreTranslate API key
    #[arg(long = "libre-api-key", env = "LIPI_LIBRE_API_KEY")]
    libre_api_key: Option<String>,

    /// Google Cloud Translation API key
    #[arg(long = "google-api-key", env = "LIPI_GOOGLE_API_KEY")]
    google_api_key: Option<String>,
}

impl EngineArgs {
    fn into_config(self) -> Result<ExtractConfig, Box<dyn std::error::Error + Send + Sync>> {
        let pipeline = load_pipeline_config(self.config.as_deref())?;
        Ok(ExtractConfig {
            backend: self.backend,
            pipeline,
            tesseract_binary: self.tesseract,
            tessdata_dir: self.tessdata_dir,
            ollama: OllamaConfig {
                url: self.ollama_url,
                vision_model: self.vision_model,
                text_model: self.text_model,
            },
            translator: TranslatorConfig {
                kind: self.translator,
                libre_url: self.libre_url,
                libre_api_key: self.libre_api_key,
                google_api_key: self.google_api_key,
            },
        })
    }
}

/// Loads the pipeline configuration and sizes the rayon pool from it.
fn load_pipeline_config(
    path: Option<&Path>,
) -> Result<PipelineConfig, Box<dyn std::error::Error + Send + Sync>> {
    let config = match path {
        Some(path) => {
            info!("Loading pipeline configuration from {}", path.display());
            PipelineConfig::from_json_file(path)?
        }
        None => PipelineConfig::default(),
    };
    if config.conditioning.parallel.install_global_thread_pool()? {
        info!(
            threads = ?config.conditioning.parallel.max_threads,
            "Configured conditioning thread pool"
        );
    }
    Ok(config)
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single image
    Extract {
        /// URL of the image to process
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,

        /// Local file path of the image to process
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Language code (hi) or pack set (hin+eng). Skips script detection.
        #[arg(long, env = "LIPI_LANG")]
        lang: Option<String>,

        /// Translate the extracted text into this language code
        #[arg(long = "translate-to")]
        translate_to: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        output: OutputFormat,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Write the conditioned image that recognition would see
    Condition {
        /// Input image
        #[arg(long)]
        file: PathBuf,

        /// Output PNG path
        #[arg(long)]
        out: PathBuf,

        /// Pipeline configuration file (JSON)
        #[arg(long, env = "LIPI_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List the supported languages
    Languages {
        /// Only languages in this region (india, global, europe, asia, middle-east, africa)
        #[arg(long)]
        region: Option<Region>,

        /// Case-insensitive search over names and codes
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "8080", env = "LIPI_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "LIPI_HOST")]
        host: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    lipi::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            url,
            file,
            lang,
            translate_to,
            output,
            engine,
        } => {
            let config = engine.into_config()?;
            let language = lang.as_deref().map(ocr::parse_language).transpose()?;

            if let Some(url) = url {
                info!("Processing URL: {}", url);
                cli::process_url(&url, &config, language, translate_to.as_deref(), output).await?;
            } else if let Some(file) = file {
                info!("Processing file: {}", file.display());
                cli::process_file(&file, &config, language, translate_to.as_deref(), output)
                    .await?;
            }
        }
        Commands::Condition { file, out, config } => {
            let pipeline = load_pipeline_config(config.as_deref())?;
            cli::condition_file(&file, &out, &pipeline).await?;
        }
        Commands::Languages {
            region,
            search,
            output,
        } => {
            cli::list_languages(region, search.as_deref(), output)?;
        }
        Commands::Serve { port, host, engine } => {
            let config = ServerConfig {
                extract: engine.into_config()?,
                host,
                port,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
