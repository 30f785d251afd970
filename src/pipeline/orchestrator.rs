//! # Stage Definition: Script-Routed Recognition
//!
//! This service is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: Raw encoded image bytes and an optional pinned [`LanguageSpec`].
//! - **Outputs**: [`PipelineResult`] with trimmed text, normalized confidence and the
//!   language set that was used.
//! - **Logging**: Info at stage boundaries (routing decision, recognition result
//!   size), warn when a run fails.
//! - **Invariants**:
//!     - Checkpoints are emitted in stage order and never decrease.
//!     - A failed run emits no further events after its last checkpoint.
//!     - Script detection runs only when no language is pinned.
//!     - Nothing is retried.

use crate::core::OCRError;
use crate::core::config::{ConditioningConfig, PipelineConfig};
use crate::core::errors::ProcessingStage;
use crate::core::traits::{ProgressObserver, RecognitionEngine, ScriptDetector};
use crate::domain::{LanguageSpec, ScriptLabel};
use crate::pipeline::classifier::ScriptClassifier;
use crate::pipeline::progress::{PipelineStage, ProgressReporter};
use crate::processors::{EncodedImage, PixelConditioner, decode_image, encode_png};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Recognized text with surrounding whitespace removed.
    pub text: String,
    /// Confidence in `[0, 1]`, if the engine reported one.
    pub confidence: Option<f32>,
    /// Script reported by detection. `None` when the language was pinned.
    pub detected_script: Option<ScriptLabel>,
    /// Language packs recognition ran with.
    pub languages: LanguageSpec,
    /// Width of the input image before upscaling.
    pub image_width: u32,
    /// Height of the input image before upscaling.
    pub image_height: u32,
}

/// A decoded, upscaled and conditioned image ready for collaborators.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// PNG of the conditioned pixels.
    pub image: EncodedImage,
    pub original_width: u32,
    pub original_height: u32,
}

/// Decodes and conditions `bytes` on the blocking thread pool.
///
/// # Errors
///
/// * `OCRError::Decode` if the bytes are empty or not a supported image.
/// * `OCRError::Processing` if encoding fails or the blocking task is lost.
pub async fn prepare_image(
    bytes: Vec<u8>,
    config: &ConditioningConfig,
) -> Result<PreparedImage, OCRError> {
    let upscale_target = config.upscale_target;
    let conditioner = PixelConditioner::new(config.parallel.clone());

    tokio::task::spawn_blocking(move || -> Result<PreparedImage, OCRError> {
        let decoded = decode_image(&bytes, upscale_target)?;
        debug!(
            original_width = decoded.original_width,
            original_height = decoded.original_height,
            upscaled = decoded.was_upscaled(),
            "image decoded"
        );
        let buffer = conditioner.condition(decoded.buffer);
        let image = encode_png(&buffer)?;
        Ok(PreparedImage {
            image,
            original_width: decoded.original_width,
            original_height: decoded.original_height,
        })
    })
    .await
    .map_err(|e| {
        OCRError::processing(
            ProcessingStage::PipelineExecution,
            "conditioning task did not complete",
            e,
        )
    })?
}

/// Conditions an image, picks recognition languages from its script, and runs
/// a [`RecognitionEngine`].
///
/// # Example
///
/// ```rust,no_run
/// use lipi::pipeline::{NoopObserver, ScriptOcrPipeline};
/// use lipi::services::TesseractEngine;
/// use std::sync::Arc;
///
/// # async fn demo(bytes: Vec<u8>) -> Result<(), lipi::core::OCRError> {
/// let tesseract = Arc::new(TesseractEngine::new());
/// let pipeline = ScriptOcrPipeline::new(tesseract.clone(), tesseract);
/// let result = pipeline.run(&bytes, None, Arc::new(NoopObserver)).await?;
/// println!("{} ({})", result.text, result.languages);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScriptOcrPipeline {
    engine: Arc<dyn RecognitionEngine>,
    classifier: ScriptClassifier,
    config: PipelineConfig,
}

impl ScriptOcrPipeline {
    /// Creates a pipeline with the default configuration.
    pub fn new(engine: Arc<dyn RecognitionEngine>, detector: Arc<dyn ScriptDetector>) -> Self {
        Self {
            engine,
            classifier: ScriptClassifier::new(detector),
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the recognition engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Runs the pipeline on one image.
    ///
    /// With `language` set, script detection is skipped and the given packs are
    /// loaded. Progress goes to `observer`; dropping the returned future cancels
    /// the run.
    ///
    /// # Errors
    ///
    /// * `OCRError::Decode` for unreadable input.
    /// * `OCRError::ModelLoad` if the engine cannot load the language packs.
    /// * `OCRError::Recognition` if the engine fails.
    /// * `OCRError::Processing` if conditioning fails.
    pub async fn run(
        &self,
        bytes: &[u8],
        language: Option<LanguageSpec>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<PipelineResult, OCRError> {
        let reporter = ProgressReporter::new(observer);
        let result = self.execute(bytes, language, &reporter).await;
        if let Err(e) = &result {
            warn!(stage = %reporter.stage(), error = %e, "pipeline run failed");
            reporter.fail();
        }
        result
    }

    async fn execute(
        &self,
        bytes: &[u8],
        language: Option<LanguageSpec>,
        reporter: &ProgressReporter,
    ) -> Result<PipelineResult, OCRError> {
        reporter.enter(PipelineStage::Preprocessing);
        let prepared = prepare_image(bytes.to_vec(), &self.config.conditioning).await?;

        let (languages, detected_script) = match language {
            Some(languages) => (languages, None),
            None => {
                let script = self.classifier.classify(&prepared.image, reporter).await;
                (script.language_spec(), Some(script))
            }
        };
        info!(
            languages = %languages,
            script = detected_script.as_ref().map(ScriptLabel::name),
            engine = self.engine.name(),
            "recognition languages selected"
        );

        let loading = reporter.enter(PipelineStage::LoadingModels);
        self.engine.load_languages(&languages, &loading).await?;

        let recognizing = reporter.enter(PipelineStage::Recognizing);
        let output = self
            .engine
            .recognize(
                &prepared.image,
                &languages,
                &self.config.recognition,
                &recognizing,
            )
            .await?;

        let text = output.text.trim().to_string();
        let confidence = output.confidence.normalize();
        info!(chars = text.chars().count(), confidence, "text recognized");
        reporter.enter(PipelineStage::Done);

        Ok(PipelineResult {
            text,
            confidence,
            detected_script,
            languages,
            image_width: prepared.original_width,
            image_height: prepared.original_height,
        })
    }
}
