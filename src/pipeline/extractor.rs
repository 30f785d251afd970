//! A single extraction entry point over recognition and generative backends.

use crate::core::OCRError;
use crate::core::errors::ProcessingStage;
use crate::core::traits::{GenerativeService, ProgressObserver};
use crate::domain::LanguageSpec;
use crate::pipeline::orchestrator::{PipelineResult, ScriptOcrPipeline};
use crate::pipeline::progress::{PipelineStage, ProgressReporter};
use crate::processors::decode_image;
use std::sync::Arc;
use tracing::{info, warn};

/// Confidence attached to text transcribed by a generative service, which
/// reports none of its own.
pub const GENERATIVE_CONFIDENCE: f32 = 0.95;

/// Text extraction backend chosen by the caller.
///
/// Probing whether a generative service is reachable is left to the caller
/// ([`GenerativeService::check_availability`]); `extract` never probes.
#[derive(Debug, Clone)]
pub enum TextExtractor {
    /// Conditioning, script routing and an OCR engine.
    Recognition(ScriptOcrPipeline),
    /// A vision model asked to transcribe the original image.
    Generative(Arc<dyn GenerativeService>),
}

impl TextExtractor {
    /// Backend name for logs and API responses.
    pub fn backend_name(&self) -> &str {
        match self {
            TextExtractor::Recognition(pipeline) => pipeline.engine_name(),
            TextExtractor::Generative(service) => service.name(),
        }
    }

    /// Extracts text from `bytes`.
    ///
    /// For the generative backend, the image is decoded only to validate it and
    /// learn its size; the service receives the original bytes unconditioned.
    /// `language` is recorded in the result but does not steer the model.
    pub async fn extract(
        &self,
        bytes: &[u8],
        language: Option<LanguageSpec>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<PipelineResult, OCRError> {
        match self {
            TextExtractor::Recognition(pipeline) => pipeline.run(bytes, language, observer).await,
            TextExtractor::Generative(service) => {
                let reporter = ProgressReporter::new(observer);
                let result = transcribe(service.as_ref(), bytes, language, &reporter).await;
                if let Err(e) = &result {
                    warn!(service = service.name(), error = %e, "generative extraction failed");
                    reporter.fail();
                }
                result
            }
        }
    }
}

async fn transcribe(
    service: &dyn GenerativeService,
    bytes: &[u8],
    language: Option<LanguageSpec>,
    reporter: &ProgressReporter,
) -> Result<PipelineResult, OCRError> {
    reporter.enter(PipelineStage::Preprocessing);
    let owned = bytes.to_vec();
    let (width, height) = tokio::task::spawn_blocking(move || {
        decode_image(&owned, None).map(|decoded| decoded.buffer.dimensions())
    })
    .await
    .map_err(|e| {
        OCRError::processing(
            ProcessingStage::PipelineExecution,
            "decoding task did not complete",
            e,
        )
    })??;

    let recognizing = reporter.enter(PipelineStage::Recognizing);
    let text = service.extract_text(bytes, &recognizing).await?;
    let text = text.trim().to_string();
    info!(
        service = service.name(),
        chars = text.chars().count(),
        "text transcribed"
    );
    reporter.enter(PipelineStage::Done);

    Ok(PipelineResult {
        text,
        confidence: Some(GENERATIVE_CONFIDENCE),
        detected_script: None,
        languages: language.unwrap_or_else(LanguageSpec::english),
        image_width: width,
        image_height: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Availability;
    use crate::pipeline::orchestrator::tests::{StubDetector, StubEngine, png_bytes};
    use crate::pipeline::progress::StageProgress;
    use crate::pipeline::progress::tests::RecordingObserver;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct StubVision {
        probed: Mutex<bool>,
    }

    #[async_trait]
    impl GenerativeService for StubVision {
        fn name(&self) -> &str {
            "vision-stub"
        }

        async fn check_availability(&self) -> Availability {
            *self.probed.lock().unwrap() = true;
            Availability::default()
        }

        async fn extract_text(
            &self,
            image: &[u8],
            _progress: &StageProgress,
        ) -> Result<String, OCRError> {
            assert!(!image.is_empty());
            Ok("\n  Total: $42.00 \n".to_string())
        }

        async fn generate(&self, _prompt: &str, _t: Option<f32>) -> Result<String, OCRError> {
            Err(OCRError::generation("vision-stub", "not supported"))
        }
    }

    #[tokio::test]
    async fn test_generative_backend_uses_fixed_confidence() {
        let service = Arc::new(StubVision::default());
        let extractor = TextExtractor::Generative(service.clone());
        let observer = Arc::new(RecordingObserver::default());

        let result = extractor
            .extract(&png_bytes(64, 32), None, observer.clone())
            .await
            .unwrap();

        assert_eq!(result.text, "Total: $42.00");
        assert_eq!(result.confidence, Some(GENERATIVE_CONFIDENCE));
        assert_eq!(result.detected_script, None);
        assert_eq!(result.languages, LanguageSpec::english());
        assert_eq!((result.image_width, result.image_height), (64, 32));
        assert_eq!(observer.values(), vec![0.1, 0.5, 1.0]);
        assert!(!*service.probed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_generative_backend_rejects_unreadable_input() {
        let extractor = TextExtractor::Generative(Arc::new(StubVision::default()));
        let observer = Arc::new(RecordingObserver::default());
        let err = extractor
            .extract(&[], None, observer.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, OCRError::Decode(_)));
        assert_eq!(observer.values(), vec![0.1]);
    }

    #[tokio::test]
    async fn test_recognition_backend_delegates_to_pipeline() {
        let pipeline = ScriptOcrPipeline::new(
            Arc::new(StubEngine::answering(" ok ")),
            Arc::new(StubDetector::answering(Ok("Cyrillic"))),
        );
        let extractor = TextExtractor::Recognition(pipeline);
        assert_eq!(extractor.backend_name(), "stub");

        let result = extractor
            .extract(&png_bytes(20, 20), None, Arc::new(RecordingObserver::default()))
            .await
            .unwrap();
        assert_eq!(result.text, "ok");
        assert_eq!(result.languages.to_string(), "rus");
    }
}
