//! # Stage Definition: Script Classification
//!
//! This service is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: The conditioned image, encoded for transport.
//! - **Outputs**: A [`ScriptLabel`]; never an error.
//! - **Logging**: Warns when the detector fails or answers with something that is
//!   not a script name, and reports which label was used instead.
//! - **Invariants**:
//!     - Exactly one checkpoint event is emitted before the detector is invoked.
//!     - Detector failures, empty answers and malformed answers all yield `Latin`.

use crate::core::traits::ScriptDetector;
use crate::domain::ScriptLabel;
use crate::pipeline::progress::{PipelineStage, ProgressReporter};
use crate::processors::EncodedImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest answer still accepted as a script name.
const MAX_LABEL_LEN: usize = 64;

/// Asks a [`ScriptDetector`] for the script of an image, with a safe default.
#[derive(Debug, Clone)]
pub struct ScriptClassifier {
    detector: Arc<dyn ScriptDetector>,
}

impl ScriptClassifier {
    pub fn new(detector: Arc<dyn ScriptDetector>) -> Self {
        Self { detector }
    }

    /// Enters the script detection stage and classifies `image`.
    pub async fn classify(&self, image: &EncodedImage, reporter: &ProgressReporter) -> ScriptLabel {
        let progress = reporter.enter(PipelineStage::ScriptDetection);
        match self.detector.detect_script(image, &progress).await {
            Ok(answer) => match parse_label(&answer) {
                Some(label) => {
                    debug!(script = %label, "script detected");
                    label
                }
                None => {
                    warn!(answer = %answer, "script detector returned no usable label, assuming Latin");
                    ScriptLabel::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "script detection failed, assuming Latin");
                ScriptLabel::default()
            }
        }
    }
}

/// Accepts a single script name made of letters, spaces, `_` or `-`.
fn parse_label(answer: &str) -> Option<ScriptLabel> {
    let name = answer.trim();
    let well_formed = !name.is_empty()
        && name.len() <= MAX_LABEL_LEN
        && name
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '_' || c == '-');
    well_formed.then(|| ScriptLabel::from_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OCRError;
    use crate::pipeline::progress::StageProgress;
    use crate::pipeline::progress::tests::RecordingObserver;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FixedDetector(Result<&'static str, &'static str>);

    #[async_trait]
    impl ScriptDetector for FixedDetector {
        async fn detect_script(
            &self,
            _image: &EncodedImage,
            _progress: &StageProgress,
        ) -> Result<String, OCRError> {
            self.0
                .map(str::to_string)
                .map_err(OCRError::classification)
        }
    }

    fn image() -> EncodedImage {
        EncodedImage::new(vec![0; 8], 1, 1, "image/png")
    }

    async fn classify(answer: Result<&'static str, &'static str>) -> ScriptLabel {
        ScriptClassifier::new(Arc::new(FixedDetector(answer)))
            .classify(&image(), &ProgressReporter::silent())
            .await
    }

    #[tokio::test]
    async fn test_known_label() {
        assert_eq!(classify(Ok("Devanagari")).await, ScriptLabel::Devanagari);
        assert_eq!(classify(Ok(" tamil\n")).await, ScriptLabel::Tamil);
    }

    #[tokio::test]
    async fn test_unknown_label_is_kept() {
        assert_eq!(
            classify(Ok("Ethiopic")).await,
            ScriptLabel::Other("Ethiopic".to_string())
        );
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_latin() {
        assert_eq!(classify(Err("detector offline")).await, ScriptLabel::Latin);
        assert_eq!(classify(Ok("")).await, ScriptLabel::Latin);
        assert_eq!(classify(Ok("Script: 42 {}")).await, ScriptLabel::Latin);
    }

    #[tokio::test]
    async fn test_emits_detection_checkpoint() {
        let observer = Arc::new(RecordingObserver::default());
        let reporter = ProgressReporter::new(observer.clone());
        ScriptClassifier::new(Arc::new(FixedDetector(Err("boom"))))
            .classify(&image(), &reporter)
            .await;

        let events = observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage, PipelineStage::ScriptDetection);
        assert_eq!(events[0].progress, 0.2);
    }
}
