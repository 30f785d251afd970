//! The script-routed recognition pipeline.
//!
//! # Main APIs
//!
//! - [`ScriptOcrPipeline`] - decode, condition, detect the script, route, recognize
//! - [`TextExtractor`] - one entry point over the pipeline and generative services
//! - [`ProgressReporter`] and the observers in [`progress`] - progress of a run

pub mod classifier;
pub mod extractor;
pub mod orchestrator;
pub mod progress;

pub use classifier::ScriptClassifier;
pub use extractor::{GENERATIVE_CONFIDENCE, TextExtractor};
pub use orchestrator::{PipelineResult, PreparedImage, ScriptOcrPipeline, prepare_image};
pub use progress::{
    ChannelObserver, FnObserver, NoopObserver, PipelineStage, ProgressEvent, ProgressReporter,
    StageProgress,
};
