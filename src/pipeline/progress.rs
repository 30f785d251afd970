//! Progress reporting for pipeline runs.
//!
//! A run moves through [`PipelineStage`]s. Entering a stage emits exactly one
//! checkpoint event; collaborators report finer progress through the
//! [`StageProgress`] handle they receive, which maps it into the window between
//! the stage's checkpoint and the next one. The reporter clamps every value so
//! that the sequence an observer sees never decreases.

use crate::core::traits::ProgressObserver;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// State of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Preprocessing,
    ScriptDetection,
    LoadingModels,
    Recognizing,
    Done,
    Failed,
}

impl PipelineStage {
    /// Progress value emitted when the stage is entered. `Idle` and `Failed` have none.
    pub fn checkpoint(self) -> Option<f32> {
        match self {
            PipelineStage::Preprocessing => Some(0.1),
            PipelineStage::ScriptDetection => Some(0.2),
            PipelineStage::LoadingModels => Some(0.3),
            PipelineStage::Recognizing => Some(0.5),
            PipelineStage::Done => Some(1.0),
            PipelineStage::Idle | PipelineStage::Failed => None,
        }
    }

    /// Upper bound of the window collaborators report into while in this stage.
    fn window_end(self) -> f32 {
        match self {
            PipelineStage::Preprocessing => 0.2,
            PipelineStage::ScriptDetection => 0.3,
            PipelineStage::LoadingModels => 0.5,
            _ => 1.0,
        }
    }

    /// Status text shown for the stage's checkpoint.
    pub fn status(self) -> &'static str {
        match self {
            PipelineStage::Idle => "Waiting",
            PipelineStage::Preprocessing => "Preprocessing image...",
            PipelineStage::ScriptDetection => "Detecting script...",
            PipelineStage::LoadingModels => "Loading language models...",
            PipelineStage::Recognizing => "Recognizing text...",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        }
    }

    /// Whether the run has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Preprocessing => "preprocessing",
            PipelineStage::ScriptDetection => "script_detection",
            PipelineStage::LoadingModels => "loading_models",
            PipelineStage::Recognizing => "recognizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    pub status: String,
    /// Overall progress of the run in `[0, 1]`.
    pub progress: f32,
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Observer backed by a closure.
pub struct FnObserver<F>(F);

impl<F> FnObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> ProgressObserver for FnObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        (self.0)(event)
    }
}

impl<F> fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver").finish_non_exhaustive()
    }
}

/// Observer that forwards events into an unbounded tokio channel.
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    /// Creates an observer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.sender.send(event.clone());
    }
}

#[derive(Debug)]
struct ReporterState {
    stage: PipelineStage,
    last: f32,
}

/// Per-run progress emitter. Cloning shares the same run state.
#[derive(Clone)]
pub struct ProgressReporter {
    observer: Arc<dyn ProgressObserver>,
    state: Arc<Mutex<ReporterState>>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ProgressReporter")
            .field("stage", &state.stage)
            .field("last", &state.last)
            .finish()
    }
}

impl ProgressReporter {
    /// Creates a reporter for a new run, starting in `Idle` at 0.
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            observer,
            state: Arc::new(Mutex::new(ReporterState {
                stage: PipelineStage::Idle,
                last: 0.0,
            })),
        }
    }

    /// A reporter whose events go nowhere.
    pub fn silent() -> Self {
        Self::new(Arc::new(NoopObserver))
    }

    /// Moves the run into `stage` and emits its checkpoint.
    ///
    /// `Failed` records the state without emitting anything. Transitions out of a
    /// terminal state are ignored.
    pub fn enter(&self, stage: PipelineStage) -> StageProgress {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.stage.is_terminal() {
                state.stage = stage;
            }
        }
        if let Some(checkpoint) = stage.checkpoint() {
            self.emit(stage, stage.status(), checkpoint);
        }
        StageProgress {
            reporter: self.clone(),
            stage,
            start: stage.checkpoint().unwrap_or(0.0),
            end: stage.window_end(),
        }
    }

    /// Marks the run as failed. No event is emitted.
    pub fn fail(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stage = PipelineStage::Failed;
    }

    /// Current stage of the run.
    pub fn stage(&self) -> PipelineStage {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stage
    }

    /// Last progress value delivered to the observer.
    pub fn last_progress(&self) -> f32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
    }

    fn emit(&self, stage: PipelineStage, status: &str, progress: f32) {
        let progress = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.stage == PipelineStage::Failed {
                return;
            }
            let value = progress.clamp(0.0, 1.0).max(state.last);
            state.last = value;
            value
        };
        self.observer.on_progress(&ProgressEvent {
            stage,
            status: status.to_string(),
            progress,
        });
    }
}

/// Handle given to collaborators for reporting progress inside one stage.
#[derive(Debug, Clone)]
pub struct StageProgress {
    reporter: ProgressReporter,
    stage: PipelineStage,
    start: f32,
    end: f32,
}

impl StageProgress {
    /// A handle that reports nowhere, for calling collaborators outside a run.
    pub fn detached() -> Self {
        ProgressReporter::silent().enter(PipelineStage::Idle)
    }

    /// The stage this handle reports for.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Reports `fraction` of the stage as complete, with an optional status text.
    ///
    /// `fraction` is clamped to `[0, 1]` and mapped into the stage's window.
    pub fn report(&self, fraction: f32, status: Option<&str>) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let value = self.start + fraction * (self.end - self.start);
        self.reporter
            .emit(self.stage, status.unwrap_or(self.stage.status()), value);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Observer that records every event it receives.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingObserver {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingObserver {
        pub(crate) fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }

        pub(crate) fn values(&self) -> Vec<f32> {
            self.events().iter().map(|e| e.progress).collect()
        }
    }

    impl ProgressObserver for RecordingObserver {
        fn on_progress(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_checkpoints() {
        let observer = Arc::new(RecordingObserver::default());
        let reporter = ProgressReporter::new(observer.clone());
        for stage in [
            PipelineStage::Preprocessing,
            PipelineStage::ScriptDetection,
            PipelineStage::LoadingModels,
            PipelineStage::Recognizing,
            PipelineStage::Done,
        ] {
            reporter.enter(stage);
        }
        assert_eq!(observer.values(), vec![0.1, 0.2, 0.3, 0.5, 1.0]);
        assert_eq!(observer.events()[1].status, "Detecting script...");
        assert_eq!(reporter.stage(), PipelineStage::Done);
    }

    #[test]
    fn test_stage_progress_maps_into_window() {
        let observer = Arc::new(RecordingObserver::default());
        let reporter = ProgressReporter::new(observer.clone());
        let recognizing = reporter.enter(PipelineStage::Recognizing);
        recognizing.report(0.5, Some("halfway"));
        recognizing.report(2.0, None);

        let events = observer.events();
        assert_eq!(events.len(), 3);
        assert!((events[1].progress - 0.75).abs() < 1e-6);
        assert_eq!(events[1].status, "halfway");
        assert_eq!(events[2].progress, 1.0);
    }

    #[test]
    fn test_progress_never_decreases() {
        let observer = Arc::new(RecordingObserver::default());
        let reporter = ProgressReporter::new(observer.clone());
        let loading = reporter.enter(PipelineStage::LoadingModels);
        loading.report(0.9, None);
        loading.report(0.1, None);
        reporter.enter(PipelineStage::Recognizing);

        let values = observer.values();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        assert!((reporter.last_progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_failed_emits_nothing() {
        let observer = Arc::new(RecordingObserver::default());
        let reporter = ProgressReporter::new(observer.clone());
        let stage = reporter.enter(PipelineStage::Preprocessing);
        reporter.fail();
        stage.report(1.0, None);
        reporter.enter(PipelineStage::Done);

        assert_eq!(observer.values(), vec![0.1]);
        assert_eq!(reporter.stage(), PipelineStage::Failed);
    }

    #[tokio::test]
    async fn test_channel_observer_delivers_events() {
        let (observer, mut receiver) = ChannelObserver::channel();
        let reporter = ProgressReporter::new(Arc::new(observer));
        reporter.enter(PipelineStage::Preprocessing);
        drop(reporter);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.stage, PipelineStage::Preprocessing);
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn test_fn_observer_and_detached_handle() {
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let observer = FnObserver::new(move |_event: &ProgressEvent| {
            *counter.lock().unwrap() += 1;
        });
        let reporter = ProgressReporter::new(Arc::new(observer));
        reporter.enter(PipelineStage::Preprocessing).report(0.5, None);
        assert_eq!(*count.lock().unwrap(), 2);

        // Reporting through a detached handle is a no-op.
        StageProgress::detached().report(0.5, None);
    }
}
