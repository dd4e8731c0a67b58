use std::path::PathBuf;

use thiserror::Error;

use lookout_capture::CaptureError;
use lookout_detection::PipelineError;

/// Why one capture cycle was abandoned. The live loop logs these and carries on.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Failed to persist capture: {0}")]
    Savefile(#[source] CaptureError),

    #[error("Detection pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Cannot launch live worker: {0}")]
    Launch(String),
}

/// One-shot analysis of an uploaded or local file.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unsupported input type: {0}")]
    UnsupportedInput(PathBuf),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
