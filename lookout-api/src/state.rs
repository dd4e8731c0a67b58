use std::path::PathBuf;
use std::sync::Arc;

use lookout_config::ApiConfig;
use lookout_detection::PipelineInvoker;
use lookout_engine::{CaptureSupervisor, StatusReader};
use lookout_telemetry::MetricsRecorder;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub supervisor: Arc<CaptureSupervisor>,
    pub status: StatusReader,
    pub pipeline: Arc<dyn PipelineInvoker>,
    pub metrics: Arc<MetricsRecorder>,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ApiState {
    pub fn new(
        supervisor: Arc<CaptureSupervisor>,
        pipeline: Arc<dyn PipelineInvoker>,
        metrics: Arc<MetricsRecorder>,
        config: &ApiConfig,
    ) -> Self {
        Self {
            status: supervisor.status_reader(),
            supervisor,
            pipeline,
            metrics,
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
