use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lookout_capture::{LiveCapture, PacketSource, ReplayCapture};
use lookout_config::{CaptureConfig, LookoutConfig};

/// Live-loop parameters resolved from configuration.
#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub window: Duration,
    pub capture_dir: PathBuf,
    pub results_file: PathBuf,
    pub cycle_interval: Duration,
    pub stop_timeout: Duration,
}

impl LiveSettings {
    pub fn from_config(config: &LookoutConfig) -> Self {
        Self {
            window: config.capture.window(),
            capture_dir: config.live.capture_dir.clone(),
            results_file: config.live.results_file.clone(),
            cycle_interval: config.live.cycle_interval(),
            stop_timeout: config.live.stop_timeout(),
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::from_config(&LookoutConfig::default())
    }
}

/// Build the capture primitive the configuration asks for.
pub fn packet_source(config: &CaptureConfig) -> Arc<dyn PacketSource> {
    match (&config.replay_file, config.is_replay()) {
        (Some(path), true) => Arc::new(ReplayCapture::new(path)),
        _ => Arc::new(LiveCapture {
            interface: config.interface.clone(),
            promiscuous: config.promiscuous,
            snaplen: config.snaplen,
            buffer_size: config.buffer_size,
            read_timeout_ms: config.read_timeout_ms,
        }),
    }
}
