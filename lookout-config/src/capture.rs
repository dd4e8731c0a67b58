// lookout-config/src/capture.rs
//! Packet capture configuration.
//!
//! Two modes are supported:
//! - `pcap`: live capture from `interface` through libpcap
//! - `replay`: re-read `replay_file` as the contents of every window

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::size::deserialize_size;
use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = "validate_replay_source"))]
pub struct CaptureConfig {
    /// Capture mode (pcap, replay).
    #[validate(custom(function = validation::validate_mode))]
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Network interface for live capture.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Run in promiscuous mode?
    #[serde(default = "default_promiscuous")]
    pub promiscuous: bool,

    /// Bytes kept per packet.
    #[validate(range(min = 64, max = 262144))]
    #[serde(default = "default_snaplen")]
    pub snaplen: u32,

    /// Kernel capture buffer size in bytes.
    #[validate(range(min = 4096, max = 1073741824))]
    #[serde(default = "default_buffer_size", deserialize_with = "deserialize_size")]
    pub buffer_size: usize,

    /// libpcap read timeout (milliseconds). Bounds stop latency mid-window.
    #[validate(range(min = 10, max = 5000))]
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u32,

    /// Length of one capture window (seconds).
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// Savefile replayed in `replay` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_file: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn is_replay(&self) -> bool {
        self.mode == "replay"
    }
}

fn validate_replay_source(config: &CaptureConfig) -> Result<(), ValidationError> {
    if config.is_replay() && config.replay_file.is_none() {
        return Err(ValidationError::new("replay_file_required"));
    }
    Ok(())
}

fn default_mode() -> String {
    "pcap".into()
}

fn default_interface() -> String {
    "eth0".into()
}

fn default_promiscuous() -> bool {
    true
}

fn default_snaplen() -> u32 {
    65535
}

fn default_buffer_size() -> usize {
    1048576
}

fn default_read_timeout() -> u32 {
    1000
}

fn default_window() -> u64 {
    10
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interface: default_interface(),
            promiscuous: default_promiscuous(),
            snaplen: default_snaplen(),
            buffer_size: default_buffer_size(),
            read_timeout_ms: default_read_timeout(),
            window_secs: default_window(),
            replay_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_mode_requires_a_file() {
        let mut config = CaptureConfig {
            mode: "replay".into(),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());

        config.replay_file = Some("fixtures/sample.pcap".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn read_timeout_out_of_range() {
        let config = CaptureConfig {
            read_timeout_ms: 5,
            ..CaptureConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("read_timeout_ms"));
    }
}
