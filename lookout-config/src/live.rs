//! Background live-loop configuration: where artifacts land and loop pacing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct LiveConfig {
    /// Directory receiving one `.pcap` per completed window.
    #[serde(default = "default_capture_dir")]
    pub capture_dir: PathBuf,

    /// Canonical "latest results" table, replaced atomically each cycle.
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,

    /// Pause between cycles (milliseconds).
    #[validate(range(max = 600000))]
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_ms: u64,

    /// Upper bound on how long a stop request waits for the worker.
    #[validate(range(min = 1, max = 60000))]
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_ms: u64,
}

impl LiveConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from("live")
}

fn default_results_file() -> PathBuf {
    PathBuf::from("live/live_predictions.csv")
}

fn default_cycle_interval() -> u64 {
    1000
}

fn default_stop_timeout() -> u64 {
    1000
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            capture_dir: default_capture_dir(),
            results_file: default_results_file(),
            cycle_interval_ms: default_cycle_interval(),
            stop_timeout_ms: default_stop_timeout(),
        }
    }
}
