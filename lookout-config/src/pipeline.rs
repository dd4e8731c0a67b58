//! External detection pipeline invocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PipelineConfig {
    /// Executable to run (looked up on `PATH`).
    #[validate(length(min = 1))]
    #[serde(default = "default_program")]
    pub program: String,

    /// Leading arguments; `--input`, `--output` and `--pcap` are appended per run.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Working directory for the child process; inherits ours when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_program() -> String {
    "python3".into()
}

fn default_args() -> Vec<String> {
    vec!["-m".into(), "inference.live_predict".into()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
        }
    }
}
