//! HTTP control surface configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::size::deserialize_size;
use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ApiConfig {
    /// Listen address (`host:port`).
    #[validate(custom(function = validation::validate_bind))]
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Where one-shot uploads are stored.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Where one-shot prediction tables are written and served from.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Largest accepted request body.
    #[validate(range(min = 1024))]
    #[serde(default = "default_max_upload", deserialize_with = "deserialize_size")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "0.0.0.0:8000".into()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("live/uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("live")
}

fn default_max_upload() -> usize {
    256 * 1024 * 1024
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            max_upload_bytes: default_max_upload(),
        }
    }
}
