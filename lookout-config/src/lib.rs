//! # Lookout Configuration System
//!
//! Hierarchical configuration for the live-capture front end: capture
//! parameters, live-loop pacing, the external detection pipeline, the HTTP
//! control surface and telemetry.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files, then `LOOKOUT_*` environment
//! - **Validation**: every section derives `Validate`; invalid values are
//!   rejected before any component starts

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod api;
mod capture;
mod error;
mod live;
mod pipeline;
mod size;
mod telemetry;
mod validation;

pub use api::ApiConfig;
pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use live::LiveConfig;
pub use pipeline::PipelineConfig;
pub use size::parse_size;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/lookout.yaml";
const ENV_PREFIX: &str = "LOOKOUT_";

/// Top‑level configuration container for all Lookout components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct LookoutConfig {
    /// Packet capture parameters.
    #[validate(nested)]
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Background live loop: artifact locations and pacing.
    #[validate(nested)]
    #[serde(default)]
    pub live: LiveConfig,

    /// External detection pipeline.
    #[validate(nested)]
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP control surface.
    #[validate(nested)]
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl LookoutConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/lookout.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<LOOKOUT_ENV>.yaml` - Environment‑specific overrides.
    /// 4. `LOOKOUT_*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(LookoutConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            eprintln!("{BASE_FILE} not found, using default configuration");
        }

        let env = std::env::var("LOOKOUT_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{env}.yaml");
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honouring `LOOKOUT_*`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(LookoutConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn full_config_validation() {
        let config = LookoutConfig::default();
        config.validate().expect("Default config should validate");
        assert_eq!(config.capture.window_secs, 10);
        assert_eq!(config.live.stop_timeout_ms, 1000);
        assert_eq!(config.api.bind, "0.0.0.0:8000");
    }

    #[test]
    fn layered_file_and_environment() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                "config/lookout.yaml",
                r#"
capture:
  interface: enp3s0
  buffer_size: 4MiB
live:
  cycle_interval_ms: 250
"#,
            )?;
            jail.create_file("config/staging.yaml", "telemetry:\n  log_level: debug\n")?;
            jail.set_env("LOOKOUT_ENV", "staging");
            jail.set_env("LOOKOUT_CAPTURE__WINDOW_SECS", "30");

            let config = LookoutConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.capture.interface, "enp3s0");
            assert_eq!(config.capture.buffer_size, 4 * 1024 * 1024);
            assert_eq!(config.capture.window_secs, 30);
            assert_eq!(config.live.cycle_interval_ms, 250);
            assert_eq!(config.live.stop_timeout_ms, 1000);
            assert_eq!(config.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "capture:\n  interface: \"eth0; reboot\"\n")?;
            match LookoutConfig::load_from_path("bad.yaml") {
                Err(ConfigError::Validation(_)) => Ok(()),
                other => Err(format!("expected validation error, got {other:?}").into()),
            }
        });
    }

    #[test]
    fn missing_explicit_file() {
        let err = LookoutConfig::load_from_path("/nonexistent/lookout.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parsing_error() {
        Jail::expect_with(|jail| {
            jail.create_file("broken.yaml", "live:\n  stop_timeout_ms: soon\n")?;
            match LookoutConfig::load_from_path("broken.yaml") {
                Err(ConfigError::Parsing(_)) => Ok(()),
                other => Err(format!("expected parsing error, got {other:?}").into()),
            }
        });
    }
}
