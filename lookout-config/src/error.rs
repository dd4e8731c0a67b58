//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration validation error.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] Box<figment::Error>),

    /// I/O error.
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (path, message) in flatten_errors("", errors) {
        let _ = writeln!(output, "  - {}: {}", path, message);
    }
    output
}

/// Walk nested section errors so `capture.window_secs` is reported, not just `capture`.
fn flatten_errors(prefix: &str, errors: &ValidationErrors) -> Vec<(String, String)> {
    use validator::ValidationErrorsKind;

    let mut flat = Vec::new();
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(msg) => msg.to_string(),
                        None => error.code.to_string(),
                    };
                    flat.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flat.extend(flatten_errors(&path, nested)),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flat.extend(flatten_errors(&format!("{path}[{index}]"), nested));
                }
            }
        }
    }
    flat
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Parsing(Box::new(error))
    }
}
