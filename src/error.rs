//! Error types for episode-flux
//!
//! The aggregation core never fails; these errors only surface at the
//! boundary (reading records, loading configuration, writing output).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur around the metrics pipeline
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Record source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl From<csv::Error> for MetricsError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        let message = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => MetricsError::Io(io),
            _ => MetricsError::MalformedRecord { line, message },
        }
    }
}
