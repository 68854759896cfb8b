//! Configuration
//!
//! Settings that used to be process-wide constants (smoothing window, output
//! directory) are passed explicitly into the pipeline and the renderer.

use crate::error::MetricsError;
use crate::smoother::DEFAULT_WINDOW;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory for rendered charts
pub const DEFAULT_OUTPUT_DIR: &str = "plots";

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trailing smoothing window in episodes
    pub window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

/// Image format for rendered charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Chart rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory the chart is written to (created if missing)
    pub output_dir: PathBuf,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub format: ImageFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            width: 1600,
            height: 1200,
            format: ImageFormat::Png,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Parse and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, MetricsError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, MetricsError> {
        if !path.exists() {
            return Err(MetricsError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.pipeline.window == 0 {
            return Err(MetricsError::InvalidConfig(
                "smoothing window must be at least 1".to_string(),
            ));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(MetricsError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        Ok(())
    }
}
