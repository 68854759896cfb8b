//! episode-flux - Aligned, smoothed training-metric series from RL episode logs
//!
//! Flux turns a per-episode metrics file into display-ready series through a
//! deterministic pipeline: record reading → alignment → unit normalization →
//! rolling smoothing → goal event extraction.
//!
//! ## Modules
//!
//! - **Core**: `aligner`, `smoother`, `normalizer`, `events`, `pipeline`
//! - **Collaborators**: `reader` (CSV input), `encoder` (JSON/CSV export),
//!   `render` (chart grid)

pub mod aligner;
pub mod config;
pub mod encoder;
pub mod error;
pub mod events;
pub mod normalizer;
pub mod pipeline;
pub mod reader;
pub mod render;
pub mod smoother;
pub mod types;

pub use aligner::SeriesAligner;
pub use config::{Config, ImageFormat, PipelineConfig, RenderConfig};
pub use encoder::{BundleEncoder, RunSummary};
pub use error::MetricsError;
pub use events::{EventExtractor, EventMode};
pub use normalizer::{RateUnit, UnitNormalizer};
pub use pipeline::{csv_to_bundle, records_to_bundle, MetricsPipeline};
pub use reader::RecordReader;
pub use render::ChartRenderer;
pub use smoother::{RollingSmoother, DEFAULT_WINDOW};
pub use types::{AlignedSeries, MetricTrack, MetricsBundle, MetricsRecordSet, Sample, SmoothedSeries};

/// Flux version embedded in every export
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exports
pub const PRODUCER_NAME: &str = "episode-flux";
