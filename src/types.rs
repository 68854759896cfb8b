//! Core types for the episode-flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the raw record set, aligned and smoothed series, and the bundle
//! handed to presentation.

use serde::{Deserialize, Serialize};

/// A single metric sample; `None` marks a missing value.
///
/// Missing samples never take part in arithmetic reductions.
pub type Sample = Option<f64>;

/// A series padded or truncated to the episode count
pub type AlignedSeries = Vec<Sample>;

/// A trailing-window mean over an aligned series, same length
pub type SmoothedSeries = Vec<Sample>;

/// Column names of the tabular record source
pub mod columns {
    pub const EPISODE: &str = "episode";
    pub const REWARD: &str = "reward";
    pub const CUMULATIVE_GOALS: &str = "cumulative_goals";
    pub const SUCCESS_RATE: &str = "success_rate";
    pub const TRAINING_LOSS: &str = "training_loss";
    pub const STEPS: &str = "steps";
}

/// Raw per-episode metrics as supplied by a record source.
///
/// `episode` drives the canonical length. Each value column is `None` when
/// the source had no such column at all; individual cells may still be
/// missing inside a present column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecordSet {
    /// Episode identifiers in file order
    pub episode: Vec<i64>,
    /// Episode reward
    pub reward: Option<Vec<Sample>>,
    /// Running total of goals reached (expected non-decreasing)
    pub cumulative_goals: Option<Vec<Sample>>,
    /// Success rate, either a fraction or a percentage
    pub success_rate: Option<Vec<Sample>>,
    /// Training loss (expected non-negative)
    pub training_loss: Option<Vec<Sample>>,
    /// Steps taken in the episode
    pub steps: Option<Vec<Sample>>,
}

impl MetricsRecordSet {
    /// Build a record set with positional episode ids `0..len`
    pub fn with_episodes(len: usize) -> Self {
        Self {
            episode: (0..len as i64).collect(),
            ..Default::default()
        }
    }

    /// Number of episodes (the canonical series length)
    pub fn len(&self) -> usize {
        self.episode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episode.is_empty()
    }
}

/// One metric after alignment, with its smoothed counterpart when the
/// metric is displayed as a moving average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrack {
    /// Aligned raw values
    pub aligned: AlignedSeries,
    /// Trailing-window mean; `None` for metrics shown raw
    pub smoothed: Option<SmoothedSeries>,
}

impl MetricTrack {
    /// Track displayed raw
    pub fn raw(aligned: AlignedSeries) -> Self {
        Self {
            aligned,
            smoothed: None,
        }
    }

    /// Series to display: the smoothed one when present, otherwise raw
    pub fn display(&self) -> &[Sample] {
        self.smoothed.as_deref().unwrap_or(&self.aligned)
    }

    /// Last non-missing value of the display series
    pub fn last_value(&self) -> Option<f64> {
        self.display().iter().rev().find_map(|v| *v)
    }
}

/// Pipeline output consumed by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    /// 1-based episode axis (`1..=N`)
    pub episodes: Vec<usize>,
    /// Reward, smoothed
    pub reward: MetricTrack,
    /// Cumulative goals, raw
    pub cumulative_goals: MetricTrack,
    /// Success rate in percent, smoothed
    pub success_rate: MetricTrack,
    /// Training loss, smoothed
    pub training_loss: MetricTrack,
    /// Episode steps, smoothed
    pub steps: MetricTrack,
    /// Per-episode goal indicator in `[0, 1]`
    pub goal_indicator: AlignedSeries,
    /// 1-based episode of the first success, if any
    pub first_success_index: Option<usize>,
    /// Window the smoothed tracks were computed with
    pub window: usize,
}

impl MetricsBundle {
    /// Number of episodes in the bundle
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}
