//! Rolling smoother
//!
//! NaN-aware trailing moving average. Each output is an exact mean of the
//! window ending at that index; no incremental or exponential approximation,
//! so a reported "success over the last 20 episodes" is the true mean.

use crate::types::{Sample, SmoothedSeries};

/// Default smoothing window in episodes
pub const DEFAULT_WINDOW: usize = 20;

/// Trailing-window mean over missing-aware series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingSmoother {
    window: usize,
}

impl Default for RollingSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RollingSmoother {
    /// Create a smoother; a zero window is treated as 1
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Smooth `series` with this smoother's window
    pub fn smooth(&self, series: &[Sample]) -> SmoothedSeries {
        (0..series.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.window);
                window_mean(&series[start..=i])
            })
            .collect()
    }
}

/// Mean of the present values, `None` when every value is missing
fn window_mean(window: &[Sample]) -> Sample {
    let (sum, count) = window
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
