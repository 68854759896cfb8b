//! Event extraction
//!
//! Turns a cumulative goal counter into a per-episode indicator and finds the
//! first episode at which the event happened.

use crate::types::Sample;

/// How a series is interpreted when searching for the first event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    /// Every value is exactly 0 or 1; the event is the first 1
    Binary,
    /// Anything else is a running count; the event is the first value > 0
    Cumulative,
}

impl EventMode {
    /// Resolve the mode from the value set.
    ///
    /// A missing sample is neither 0 nor 1, so any gap selects `Cumulative`.
    /// An all-zero series resolves to `Binary`.
    pub fn detect(series: &[Sample]) -> Self {
        let binary = series
            .iter()
            .all(|v| matches!(v, Some(x) if *x == 0.0 || *x == 1.0));
        if binary {
            EventMode::Binary
        } else {
            EventMode::Cumulative
        }
    }

    fn qualifies(&self, value: f64) -> bool {
        match self {
            EventMode::Binary => value == 1.0,
            EventMode::Cumulative => value > 0.0,
        }
    }
}

/// Extractor for goal events
pub struct EventExtractor;

impl EventExtractor {
    /// Difference a cumulative counter into per-step counts clamped to `[0, 1]`.
    ///
    /// Decreasing input is not rejected; the negative difference clamps to 0.
    /// A missing sample makes both differences it takes part in missing.
    pub fn invert_cumulative(cumulative: &[Sample]) -> Vec<Sample> {
        let mut previous: Sample = Some(0.0);
        cumulative
            .iter()
            .map(|current| {
                let delta = match (current, previous) {
                    (Some(curr), Some(prev)) => Some((curr - prev).clamp(0.0, 1.0)),
                    _ => None,
                };
                previous = *current;
                delta
            })
            .collect()
    }

    /// 1-based position of the first event, or `None`
    pub fn first_occurrence(series: &[Sample]) -> Option<usize> {
        if series.is_empty() {
            return None;
        }
        let mode = EventMode::detect(series);
        series
            .iter()
            .position(|v| v.is_some_and(|x| mode.qualifies(x)))
            .map(|i| i + 1)
    }
}
