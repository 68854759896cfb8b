//! Unit normalization
//!
//! Success rates arrive either as fractions (0-1) or as percentages (0-100).
//! Display always uses percent, so fractional series are rescaled.
//!
//! The unit is guessed from the data: a series whose largest present value is
//! at most 1.0 is treated as a fraction. A genuinely percent-scaled run that
//! never exceeds 1% is therefore rescaled as well. This is a known limitation
//! and downstream consumers rely on the exact threshold.

use crate::types::Sample;

/// Largest value a fractional series may contain
pub const FRACTION_MAX: f64 = 1.0;

/// Detected unit of a rate series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    Fraction,
    Percent,
}

impl RateUnit {
    /// Guess the unit; `None` for empty or entirely missing series
    pub fn detect(series: &[Sample]) -> Option<Self> {
        let max = series
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))?;

        if max <= FRACTION_MAX {
            Some(RateUnit::Fraction)
        } else {
            Some(RateUnit::Percent)
        }
    }
}

/// Normalizer for rate series
pub struct UnitNormalizer;

impl UnitNormalizer {
    /// Rescale a fractional series to percent; leave anything else unchanged
    pub fn normalize_to_percent(series: &[Sample]) -> Vec<Sample> {
        match RateUnit::detect(series) {
            Some(RateUnit::Fraction) => series.iter().map(|v| v.map(|x| x * 100.0)).collect(),
            _ => series.to_vec(),
        }
    }
}
