//! Series alignment
//!
//! Brings every raw column to the episode count so all series share one
//! index. Short or absent columns are right-padded with a sentinel, long ones
//! are truncated.

use crate::types::{AlignedSeries, Sample};

/// Aligner for padding/truncating raw columns
pub struct SeriesAligner;

impl SeriesAligner {
    /// Align `sequence` to exactly `target_length` entries.
    ///
    /// An absent sequence yields `target_length` copies of `sentinel`.
    pub fn align(sequence: Option<&[Sample]>, target_length: usize, sentinel: Sample) -> AlignedSeries {
        let Some(values) = sequence else {
            return vec![sentinel; target_length];
        };

        let mut aligned: AlignedSeries = values.iter().take(target_length).copied().collect();
        aligned.resize(target_length, sentinel);
        aligned
    }
}
