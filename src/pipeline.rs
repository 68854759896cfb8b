//! Pipeline orchestration
//!
//! This module provides the public API for episode-flux.
//! It orchestrates the full pipeline from a record set to a `MetricsBundle`.

use std::path::Path;

use tracing::debug;

use crate::aligner::SeriesAligner;
use crate::config::PipelineConfig;
use crate::error::MetricsError;
use crate::events::{EventExtractor, EventMode};
use crate::normalizer::{RateUnit, UnitNormalizer};
use crate::reader::RecordReader;
use crate::smoother::RollingSmoother;
use crate::types::{MetricTrack, MetricsBundle, MetricsRecordSet};

/// Build a bundle from an in-memory record set with default settings.
///
/// # Example
/// ```
/// use episode_flux::{records_to_bundle, MetricsRecordSet};
///
/// let mut records = MetricsRecordSet::with_episodes(3);
/// records.cumulative_goals = Some(vec![Some(0.0), Some(1.0), Some(2.0)]);
/// let bundle = records_to_bundle(&records);
/// assert_eq!(bundle.first_success_index, Some(2));
/// ```
pub fn records_to_bundle(records: &MetricsRecordSet) -> MetricsBundle {
    MetricsPipeline::default().build(records)
}

/// Read a CSV record file and build its bundle.
///
/// Pipeline stages:
/// 1. RecordReader - Parse the CSV into columns
/// 2. SeriesAligner - Bring every column to the episode count
/// 3. UnitNormalizer - Express the success rate in percent
/// 4. RollingSmoother - Trailing means for the displayed metrics
/// 5. EventExtractor - Goal indicator and first success
pub fn csv_to_bundle(path: &Path, config: &PipelineConfig) -> Result<MetricsBundle, MetricsError> {
    let records = RecordReader::from_path(path)?;
    Ok(MetricsPipeline::new(config.clone()).build(&records))
}

/// Aggregation pipeline over one run's metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsPipeline {
    config: PipelineConfig,
}

impl MetricsPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline with a specific smoothing window
    pub fn with_window(window: usize) -> Self {
        Self::new(PipelineConfig { window })
    }

    /// Build the bundle. Never fails; degenerate input gives degenerate output.
    pub fn build(&self, records: &MetricsRecordSet) -> MetricsBundle {
        let n = records.len();
        let smoother = RollingSmoother::new(self.config.window);

        // Missing reward/loss/steps must stay visibly absent under averaging,
        // while a missing count or rate reads as zero.
        let reward = SeriesAligner::align(records.reward.as_deref(), n, None);
        let training_loss = SeriesAligner::align(records.training_loss.as_deref(), n, None);
        let steps = SeriesAligner::align(records.steps.as_deref(), n, None);
        let success_rate = SeriesAligner::align(records.success_rate.as_deref(), n, Some(0.0));
        let cumulative_goals =
            SeriesAligner::align(records.cumulative_goals.as_deref(), n, Some(0.0));

        let rate_unit = RateUnit::detect(&success_rate);
        let success_rate = UnitNormalizer::normalize_to_percent(&success_rate);

        let goals_populated = cumulative_goals.iter().any(Option::is_some);
        let goal_indicator = if goals_populated {
            EventExtractor::invert_cumulative(&cumulative_goals)
        } else {
            vec![Some(0.0); n]
        };

        let event_source = if goals_populated {
            &cumulative_goals
        } else {
            &goal_indicator
        };
        let first_success_index = EventExtractor::first_occurrence(event_source);

        debug!(
            episodes = n,
            window = smoother.window(),
            rate_unit = ?rate_unit,
            event_mode = ?EventMode::detect(event_source),
            first_success = ?first_success_index,
            "built metrics bundle"
        );

        MetricsBundle {
            episodes: (1..=n).collect(),
            reward: smoothed_track(&smoother, reward),
            cumulative_goals: MetricTrack::raw(cumulative_goals),
            success_rate: smoothed_track(&smoother, success_rate),
            training_loss: smoothed_track(&smoother, training_loss),
            steps: smoothed_track(&smoother, steps),
            goal_indicator,
            first_success_index,
            window: smoother.window(),
        }
    }
}

fn smoothed_track(smoother: &RollingSmoother, aligned: Vec<Option<f64>>) -> MetricTrack {
    let smoothed = smoother.smooth(&aligned);
    MetricTrack {
        aligned,
        smoothed: Some(smoothed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values.iter().map(|v| Some(*v)).collect()
    }

    /// 50 episodes; first goal at episode 30, success rate 0.1 from then on.
    fn late_success_run() -> MetricsRecordSet {
        let mut records = MetricsRecordSet {
            episode: (1..=50).collect(),
            ..Default::default()
        };
        let goals: Vec<f64> = (0..50)
            .map(|i| if i < 29 { 0.0 } else { (i - 28) as f64 })
            .collect();
        let rate: Vec<f64> = (0..50).map(|i| if i < 29 { 0.0 } else { 0.1 }).collect();
        records.cumulative_goals = Some(samples(&goals));
        records.success_rate = Some(samples(&rate));
        records.reward = Some(samples(&vec![1.0; 50]));
        records
    }

    #[test]
    fn test_late_success_scenario() {
        let bundle = records_to_bundle(&late_success_run());

        assert_eq!(bundle.len(), 50);
        assert_eq!(bundle.first_success_index, Some(30));

        let goals = &bundle.cumulative_goals.aligned;
        assert_eq!(goals.len(), 50);
        assert!(bundle.cumulative_goals.smoothed.is_none());
        assert!(goals.windows(2).all(|w| w[0] <= w[1]));
        let expected_tail: Vec<Sample> = (1..=21).map(|g| Some(g as f64)).collect();
        assert_eq!(&goals[29..], expected_tail.as_slice());

        let rate = &bundle.success_rate.aligned;
        assert!(rate[..29].iter().all(|v| *v == Some(0.0)));
        assert!(rate[29..]
            .iter()
            .all(|v| (v.unwrap() - 10.0).abs() < 1e-9));

        let smoothed = bundle.success_rate.smoothed.as_ref().unwrap();
        assert!(smoothed[..29].iter().all(|v| *v == Some(0.0)));
        assert!(smoothed[29..].iter().all(|v| v.unwrap() > 0.0));

        let indicator = &bundle.goal_indicator;
        assert!(indicator[..29].iter().all(|v| *v == Some(0.0)));
        assert!(indicator[29..].iter().all(|v| *v == Some(1.0)));
    }

    #[test]
    fn test_empty_record_set() {
        let bundle = records_to_bundle(&MetricsRecordSet::default());
        assert!(bundle.is_empty());
        assert!(bundle.reward.aligned.is_empty());
        assert!(bundle.goal_indicator.is_empty());
        assert_eq!(bundle.first_success_index, None);
    }

    #[test]
    fn test_absent_columns_get_sentinels() {
        let bundle = records_to_bundle(&MetricsRecordSet::with_episodes(4));

        assert_eq!(bundle.reward.aligned, vec![None; 4]);
        assert_eq!(bundle.reward.smoothed, Some(vec![None; 4]));
        assert_eq!(bundle.training_loss.aligned, vec![None; 4]);
        assert_eq!(bundle.steps.aligned, vec![None; 4]);
        assert_eq!(bundle.success_rate.aligned, samples(&[0.0; 4]));
        assert_eq!(bundle.cumulative_goals.aligned, samples(&[0.0; 4]));
        assert_eq!(bundle.goal_indicator, samples(&[0.0; 4]));
        assert_eq!(bundle.first_success_index, None);
    }

    #[test]
    fn test_short_and_long_columns_aligned() {
        let mut records = MetricsRecordSet::with_episodes(3);
        records.reward = Some(samples(&[1.0]));
        records.steps = Some(samples(&[10.0, 20.0, 30.0, 40.0, 50.0]));

        let bundle = records_to_bundle(&records);
        assert_eq!(bundle.reward.aligned, vec![Some(1.0), None, None]);
        assert_eq!(bundle.reward.smoothed, Some(samples(&[1.0, 1.0, 1.0])));
        assert_eq!(bundle.steps.aligned, samples(&[10.0, 20.0, 30.0]));
    }

    #[test]
    fn test_all_missing_goals_fall_back_to_zero_indicator() {
        let mut records = MetricsRecordSet::with_episodes(3);
        records.cumulative_goals = Some(vec![None, None, None]);

        let bundle = records_to_bundle(&records);
        assert_eq!(bundle.goal_indicator, samples(&[0.0, 0.0, 0.0]));
        assert_eq!(bundle.first_success_index, None);
    }

    #[test]
    fn test_percent_success_rate_kept() {
        let mut records = MetricsRecordSet::with_episodes(3);
        records.success_rate = Some(samples(&[50.0, 80.0, 95.0]));

        let bundle = MetricsPipeline::with_window(2).build(&records);
        assert_eq!(bundle.success_rate.aligned, samples(&[50.0, 80.0, 95.0]));
        assert_eq!(
            bundle.success_rate.smoothed,
            Some(samples(&[50.0, 65.0, 87.5]))
        );
        assert_eq!(bundle.window, 2);
    }

    #[test]
    fn test_binary_goal_column() {
        let mut records = MetricsRecordSet::with_episodes(5);
        records.cumulative_goals = Some(samples(&[0.0, 0.0, 1.0, 1.0, 1.0]));

        let bundle = records_to_bundle(&records);
        assert_eq!(bundle.first_success_index, Some(3));
        assert_eq!(bundle.goal_indicator, samples(&[0.0, 0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_csv_to_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "episode,reward,cumulative_goals,success_rate").unwrap();
        writeln!(file, "1,-5.0,0,0.0").unwrap();
        writeln!(file, "2,-3.0,1,0.5").unwrap();
        writeln!(file, "3,,2,1.0").unwrap();

        let bundle = csv_to_bundle(file.path(), &PipelineConfig { window: 2 }).unwrap();
        assert_eq!(bundle.episodes, vec![1, 2, 3]);
        assert_eq!(bundle.first_success_index, Some(2));
        assert_eq!(bundle.reward.aligned, vec![Some(-5.0), Some(-3.0), None]);
        assert_eq!(
            bundle.reward.smoothed,
            Some(vec![Some(-5.0), Some(-4.0), Some(-3.0)])
        );
        assert_eq!(bundle.success_rate.aligned, samples(&[0.0, 50.0, 100.0]));
        assert_eq!(bundle.training_loss.aligned, vec![None; 3]);
    }

    #[test]
    fn test_csv_to_bundle_truncated_run() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "episode,reward,cumulative_goals,success_rate,training_loss,steps").unwrap();
        writeln!(file, "1,1.0,0,0.0,0.5,10").unwrap();
        writeln!(file, "2,3.0,1,0.5,0.25,12").unwrap();
        write!(file, "3,2.0").unwrap();

        let bundle = csv_to_bundle(file.path(), &PipelineConfig { window: 2 }).unwrap();
        assert_eq!(bundle.episodes, vec![1, 2, 3]);
        assert_eq!(bundle.reward.aligned, samples(&[1.0, 3.0, 2.0]));
        assert_eq!(bundle.training_loss.aligned, vec![Some(0.5), Some(0.25), None]);
        assert_eq!(bundle.first_success_index, Some(2));
    }

    #[test]
    fn test_csv_to_bundle_missing_file() {
        let result = csv_to_bundle(
            Path::new("/nonexistent/metrics.csv"),
            &PipelineConfig::default(),
        );
        assert!(matches!(result, Err(MetricsError::NotFound(_))));
    }
}
