//! Bundle encoding
//!
//! This module exports a `MetricsBundle` as JSON (with producer metadata) or
//! as a per-episode CSV table, and condenses it into a short run summary.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::types::{MetricsBundle, Sample};
use crate::{FLUX_VERSION, PRODUCER_NAME};

/// Current export schema version
pub const EXPORT_VERSION: &str = "1.0.0";

/// Producer metadata attached to every export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportProducer {
    pub name: String,
    pub version: String,
}

/// JSON export envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleExport {
    pub export_version: String,
    pub producer: ExportProducer,
    pub generated_at_utc: DateTime<Utc>,
    pub summary: RunSummary,
    pub bundle: MetricsBundle,
}

/// Headline numbers of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub episodes: usize,
    pub window: usize,
    pub first_success_index: Option<usize>,
    /// Last value of the cumulative goal counter
    pub total_goals: Option<f64>,
    /// Smoothed reward at the last episode that has one
    pub final_reward_ma: Option<f64>,
    /// Smoothed success rate (percent) at the last episode that has one
    pub final_success_rate_ma: Option<f64>,
    pub final_loss_ma: Option<f64>,
    pub final_steps_ma: Option<f64>,
}

impl RunSummary {
    pub fn from_bundle(bundle: &MetricsBundle) -> Self {
        Self {
            episodes: bundle.len(),
            window: bundle.window,
            first_success_index: bundle.first_success_index,
            total_goals: bundle.cumulative_goals.last_value(),
            final_reward_ma: bundle.reward.last_value(),
            final_success_rate_ma: bundle.success_rate.last_value(),
            final_loss_ma: bundle.training_loss.last_value(),
            final_steps_ma: bundle.steps.last_value(),
        }
    }

    /// Human-readable multi-line report
    pub fn to_text(&self) -> String {
        let fmt = |v: Option<f64>, precision: usize| match v {
            Some(x) => format!("{x:.precision$}"),
            None => "n/a".to_string(),
        };

        let first_success = match self.first_success_index {
            Some(ep) => format!("episode {ep}"),
            None => "never".to_string(),
        };

        let lines = [
            format!("Episodes:        {}", self.episodes),
            format!("First success:   {first_success}"),
            format!("Total goals:     {}", fmt(self.total_goals, 0)),
            format!(
                "Success rate:    {}% over last {} episodes",
                fmt(self.final_success_rate_ma, 1),
                self.window.min(self.episodes.max(1))
            ),
            format!("Reward (MA):     {}", fmt(self.final_reward_ma, 3)),
            format!("Loss (MA):       {}", fmt(self.final_loss_ma, 5)),
            format!("Steps (MA):      {}", fmt(self.final_steps_ma, 1)),
        ];
        lines.join("\n")
    }
}

/// Encoder for exporting bundles
pub struct BundleEncoder;

impl BundleEncoder {
    /// Wrap the bundle in an export envelope
    pub fn encode(bundle: &MetricsBundle) -> BundleExport {
        BundleExport {
            export_version: EXPORT_VERSION.to_string(),
            producer: ExportProducer {
                name: PRODUCER_NAME.to_string(),
                version: FLUX_VERSION.to_string(),
            },
            generated_at_utc: Utc::now(),
            summary: RunSummary::from_bundle(bundle),
            bundle: bundle.clone(),
        }
    }

    /// Encode to a pretty JSON string; missing samples become `null`
    pub fn encode_to_json(bundle: &MetricsBundle) -> Result<String, MetricsError> {
        let export = Self::encode(bundle);
        serde_json::to_string_pretty(&export).map_err(MetricsError::JsonError)
    }

    /// Write one CSV row per episode; missing samples are empty cells
    pub fn write_csv<W: Write>(bundle: &MetricsBundle, writer: W) -> Result<(), MetricsError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record([
            "episode",
            "reward",
            "reward_ma",
            "cumulative_goals",
            "success_rate",
            "success_rate_ma",
            "training_loss",
            "training_loss_ma",
            "steps",
            "steps_ma",
            "goal",
        ])?;

        for (i, episode) in bundle.episodes.iter().enumerate() {
            let cell = |series: &[Sample]| format_sample(series.get(i).copied().flatten());
            writer.write_record([
                episode.to_string(),
                cell(&bundle.reward.aligned),
                cell(bundle.reward.display()),
                cell(&bundle.cumulative_goals.aligned),
                cell(&bundle.success_rate.aligned),
                cell(bundle.success_rate.display()),
                cell(&bundle.training_loss.aligned),
                cell(bundle.training_loss.display()),
                cell(&bundle.steps.aligned),
                cell(bundle.steps.display()),
                cell(&bundle.goal_indicator),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn format_sample(sample: Sample) -> String {
    sample.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MetricsPipeline;
    use crate::types::MetricsRecordSet;
    use pretty_assertions::assert_eq;

    fn sample_bundle() -> MetricsBundle {
        let mut records = MetricsRecordSet::with_episodes(4);
        records.reward = Some(vec![Some(1.0), Some(3.0), None, Some(5.0)]);
        records.cumulative_goals = Some(vec![Some(0.0), Some(1.0), Some(1.0), Some(2.0)]);
        records.success_rate = Some(vec![Some(0.0), Some(0.5), Some(0.5), Some(1.0)]);
        MetricsPipeline::with_window(2).build(&records)
    }

    #[test]
    fn test_summary() {
        let summary = RunSummary::from_bundle(&sample_bundle());

        assert_eq!(summary.episodes, 4);
        assert_eq!(summary.window, 2);
        assert_eq!(summary.first_success_index, Some(2));
        assert_eq!(summary.total_goals, Some(2.0));
        assert_eq!(summary.final_reward_ma, Some(5.0));
        assert_eq!(summary.final_success_rate_ma, Some(75.0));
        assert_eq!(summary.final_loss_ma, None);

        let text = summary.to_text();
        assert!(text.contains("First success:   episode 2"));
        assert!(text.contains("75.0% over last 2 episodes"));
        assert!(text.contains("Loss (MA):       n/a"));
    }

    #[test]
    fn test_encode_to_json() {
        let json = BundleEncoder::encode_to_json(&sample_bundle()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["export_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "episode-flux");
        let stamp = payload["generated_at_utc"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(payload["summary"]["first_success_index"], 2);
        assert_eq!(payload["bundle"]["episodes"], serde_json::json!([1, 2, 3, 4]));
        assert!(payload["bundle"]["reward"]["aligned"][2].is_null());
        assert!(payload["bundle"]["cumulative_goals"]["smoothed"].is_null());
    }

    #[test]
    fn test_export_round_trip() {
        let json = BundleEncoder::encode_to_json(&sample_bundle()).unwrap();
        let export: BundleExport = serde_json::from_str(&json).unwrap();

        assert_eq!(export.producer.version, FLUX_VERSION);
        assert_eq!(export.summary, RunSummary::from_bundle(&sample_bundle()));
        assert!(export.generated_at_utc <= Utc::now());
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        BundleEncoder::write_csv(&sample_bundle(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("episode,reward,reward_ma"));
        assert_eq!(lines[1], "1,1,1,0,0,0,,,,,0");
        assert_eq!(lines[3], "3,,3,1,50,50,,,,,0");
    }

    #[test]
    fn test_empty_bundle_exports() {
        let bundle = MetricsPipeline::default().build(&MetricsRecordSet::default());

        let mut out = Vec::new();
        BundleEncoder::write_csv(&bundle, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);

        let summary = RunSummary::from_bundle(&bundle);
        assert_eq!(summary.first_success_index, None);
        assert!(summary.to_text().contains("First success:   never"));
    }
}
