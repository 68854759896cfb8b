//! CSV record source
//!
//! Reads a per-episode metrics file into a `MetricsRecordSet`. Columns are
//! looked up by header name, so order and extra columns do not matter.
//! Cells that are empty, not numeric or absent from a short row become
//! missing samples instead of failing the load; only a missing file or input
//! that is not CSV at all is an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::MetricsError;
use crate::types::{columns, MetricsRecordSet, Sample};

/// Reader for `episode,reward,cumulative_goals,success_rate,training_loss,steps` files
pub struct RecordReader;

impl RecordReader {
    /// Read a record file from disk
    pub fn from_path(path: &Path) -> Result<MetricsRecordSet, MetricsError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MetricsError::NotFound(path.to_path_buf()),
            _ => MetricsError::Io(e),
        })?;
        let records = Self::from_reader(file)?;
        debug!(path = %path.display(), episodes = records.len(), "loaded record file");
        Ok(records)
    }

    /// Read records from any CSV source with a header row
    pub fn from_reader<R: Read>(source: R) -> Result<MetricsRecordSet, MetricsError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let episode_col = position(columns::EPISODE);
        let value_cols = [
            columns::REWARD,
            columns::CUMULATIVE_GOALS,
            columns::SUCCESS_RATE,
            columns::TRAINING_LOSS,
            columns::STEPS,
        ]
        .map(position);

        let mut episode = Vec::new();
        let mut values: [Vec<Sample>; 5] = Default::default();
        let mut coerced = 0usize;

        for row in reader.records() {
            let row = row?;
            let index = episode.len();

            let id = episode_col
                .and_then(|col| row.get(col))
                .and_then(parse_episode)
                .unwrap_or(index as i64);
            episode.push(id);

            for (col, column) in value_cols.iter().zip(values.iter_mut()) {
                let cell = col.and_then(|c| row.get(c));
                let sample = cell.and_then(parse_sample);
                if sample.is_none() && cell.is_some_and(|c| !c.is_empty()) {
                    coerced += 1;
                }
                column.push(sample);
            }
        }

        if coerced > 0 {
            warn!(cells = coerced, "non-numeric cells treated as missing");
        }

        let [reward, cumulative_goals, success_rate, training_loss, steps] = values;
        Ok(MetricsRecordSet {
            episode,
            reward: Some(reward),
            cumulative_goals: Some(cumulative_goals),
            success_rate: Some(success_rate),
            training_loss: Some(training_loss),
            steps: Some(steps),
        })
    }
}

/// Integer episode id; float text such as `3.0` is accepted
fn parse_episode(cell: &str) -> Option<i64> {
    cell.parse::<i64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}

/// Numeric cell; empty, unparseable and NaN cells are missing
fn parse_sample(cell: &str) -> Sample {
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_full_header() {
        let csv = "episode,reward,cumulative_goals,success_rate,training_loss,steps\n\
                   1,-10.5,0,0.0,0.25,200\n\
                   2,3.0,1,0.5,0.125,150\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(records.episode, vec![1, 2]);
        assert_eq!(records.reward, Some(vec![Some(-10.5), Some(3.0)]));
        assert_eq!(records.cumulative_goals, Some(vec![Some(0.0), Some(1.0)]));
        assert_eq!(records.success_rate, Some(vec![Some(0.0), Some(0.5)]));
        assert_eq!(records.training_loss, Some(vec![Some(0.25), Some(0.125)]));
        assert_eq!(records.steps, Some(vec![Some(200.0), Some(150.0)]));
    }

    #[test]
    fn test_missing_columns_become_missing_cells() {
        let csv = "reward,extra\n1.0,x\n2.0,y\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(records.episode, vec![0, 1]);
        assert_eq!(records.reward, Some(vec![Some(1.0), Some(2.0)]));
        assert_eq!(records.steps, Some(vec![None, None]));
        assert_eq!(records.cumulative_goals, Some(vec![None, None]));
    }

    #[test]
    fn test_unparseable_cells_are_missing() {
        let csv = "episode,reward,steps\n1,abc,\n,nan,12\n3.0, 4.5 ,7\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(records.episode, vec![1, 1, 3]);
        assert_eq!(records.reward, Some(vec![None, None, Some(4.5)]));
        assert_eq!(records.steps, Some(vec![None, Some(12.0), Some(7.0)]));
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = "steps,episode,reward\n10,5,1.5\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records.episode, vec![5]);
        assert_eq!(records.reward, Some(vec![Some(1.5)]));
        assert_eq!(records.steps, Some(vec![Some(10.0)]));
    }

    #[test]
    fn test_header_only() {
        let csv = "episode,reward\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();
        assert!(records.is_empty());
        assert_eq!(records.reward, Some(vec![]));
    }

    #[test]
    fn test_truncated_last_row() {
        let csv = "episode,reward,cumulative_goals,success_rate,training_loss,steps\n\
                   1,1.0,0,0.0,0.5,10\n\
                   2,2.0";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(records.episode, vec![1, 2]);
        assert_eq!(records.reward, Some(vec![Some(1.0), Some(2.0)]));
        assert_eq!(records.cumulative_goals, Some(vec![Some(0.0), None]));
        assert_eq!(records.success_rate, Some(vec![Some(0.0), None]));
        assert_eq!(records.training_loss, Some(vec![Some(0.5), None]));
        assert_eq!(records.steps, Some(vec![Some(10.0), None]));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let csv = "episode,reward\n1,2.0\n2,3.0,4.0\n3,5.0\n";
        let records = RecordReader::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(records.episode, vec![1, 2, 3]);
        assert_eq!(records.reward, Some(vec![Some(2.0), Some(3.0), Some(5.0)]));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let bytes: &[u8] = b"episode,reward\n1,\xff\xfe\n";
        let result = RecordReader::from_reader(bytes);
        assert!(matches!(result, Err(MetricsError::MalformedRecord { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = RecordReader::from_path(Path::new("/nonexistent/metrics.csv"));
        assert!(matches!(result, Err(MetricsError::NotFound(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "episode,cumulative_goals").unwrap();
        writeln!(file, "1,0").unwrap();
        writeln!(file, "2,1").unwrap();

        let records = RecordReader::from_path(file.path()).unwrap();
        assert_eq!(records.episode, vec![1, 2]);
        assert_eq!(records.cumulative_goals, Some(vec![Some(0.0), Some(1.0)]));
    }
}
