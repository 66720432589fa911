#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! CSV adapter for zone datasets and predictor output.
//!
//! Datasets use the column layout `Match_ID,Phase,White_X,White_Y,White_R`.
//! Measured rows may carry integral floats such as `298.0` in the integer
//! columns; they are accepted on read and always written back as integers.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;
use zone_forecast_core::{Circle, MatchId, MatchSequence, Phase, Point, ZoneError};

/// Errors raised while reading or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A CSV source could not be read or parsed.
    #[error("failed to read {}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying CSV failure.
        #[source]
        source: csv::Error,
    },
    /// A CSV sink could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying CSV failure.
        #[source]
        source: csv::Error,
    },
    /// Flushing a CSV sink failed.
    #[error("failed to flush {}", path.display())]
    Flush {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Rows of a match did not form a well-ordered sequence.
    #[error(transparent)]
    Sequence(#[from] ZoneError),
}

/// One `Match_ID,Phase,White_X,White_Y,White_R` dataset row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRow {
    /// Match identifier.
    #[serde(rename = "Match_ID")]
    pub match_id: String,
    /// Phase number of the circle.
    #[serde(rename = "Phase", deserialize_with = "integral")]
    pub phase: u32,
    /// Horizontal centre coordinate.
    #[serde(rename = "White_X")]
    pub x: f64,
    /// Vertical centre coordinate.
    #[serde(rename = "White_Y")]
    pub y: f64,
    /// Circle radius in pixels.
    #[serde(rename = "White_R", deserialize_with = "integral")]
    pub radius: u32,
}

impl ZoneRow {
    /// Row describing `circle`.
    #[must_use]
    pub fn from_circle(circle: &Circle) -> Self {
        Self {
            match_id: circle.match_id().to_string(),
            phase: circle.phase().get(),
            x: circle.center().x(),
            y: circle.center().y(),
            radius: circle.radius(),
        }
    }

    /// Circle described by the row.
    #[must_use]
    pub fn to_circle(&self) -> Circle {
        Circle::new(
            MatchId::new(self.match_id.as_str()),
            Phase::new(self.phase),
            Point::new(self.x, self.y),
            self.radius,
        )
    }
}

/// One `Match_ID,Phase,Pred_X,Pred_Y` predictor output row.
///
/// `Phase` is the current phase of the feature row the prediction was made for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Match identifier.
    #[serde(rename = "Match_ID")]
    pub match_id: String,
    /// Phase of the circle the prediction starts from.
    #[serde(rename = "Phase", deserialize_with = "integral")]
    pub phase: u32,
    /// Predicted horizontal centre of the next circle.
    #[serde(rename = "Pred_X")]
    pub x: f64,
    /// Predicted vertical centre of the next circle.
    #[serde(rename = "Pred_Y")]
    pub y: f64,
}

impl PredictionRow {
    /// Predicted centre.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

fn integral<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Ok(value as u32)
    } else {
        Err(D::Error::custom(format!(
            "expected a non-negative integer, found {value}"
        )))
    }
}

/// Reads every dataset row from the CSV file at `path`.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<ZoneRow>, DatasetError> {
    read_records(path.as_ref())
}

/// Reads every predictor output row from the CSV file at `path`.
pub fn read_predictions(path: impl AsRef<Path>) -> Result<Vec<PredictionRow>, DatasetError> {
    read_records(path.as_ref())
}

fn read_records<T>(path: &Path) -> Result<Vec<T>, DatasetError>
where
    T: for<'de> Deserialize<'de>,
{
    let read_error = |source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(read_error)?;
    debug!(path = %path.display(), rows = records.len(), "read csv records");
    Ok(records)
}

/// Writes `rows` to the CSV file at `path`, replacing any existing file.
pub fn write_rows(path: impl AsRef<Path>, rows: &[ZoneRow]) -> Result<(), DatasetError> {
    write_records(path.as_ref(), rows)
}

/// Writes arbitrary serialisable records to the CSV file at `path`.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DatasetError> {
    let write_error = |source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for record in records {
        writer.serialize(record).map_err(write_error)?;
    }
    writer.flush().map_err(|source| DatasetError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = records.len(), "wrote csv records");
    Ok(())
}

/// Distinct match identifiers in order of first appearance.
#[must_use]
pub fn match_ids(rows: &[ZoneRow]) -> Vec<MatchId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for row in rows {
        if seen.insert(row.match_id.as_str()) {
            ids.push(MatchId::new(row.match_id.as_str()));
        }
    }
    ids
}

/// Groups rows per match, orders each group by phase and builds sequences.
///
/// Matches keep the order in which they first appear in `rows`.
pub fn group_sequences(rows: &[ZoneRow]) -> Result<Vec<MatchSequence>, DatasetError> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&ZoneRow>> = Vec::new();
    for row in rows {
        let slot = *slots.entry(row.match_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.sort_by_key(|row| row.phase);
            let circles = group.into_iter().map(ZoneRow::to_circle).collect();
            MatchSequence::new(circles).map_err(DatasetError::from)
        })
        .collect()
}

/// Flattens sequences back into phase-ordered rows.
#[must_use]
pub fn rows_from_sequences(sequences: &[MatchSequence]) -> Vec<ZoneRow> {
    sequences
        .iter()
        .flat_map(MatchSequence::circles)
        .map(ZoneRow::from_circle)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, phase: u32, x: f64, y: f64, radius: u32) -> ZoneRow {
        ZoneRow {
            match_id: id.to_owned(),
            phase,
            x,
            y,
            radius,
        }
    }

    #[test]
    fn groups_rows_by_first_appearance_and_phase() {
        let rows = vec![
            row("mac0002", 2, 610.0, 560.0, 162),
            row("mac0001", 1, 500.0, 500.0, 298),
            row("mac0002", 1, 600.0, 550.0, 298),
            row("mac0001", 2, 520.0, 510.0, 162),
        ];
        let sequences = group_sequences(&rows).expect("well-formed rows");
        let ids: Vec<&str> = sequences
            .iter()
            .map(|sequence| sequence.match_id().as_str())
            .collect();
        assert_eq!(ids, vec!["mac0002", "mac0001"]);
        assert_eq!(sequences[0].circles()[0].center(), Point::new(600.0, 550.0));
    }

    #[test]
    fn duplicate_phases_are_rejected() {
        let rows = vec![
            row("mac0003", 1, 500.0, 500.0, 298),
            row("mac0003", 1, 501.0, 500.0, 298),
        ];
        assert!(matches!(
            group_sequences(&rows),
            Err(DatasetError::Sequence(_))
        ));
    }

    #[test]
    fn match_ids_are_distinct_and_ordered() {
        let rows = vec![
            row("mac0005", 1, 0.0, 0.0, 298),
            row("mac0004", 1, 0.0, 0.0, 298),
            row("mac0005", 2, 0.0, 0.0, 162),
        ];
        assert_eq!(
            match_ids(&rows),
            vec![MatchId::new("mac0005"), MatchId::new("mac0004")]
        );
    }

    #[test]
    fn sequences_flatten_back_to_rows() {
        let rows = vec![
            row("mac0001", 1, 500.0, 500.0, 298),
            row("mac0001", 2, 520.0, 510.0, 162),
        ];
        let sequences = group_sequences(&rows).expect("rows");
        assert_eq!(rows_from_sequences(&sequences), rows);
    }
}
