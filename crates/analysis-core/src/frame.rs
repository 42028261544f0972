use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// A named numeric column. Missing values are `NaN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(with = "nan_as_null")]
    pub values: Vec<f64>,
}

/// Time-indexed table of features plus an optional target column.
///
/// Timestamp order is not enforced on construction; the temporal validator is
/// what reports duplicates and out-of-order rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord", into = "FrameRecord")]
pub struct TimeSeriesFrame {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
    target: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct FrameRecord {
    timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    target: Option<String>,
}

impl TryFrom<FrameRecord> for TimeSeriesFrame {
    type Error = AnalysisError;

    fn try_from(record: FrameRecord) -> Result<Self, Self::Error> {
        let mut frame = TimeSeriesFrame::new(record.timestamps);
        for column in record.columns {
            frame.insert_column(column.name, column.values)?;
        }
        match record.target {
            Some(target) => frame.with_target(target),
            None => Ok(frame),
        }
    }
}

impl From<TimeSeriesFrame> for FrameRecord {
    fn from(frame: TimeSeriesFrame) -> Self {
        Self {
            timestamps: frame.timestamps,
            columns: frame.columns,
            target: frame.target,
        }
    }
}

impl TimeSeriesFrame {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
            target: None,
        }
    }

    /// Builder-style [`insert_column`](Self::insert_column).
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, AnalysisError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), AnalysisError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(AnalysisError::InvalidData(format!(
                "Column '{}' has {} values but frame has {} rows",
                name,
                values.len(),
                self.timestamps.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Mark an existing column as the label.
    pub fn with_target(mut self, name: impl Into<String>) -> Result<Self, AnalysisError> {
        let name = name.into();
        if self.column(&name).is_none() {
            return Err(AnalysisError::ColumnNotFound(name));
        }
        self.target = Some(name);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn target_values(&self) -> Option<&[f64]> {
        self.target.as_deref().and_then(|t| self.column(t))
    }

    /// Every column except the target.
    pub fn feature_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| Some(*name) != self.target.as_deref())
            .collect()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.iter().min().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.iter().max().copied()
    }

    /// True when timestamps are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] < w[1])
    }

    /// New frame holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: indices.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
            target: self.target.clone(),
        }
    }

    /// Positional slice; out-of-range bounds are clamped.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        self.select_rows(&indices)
    }

    /// Keep rows whose timestamp satisfies `keep`.
    pub fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> bool,
    {
        let indices: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| keep(ts))
            .map(|(i, _)| i)
            .collect();
        self.select_rows(&indices)
    }

    /// Chronologically sorted copy (stable for equal timestamps).
    pub fn sorted(&self) -> Self {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by_key(|&i| self.timestamps[i]);
        self.select_rows(&indices)
    }

    /// Drop rows where any column is not finite (indicator warm-up, shifted-in rows).
    pub fn drop_incomplete_rows(&self) -> Self {
        let indices: Vec<usize> = (0..self.len())
            .filter(|&i| self.columns.iter().all(|c| c.values[i].is_finite()))
            .collect();
        self.select_rows(&indices)
    }

    /// Median positive spacing between consecutive (sorted) timestamps.
    pub fn sampling_period(&self) -> Option<Duration> {
        let mut ts = self.timestamps.clone();
        ts.sort();
        let mut deltas: Vec<Duration> = ts
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| *d > Duration::zero())
            .collect();
        if deltas.is_empty() {
            return None;
        }
        deltas.sort();
        Some(deltas[deltas.len() / 2])
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
