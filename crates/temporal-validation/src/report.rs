use analysis_core::TimeSeriesFrame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feature that tracks the target shifted into the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakFinding {
    pub column: String,
    /// Number of periods the target was shifted backward by.
    pub shift: usize,
    pub correlation: f64,
}

/// Outcome of one `validate_temporal_integrity` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub checks_performed: Vec<String>,
    #[serde(default)]
    pub suspected_leaks: Vec<LeakFinding>,
    /// Date future contamination was checked against.
    pub analysis_date: Option<DateTime<Utc>>,
    pub row_count: usize,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({} rows): {} errors, {} warnings across {} checks",
            if self.is_valid { "VALID" } else { "INVALID" },
            self.row_count,
            self.errors.len(),
            self.warnings.len(),
            self.checks_performed.len()
        )
    }
}

/// Train/test separation diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnoopingReport {
    pub is_valid: bool,
    /// Calendar dates present in both train and test.
    pub overlap_count: usize,
    pub train_end: Option<DateTime<Utc>>,
    pub test_start: Option<DateTime<Utc>>,
    /// Whole seconds between the last train row and the first test row.
    pub gap_seconds: Option<i64>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Rows observable as of a date, with the report from re-validating them.
#[derive(Debug, Clone)]
pub struct PointInTimeDataset {
    pub as_of: DateTime<Utc>,
    pub frame: TimeSeriesFrame,
    pub report: ValidationReport,
}
