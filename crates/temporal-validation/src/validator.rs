//! Temporal integrity validation.
//!
//! Detects conditions that would let a backtest or a live feature see data
//! from after the stated analysis date.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use analysis_core::TimeSeriesFrame;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::Level;

use crate::checks::{self, CheckOutcome};
use crate::report::{PointInTimeDataset, SnoopingReport, ValidationReport};
use crate::sink::{DiagnosticSink, TracingSink};
use crate::{CheckKind, TemporalError, ValidationMode, ValidatorConfig};

#[derive(Clone)]
pub struct TemporalValidator {
    config: ValidatorConfig,
    mode: ValidationMode,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for TemporalValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporalValidator")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl TemporalValidator {
    /// Validator with default thresholds reporting through `tracing`.
    pub fn new(mode: ValidationMode) -> Self {
        Self::with_config(ValidatorConfig::default(), mode)
    }

    pub fn with_config(config: ValidatorConfig, mode: ValidationMode) -> Self {
        Self {
            config,
            mode,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Run every enabled check against `data` as of `analysis_date` (now when `None`).
    ///
    /// In [`ValidationMode::Strict`] any error is returned as
    /// [`TemporalError::IntegrityViolation`]; otherwise findings are recorded
    /// and handed back in the report.
    pub fn validate_temporal_integrity(
        &self,
        data: &TimeSeriesFrame,
        analysis_date: Option<DateTime<Utc>>,
    ) -> Result<ValidationReport, TemporalError> {
        let analysis_date = analysis_date.unwrap_or_else(Utc::now);
        let mut report = ValidationReport {
            analysis_date: Some(analysis_date),
            row_count: data.len(),
            ..Default::default()
        };

        if data.is_empty() {
            report.is_valid = true;
            report.warnings.push("Dataset is empty; nothing to validate".to_string());
            self.emit(&report);
            return Ok(report);
        }

        // Ordering is checked on the frame as given, everything else on a sorted copy.
        let sorted = if data.is_strictly_increasing() {
            None
        } else {
            Some(data.sorted())
        };
        let chronological = sorted.as_ref().unwrap_or(data);

        for check in CheckKind::ALL
            .into_iter()
            .filter(|c| self.config.is_enabled(*c))
        {
            let outcome: CheckOutcome = match check {
                CheckKind::FutureContamination => {
                    checks::future_contamination(data, analysis_date)
                }
                CheckKind::TemporalOrdering => checks::temporal_ordering(data),
                CheckKind::LookaheadBias => checks::lookahead_bias(chronological, &self.config),
                CheckKind::DataGaps => checks::data_gaps(chronological, &self.config),
                CheckKind::WeekdayCoverage => checks::weekday_coverage(chronological),
            };
            report.checks_performed.push(check.name().to_string());
            report.errors.extend(outcome.errors);
            report.warnings.extend(outcome.warnings);
            report.suspected_leaks.extend(outcome.leaks);
        }

        report.is_valid = report.errors.is_empty();
        self.emit(&report);

        if self.mode == ValidationMode::Strict && !report.is_valid {
            return Err(TemporalError::IntegrityViolation {
                errors: report.errors,
            });
        }
        Ok(report)
    }

    /// Rows observable as of `as_of`, optionally limited to the trailing
    /// `lookback_days`, re-validated against `as_of`.
    pub fn create_point_in_time_dataset(
        &self,
        data: &TimeSeriesFrame,
        as_of: DateTime<Utc>,
        lookback_days: Option<i64>,
    ) -> Result<PointInTimeDataset, TemporalError> {
        if let Some(days) = lookback_days {
            if days < 0 {
                return Err(TemporalError::InvalidParameter(format!(
                    "lookback_days must be non-negative, got {}",
                    days
                )));
            }
        }

        // A lookback reaching past the representable range means no lower bound.
        let window_start = lookback_days.and_then(|days| {
            Duration::try_days(days).and_then(|window| as_of.checked_sub_signed(window))
        });
        let frame = data
            .filter_rows(|ts| *ts <= as_of && window_start.map_or(true, |start| *ts >= start))
            .sorted();

        self.sink.record(
            Level::INFO,
            &format!(
                "Point-in-time dataset as of {}: kept {} of {} rows",
                as_of.to_rfc3339(),
                frame.len(),
                data.len()
            ),
        );

        let report = self.validate_temporal_integrity(&frame, Some(as_of))?;
        Ok(PointInTimeDataset {
            as_of,
            frame,
            report,
        })
    }

    /// Check that `test` lies strictly after `train` with no shared rows.
    pub fn detect_data_snooping(
        &self,
        train: &TimeSeriesFrame,
        test: &TimeSeriesFrame,
    ) -> SnoopingReport {
        let mut report = SnoopingReport {
            train_end: train.last_timestamp(),
            test_start: test.first_timestamp(),
            ..Default::default()
        };

        let (Some(train_end), Some(test_start)) = (report.train_end, report.test_start) else {
            report.is_valid = true;
            report
                .warnings
                .push("Train or test set is empty; snooping checks skipped".to_string());
            self.emit_snooping(&report);
            return report;
        };

        let train_rows: HashSet<&DateTime<Utc>> = train.timestamps().iter().collect();
        let shared_rows = test
            .timestamps()
            .iter()
            .filter(|ts| train_rows.contains(ts))
            .count();
        if shared_rows > 0 {
            report.errors.push(format!(
                "Train and test share {} timestamps",
                shared_rows
            ));
        }

        let train_dates: BTreeSet<NaiveDate> =
            train.timestamps().iter().map(|ts| ts.date_naive()).collect();
        let test_dates: BTreeSet<NaiveDate> =
            test.timestamps().iter().map(|ts| ts.date_naive()).collect();
        report.overlap_count = train_dates.intersection(&test_dates).count();
        if report.overlap_count > 0 {
            report.errors.push(format!(
                "Train and test overlap on {} calendar dates",
                report.overlap_count
            ));
        }

        let gap = test_start - train_end;
        report.gap_seconds = Some(gap.num_seconds());
        if test_start <= train_end {
            report.errors.push(format!(
                "Test data starts at {} but training data runs until {}",
                test_start.to_rfc3339(),
                train_end.to_rfc3339()
            ));
        } else if let Some(period) = train.sampling_period().or_else(|| test.sampling_period()) {
            if gap < period {
                report.warnings.push(format!(
                    "No embargo: gap of {}s between train and test is under one sampling period ({}s)",
                    gap.num_seconds(),
                    period.num_seconds()
                ));
            }
        }

        report.is_valid = report.errors.is_empty();
        self.emit_snooping(&report);
        report
    }

    fn emit(&self, report: &ValidationReport) {
        for error in &report.errors {
            self.sink.record(Level::ERROR, error);
        }
        for warning in &report.warnings {
            self.sink.record(Level::WARN, warning);
        }
        self.sink.record(
            Level::DEBUG,
            &format!("Temporal validation: {}", report.summary()),
        );
    }

    fn emit_snooping(&self, report: &SnoopingReport) {
        for error in &report.errors {
            self.sink.record(Level::ERROR, &format!("Data snooping: {}", error));
        }
        for warning in &report.warnings {
            self.sink.record(Level::WARN, &format!("Data snooping: {}", warning));
        }
    }
}
