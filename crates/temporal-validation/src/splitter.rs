//! Chronological splitting.
//!
//! Train rows always precede test rows. The embargo variant drops the rows
//! inside the gap from both sides.

use std::ops::Range;

use analysis_core::TimeSeriesFrame;
use chrono::Duration;
use tracing::Level;

use crate::report::SnoopingReport;
use crate::{TemporalError, TemporalValidator};

/// One chronological train/test split.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub train: TimeSeriesFrame,
    pub test: TimeSeriesFrame,
    /// Calendar days dropped between the two sets.
    pub gap_days: i64,
    pub snooping: SnoopingReport,
}

/// One walk-forward fold.
#[derive(Debug, Clone)]
pub struct WalkForwardSplit {
    /// 1-indexed fold number.
    pub fold: usize,
    pub train_range: Range<usize>,
    pub test_range: Range<usize>,
    pub train: TimeSeriesFrame,
    pub test: TimeSeriesFrame,
}

#[derive(Debug, Clone)]
pub struct TemporalDataSplitter {
    validator: TemporalValidator,
}

impl TemporalDataSplitter {
    pub fn new(validator: TemporalValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &TemporalValidator {
        &self.validator
    }

    /// Split at row `floor(n * (1 - test_size))` of the sorted frame.
    ///
    /// With `gap_days > 0` the train set is every row before the split
    /// timestamp and the test set every row at or after split timestamp +
    /// `gap_days`. Snooping findings are logged, never raised.
    pub fn temporal_train_test_split(
        &self,
        data: &TimeSeriesFrame,
        test_size: f64,
        gap_days: i64,
    ) -> Result<SplitResult, TemporalError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(TemporalError::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        if gap_days < 0 {
            return Err(TemporalError::InvalidParameter(format!(
                "gap_days must be non-negative, got {}",
                gap_days
            )));
        }
        if data.is_empty() {
            return Err(TemporalError::InsufficientData(
                "cannot split an empty dataset".to_string(),
            ));
        }

        let sorted = data.sorted();
        let split_idx = (sorted.len() as f64 * (1.0 - test_size)) as usize;
        if split_idx == 0 || split_idx >= sorted.len() {
            return Err(TemporalError::InsufficientData(format!(
                "{} rows with test_size {} leaves an empty train or test set",
                sorted.len(),
                test_size
            )));
        }

        let (train, test) = if gap_days > 0 {
            let split_ts = sorted.timestamps()[split_idx];
            let test_from = Duration::try_days(gap_days)
                .and_then(|gap| split_ts.checked_add_signed(gap))
                .ok_or_else(|| {
                    TemporalError::InvalidParameter(format!(
                        "gap_days {} is out of range for split date {}",
                        gap_days,
                        split_ts.to_rfc3339()
                    ))
                })?;
            (
                sorted.filter_rows(|ts| *ts < split_ts),
                sorted.filter_rows(|ts| *ts >= test_from),
            )
        } else {
            (
                sorted.slice(0..split_idx),
                sorted.slice(split_idx..sorted.len()),
            )
        };

        if train.is_empty() || test.is_empty() {
            return Err(TemporalError::InsufficientData(format!(
                "gap of {} days leaves {} train and {} test rows",
                gap_days,
                train.len(),
                test.len()
            )));
        }

        let snooping = self.validator.detect_data_snooping(&train, &test);
        if !snooping.is_valid {
            self.validator.sink().record(
                Level::WARN,
                &format!(
                    "Train/test split failed snooping checks: {}",
                    snooping.errors.join("; ")
                ),
            );
        }
        self.validator.sink().record(
            Level::INFO,
            &format!(
                "Temporal split: {} train rows, {} test rows, {} rows dropped for a {}-day gap",
                train.len(),
                test.len(),
                sorted.len() - train.len() - test.len(),
                gap_days
            ),
        );

        Ok(SplitResult {
            train,
            test,
            gap_days,
            snooping,
        })
    }

    /// Rolling-origin folds: a fixed `initial_train_size` window followed by
    /// `test_size` rows, advanced `step_size` rows per fold.
    pub fn walk_forward_split(
        &self,
        data: &TimeSeriesFrame,
        initial_train_size: usize,
        test_size: usize,
        step_size: usize,
    ) -> Result<WalkForwardSplits, TemporalError> {
        if initial_train_size == 0 || test_size == 0 || step_size == 0 {
            return Err(TemporalError::InvalidParameter(format!(
                "walk-forward sizes must be positive (train {}, test {}, step {})",
                initial_train_size, test_size, step_size
            )));
        }

        let splits = WalkForwardSplits {
            frame: data.sorted(),
            initial_train_size,
            test_size,
            step_size,
            next_test_start: initial_train_size,
            fold: 0,
        };
        self.validator.sink().record(
            Level::DEBUG,
            &format!(
                "Walk-forward over {} rows: {} folds",
                splits.frame.len(),
                splits.len()
            ),
        );
        Ok(splits)
    }
}

/// Lazy walk-forward folds. Each fold owns its frames.
#[derive(Debug, Clone)]
pub struct WalkForwardSplits {
    frame: TimeSeriesFrame,
    initial_train_size: usize,
    test_size: usize,
    step_size: usize,
    next_test_start: usize,
    fold: usize,
}

impl WalkForwardSplits {
    fn remaining(&self) -> usize {
        let limit = self.frame.len().saturating_sub(self.test_size);
        if self.next_test_start >= limit {
            return 0;
        }
        (limit - self.next_test_start - 1) / self.step_size + 1
    }
}

impl Iterator for WalkForwardSplits {
    type Item = WalkForwardSplit;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_test_start;
        // A fold is produced while its test window starts before n - test_size.
        if start + self.test_size >= self.frame.len() {
            return None;
        }

        let train_range = start - self.initial_train_size..start;
        let test_range = start..start + self.test_size;
        self.next_test_start += self.step_size;
        self.fold += 1;

        Some(WalkForwardSplit {
            fold: self.fold,
            train: self.frame.slice(train_range.clone()),
            test: self.frame.slice(test_range.clone()),
            train_range,
            test_range,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for WalkForwardSplits {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationMode;
    use chrono::{DateTime, TimeZone, Utc};

    fn daily(n: usize) -> TimeSeriesFrame {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let ts: Vec<DateTime<Utc>> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        TimeSeriesFrame::new(ts)
            .with_column("x", (0..n).map(|i| i as f64).collect())
            .unwrap()
    }

    fn splitter() -> TemporalDataSplitter {
        TemporalDataSplitter::new(TemporalValidator::new(ValidationMode::Permissive))
    }

    #[test]
    fn test_split_without_gap() {
        let result = splitter().temporal_train_test_split(&daily(10), 0.2, 0).unwrap();

        assert_eq!(result.train.len(), 8);
        assert_eq!(result.test.len(), 2);
        assert!(result.snooping.is_valid);
        assert_eq!(result.test.column("x").unwrap(), &[8.0, 9.0]);
    }

    #[test]
    fn test_split_sorts_input() {
        let shuffled = daily(10).select_rows(&[9, 0, 8, 1, 7, 2, 6, 3, 5, 4]);
        let result = splitter().temporal_train_test_split(&shuffled, 0.5, 0).unwrap();

        assert_eq!(result.train.column("x").unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_split_rejects_bad_parameters() {
        let s = splitter();
        assert!(matches!(
            s.temporal_train_test_split(&daily(10), 0.0, 0),
            Err(TemporalError::InvalidParameter(_))
        ));
        assert!(matches!(
            s.temporal_train_test_split(&daily(10), 1.0, 0),
            Err(TemporalError::InvalidParameter(_))
        ));
        assert!(matches!(
            s.temporal_train_test_split(&daily(10), 0.2, -1),
            Err(TemporalError::InvalidParameter(_))
        ));
        assert!(matches!(
            s.temporal_train_test_split(&TimeSeriesFrame::default(), 0.2, 0),
            Err(TemporalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_gap_larger_than_test_window_is_an_error() {
        let result = splitter().temporal_train_test_split(&daily(10), 0.2, 30);
        assert!(matches!(result, Err(TemporalError::InsufficientData(_))));
    }

    #[test]
    fn test_gap_beyond_date_range_is_rejected() {
        let s = splitter();
        for gap in [i64::MAX / 2, i64::MAX] {
            let result = s.temporal_train_test_split(&daily(50), 0.2, gap);
            assert!(matches!(result, Err(TemporalError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_splitter_is_cloneable() {
        let s = splitter();
        let copy = s.clone();
        assert_eq!(copy.validator().mode(), ValidationMode::Permissive);
        assert!(format!("{:?}", copy).starts_with("TemporalDataSplitter"));
    }

    #[test]
    fn test_walk_forward_rejects_zero_sizes() {
        let s = splitter();
        assert!(s.walk_forward_split(&daily(50), 0, 5, 1).is_err());
        assert!(s.walk_forward_split(&daily(50), 10, 0, 1).is_err());
        assert!(s.walk_forward_split(&daily(50), 10, 5, 0).is_err());
    }

    #[test]
    fn test_walk_forward_step_one() {
        let folds: Vec<_> = splitter()
            .walk_forward_split(&daily(30), 20, 5, 1)
            .unwrap()
            .collect();

        // test starts 20, 21, 22, 23, 24 (< 30 - 5)
        assert_eq!(folds.len(), 5);
        assert_eq!(folds[4].train_range, 4..24);
        assert_eq!(folds[4].test_range, 24..29);
    }

    #[test]
    fn test_walk_forward_len_matches_iteration() {
        let splits = splitter().walk_forward_split(&daily(57), 10, 7, 3).unwrap();
        let expected = splits.len();
        assert_eq!(splits.count(), expected);

        let none = splitter().walk_forward_split(&daily(10), 10, 5, 1).unwrap();
        assert_eq!(none.len(), 0);
    }
}
