use std::collections::HashSet;
use std::sync::Arc;

use analysis_core::series::shift;
use analysis_core::TimeSeriesFrame;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::Level;

use crate::*;

/// Helper: `n` consecutive weekdays starting Monday 2023-01-02.
fn business_days(n: usize) -> Vec<DateTime<Utc>> {
    let mut day = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

/// Helper: i.i.d. noise so that only deliberate leaks correlate.
fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>() - 0.5).collect()
}

/// Helper: frame with a random target, a lagged target, an unrelated
/// feature and a random-walk close price.
fn clean_frame(n: usize) -> TimeSeriesFrame {
    let target = noise(n, 7);
    let close: Vec<f64> = target
        .iter()
        .scan(100.0, |p, r| {
            *p += r;
            Some(*p)
        })
        .collect();

    TimeSeriesFrame::new(business_days(n))
        .with_column("close", close)
        .unwrap()
        .with_column("target_lag_1", shift(&target, 1))
        .unwrap()
        .with_column("unrelated", noise(n, 11))
        .unwrap()
        .with_column("target", target)
        .unwrap()
        .with_target("target")
        .unwrap()
}

fn permissive() -> TemporalValidator {
    TemporalValidator::new(ValidationMode::Permissive)
}

fn after(frame: &TimeSeriesFrame) -> Option<DateTime<Utc>> {
    frame.last_timestamp().map(|ts| ts + Duration::days(1))
}

#[test]
fn test_clean_frame_is_valid() {
    let frame = clean_frame(120);
    let report = permissive()
        .validate_temporal_integrity(&frame, after(&frame))
        .unwrap();

    assert!(report.is_valid, "unexpected errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.checks_performed.len(), 5);
    assert_eq!(report.row_count, 120);
}

#[test]
fn test_analysis_date_on_last_row_is_not_future() {
    let frame = clean_frame(60);
    let report = permissive()
        .validate_temporal_integrity(&frame, frame.last_timestamp())
        .unwrap();

    assert!(!report.errors.iter().any(|e| e.contains("Future data")));
}

#[test]
fn test_future_row_is_an_error() {
    let frame = clean_frame(60);
    let analysis_date = frame.timestamps()[49];

    let report = permissive()
        .validate_temporal_integrity(&frame, Some(analysis_date))
        .unwrap();
    assert!(!report.is_valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("Future data") && e.contains("10 rows")));
}

#[test]
fn test_strict_mode_raises_on_future_row() {
    let frame = clean_frame(60);
    let strict = TemporalValidator::new(ValidationMode::Strict);

    let result = strict.validate_temporal_integrity(&frame, Some(frame.timestamps()[10]));
    match result {
        Err(TemporalError::IntegrityViolation { errors }) => {
            assert!(errors.iter().any(|e| e.contains("Future data")));
        }
        other => panic!("expected integrity violation, got {:?}", other),
    }

    // Warnings alone never raise
    assert!(strict
        .validate_temporal_integrity(&frame, after(&frame))
        .is_ok());
}

#[test]
fn test_duplicate_timestamp_is_an_error() {
    let frame = clean_frame(40);
    let mut rows: Vec<usize> = (0..40).collect();
    rows.insert(20, 20);
    let duplicated = frame.select_rows(&rows);

    let report = permissive()
        .validate_temporal_integrity(&duplicated, after(&frame))
        .unwrap();

    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("Duplicate timestamps: 1")));
}

#[test]
fn test_out_of_order_rows_are_an_error() {
    let frame = clean_frame(40);
    let mut rows: Vec<usize> = (0..40).collect();
    rows.swap(10, 11);
    let shuffled = frame.select_rows(&rows);

    let report = permissive()
        .validate_temporal_integrity(&shuffled, after(&frame))
        .unwrap();

    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("monotonically")));
    // Gap and coverage checks run on the sorted copy
    assert!(report.warnings.is_empty());
}

#[test]
fn test_target_shifted_two_is_reported_as_leak() {
    let n = 150;
    let frame = clean_frame(n);
    let target = frame.target_values().unwrap().to_vec();
    let leaky = frame.with_column("leaky", shift(&target, -2)).unwrap();

    let report = permissive()
        .validate_temporal_integrity(&leaky, after(&leaky))
        .unwrap();

    assert!(!report.is_valid);
    assert_eq!(
        report.suspected_leaks.iter().map(|l| (l.column.as_str(), l.shift)).collect::<Vec<_>>(),
        vec![("leaky", 2)]
    );
    assert!(report.suspected_leaks[0].correlation > 0.99);
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("'leaky'") && e.contains("shifted by -2")));
}

#[test]
fn test_every_matching_shift_is_reported() {
    let n = 80;
    let trend: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let frame = TimeSeriesFrame::new(business_days(n))
        .with_column("target", trend.clone())
        .unwrap()
        .with_column("next_value", shift(&trend, -1))
        .unwrap()
        .with_target("target")
        .unwrap();

    let report = permissive()
        .validate_temporal_integrity(&frame, after(&frame))
        .unwrap();

    let shifts: Vec<usize> = report.suspected_leaks.iter().map(|l| l.shift).collect();
    assert_eq!(shifts, vec![1, 2, 3, 5]);
    // The same-period mirror shows up as a warning as well
    assert!(report.warnings.iter().any(|w| w.contains("'next_value' mirrors")));
}

#[test]
fn test_price_columns_are_exempt_from_lookahead() {
    let n = 80;
    let frame = clean_frame(n);
    let target = frame.target_values().unwrap().to_vec();
    let frame = frame.with_column("Close", target).unwrap();

    let report = permissive()
        .validate_temporal_integrity(&frame, after(&frame))
        .unwrap();
    assert!(report.suspected_leaks.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_validation_is_idempotent() {
    let frame = clean_frame(100);
    let target = frame.target_values().unwrap().to_vec();
    let frame = frame.with_column("leaky", shift(&target, -3)).unwrap();
    let validator = permissive();
    let date = after(&frame);

    let first = validator.validate_temporal_integrity(&frame, date).unwrap();
    let second = validator.validate_temporal_integrity(&frame, date).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_point_in_time_dataset_with_lookback() {
    let frame = clean_frame(100);
    let as_of = frame.timestamps()[59];
    let sink = Arc::new(MemorySink::new());
    let validator = permissive().with_sink(sink.clone());

    let pit = validator
        .create_point_in_time_dataset(&frame, as_of, Some(28))
        .unwrap();

    assert_eq!(pit.as_of, as_of);
    assert!(pit.frame.timestamps().iter().all(|ts| *ts <= as_of));
    assert!(pit
        .frame
        .timestamps()
        .iter()
        .all(|ts| *ts >= as_of - Duration::days(28)));
    // 28 calendar days back from a weekday covers exactly 21 weekdays
    assert_eq!(pit.frame.len(), 21);
    assert!(pit.report.is_valid);
    assert!(sink
        .messages_at(Level::INFO)
        .iter()
        .any(|m| m.contains("kept 21 of 100 rows")));
}

#[test]
fn test_point_in_time_without_lookback_keeps_history() {
    let frame = clean_frame(100);
    let as_of = frame.timestamps()[59];
    let pit = permissive()
        .create_point_in_time_dataset(&frame, as_of, None)
        .unwrap();

    assert_eq!(pit.frame.len(), 60);
    assert!(!pit.report.errors.iter().any(|e| e.contains("Future data")));
}

#[test]
fn test_train_test_split_with_gap_drops_gap_rows() {
    let frame = clean_frame(200);
    let splitter = TemporalDataSplitter::new(permissive());
    let result = splitter.temporal_train_test_split(&frame, 0.2, 5).unwrap();

    let train_max = result.train.last_timestamp().unwrap();
    let test_min = result.test.first_timestamp().unwrap();
    assert!(train_max < test_min - Duration::days(5));

    let split_ts = frame.timestamps()[160];
    let gap_end = split_ts + Duration::days(5);
    for ts in result.train.timestamps().iter().chain(result.test.timestamps()) {
        assert!(!(*ts >= split_ts && *ts < gap_end), "row {} inside gap", ts);
    }
    assert!(result.train.len() + result.test.len() < 200);
    assert_eq!(result.train.len(), 160);
    assert!(result.snooping.is_valid);
}

#[test]
fn test_walk_forward_yields_four_folds() {
    let frame = clean_frame(200);
    let splitter = TemporalDataSplitter::new(permissive());
    let folds: Vec<WalkForwardSplit> = splitter
        .walk_forward_split(&frame, 100, 20, 20)
        .unwrap()
        .collect();

    let ranges: Vec<_> = folds
        .iter()
        .map(|f| (f.train_range.clone(), f.test_range.clone()))
        .collect();
    assert_eq!(
        ranges,
        vec![
            (0..100, 100..120),
            (20..120, 120..140),
            (40..140, 140..160),
            (60..160, 160..180),
        ]
    );

    for fold in &folds {
        let train: HashSet<_> = fold.train.timestamps().iter().collect();
        assert!(fold.test.timestamps().iter().all(|ts| !train.contains(ts)));
        assert!(fold.train.last_timestamp() < fold.test.first_timestamp());
        assert_eq!(fold.train.len(), 100);
        assert_eq!(fold.test.len(), 20);
    }
    assert_eq!(folds.iter().map(|f| f.fold).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[test]
fn test_snooping_counts_shared_calendar_dates() {
    let frame = clean_frame(30);
    let train = frame.slice(0..15);
    let test = frame.slice(11..30);

    let report = permissive().detect_data_snooping(&train, &test);
    assert!(!report.is_valid);
    assert_eq!(report.overlap_count, 4);
}

#[test]
fn test_snooping_flags_test_before_train() {
    let frame = clean_frame(30);
    let report = permissive().detect_data_snooping(&frame.slice(20..30), &frame.slice(0..10));

    assert!(!report.is_valid);
    assert_eq!(report.overlap_count, 0);
    assert!(report.errors.iter().any(|e| e.contains("Test data starts")));
}

#[test]
fn test_weekend_rows_and_gaps_are_warnings_only() {
    let n = 60;
    let mut timestamps = business_days(n);
    // Every fifth row moved to the following Saturday
    for (i, ts) in timestamps.iter_mut().enumerate() {
        if i % 5 == 4 {
            *ts += Duration::days(1);
        }
    }
    // A two-week hole near the end
    for ts in timestamps.iter_mut().skip(50) {
        *ts += Duration::days(14);
    }
    let frame = TimeSeriesFrame::new(timestamps)
        .with_column("x", noise(n, 3))
        .unwrap()
        .with_column("target", noise(n, 4))
        .unwrap()
        .with_target("target")
        .unwrap();

    let report = TemporalValidator::new(ValidationMode::Strict)
        .validate_temporal_integrity(&frame, after(&frame))
        .unwrap();

    assert!(report.is_valid);
    assert!(report.warnings.iter().any(|w| w.starts_with("Weekend data")));
    assert!(report.warnings.iter().any(|w| w.starts_with("Data gaps")));
    assert!(report.warnings.iter().any(|w| w.contains("no rows on Fri")));
}
