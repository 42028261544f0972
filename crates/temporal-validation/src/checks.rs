//! The individual integrity checks. Each one is pure over a frame and a config.

use std::collections::{BTreeSet, HashSet};

use analysis_core::series::{pearson, rolling_correlation, shift};
use analysis_core::{is_weekend, TimeSeriesFrame};
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

use crate::report::LeakFinding;
use crate::ValidatorConfig;

const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Default)]
pub(crate) struct CheckOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub leaks: Vec<LeakFinding>,
}

/// Rows stamped after the analysis date.
pub(crate) fn future_contamination(
    frame: &TimeSeriesFrame,
    analysis_date: DateTime<Utc>,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let future: Vec<&DateTime<Utc>> = frame
        .timestamps()
        .iter()
        .filter(|ts| **ts > analysis_date)
        .collect();

    if let Some(latest) = future.iter().max() {
        outcome.errors.push(format!(
            "Future data detected: {} rows after analysis date {} (latest {})",
            future.len(),
            analysis_date.to_rfc3339(),
            latest.to_rfc3339()
        ));
    }
    outcome
}

/// Duplicate and out-of-order timestamps.
pub(crate) fn temporal_ordering(frame: &TimeSeriesFrame) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let timestamps = frame.timestamps();

    let mut seen = HashSet::with_capacity(timestamps.len());
    let duplicates = timestamps.iter().filter(|ts| !seen.insert(**ts)).count();
    if duplicates > 0 {
        outcome.errors.push(format!(
            "Duplicate timestamps: {} rows share a timestamp with an earlier row",
            duplicates
        ));
    }

    let out_of_order = timestamps.windows(2).filter(|w| w[1] < w[0]).count();
    if out_of_order > 0 {
        outcome.errors.push(format!(
            "Timestamps are not monotonically increasing: {} rows precede their predecessor",
            out_of_order
        ));
    }
    outcome
}

/// Features that mirror the target, or track the target of a later row.
///
/// Expects a chronologically sorted frame.
pub(crate) fn lookahead_bias(frame: &TimeSeriesFrame, config: &ValidatorConfig) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    let (Some(target_name), Some(target)) = (frame.target_name(), frame.target_values()) else {
        outcome
            .warnings
            .push("No target column set; look-ahead bias checks skipped".to_string());
        return outcome;
    };

    let shifted_targets: Vec<(usize, Vec<f64>)> = config
        .shift_periods
        .iter()
        .map(|&k| (k, shift(target, -(k as isize))))
        .collect();

    for name in frame.feature_names() {
        if config.is_price_column(name) {
            continue;
        }
        let Some(values) = frame.column(name) else {
            continue;
        };

        let rolling = rolling_correlation(values, target, config.rolling_window);
        let defined: Vec<f64> = rolling.into_iter().filter(|r| r.is_finite()).collect();
        if !defined.is_empty() {
            let mirrored = defined
                .iter()
                .filter(|r| r.abs() > config.rolling_correlation_threshold)
                .count();
            let ratio = mirrored as f64 / defined.len() as f64;
            if ratio > config.suspicious_window_ratio {
                outcome.warnings.push(format!(
                    "Feature '{}' mirrors target '{}' in {:.1}% of {}-period windows (|corr| > {})",
                    name,
                    target_name,
                    ratio * 100.0,
                    config.rolling_window,
                    config.rolling_correlation_threshold
                ));
            }
        }

        // Every matching shift is reported; several can fire for one column.
        for (k, shifted) in &shifted_targets {
            let Some(r) = pearson(values, shifted, config.min_correlation_samples) else {
                continue;
            };
            if r.abs() > config.shifted_correlation_threshold {
                outcome.errors.push(format!(
                    "Feature '{}' correlates with target '{}' shifted by -{} periods (corr={:.3}); likely look-ahead leak",
                    name, target_name, k, r
                ));
                outcome.leaks.push(LeakFinding {
                    column: name.to_string(),
                    shift: *k,
                    correlation: r,
                });
            }
        }
    }
    outcome
}

/// Long calendar gaps and weekend rows in weekday-only markets.
pub(crate) fn data_gaps(frame: &TimeSeriesFrame, config: &ValidatorConfig) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let mut timestamps = frame.timestamps().to_vec();
    timestamps.sort();

    // An unrepresentable limit cannot be exceeded by any gap.
    let gaps: Vec<Duration> = match Duration::try_days(config.max_gap_days) {
        Some(limit) => timestamps
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| *d > limit)
            .collect(),
        None => Vec::new(),
    };
    if let Some(largest) = gaps.iter().max() {
        outcome.warnings.push(format!(
            "Data gaps: {} gaps longer than {} days (largest {} days)",
            gaps.len(),
            config.max_gap_days,
            largest.num_days()
        ));
    }

    if !config.market_trades_weekends && !timestamps.is_empty() {
        let weekend_rows = timestamps.iter().filter(|ts| is_weekend(ts)).count();
        let ratio = weekend_rows as f64 / timestamps.len() as f64;
        if ratio > config.max_weekend_ratio {
            outcome.warnings.push(format!(
                "Weekend data: {} of {} rows ({:.1}%) fall on a weekend",
                weekend_rows,
                timestamps.len(),
                ratio * 100.0
            ));
        }
    }
    outcome
}

/// Weekdays that never appear anywhere in the series.
pub(crate) fn weekday_coverage(frame: &TimeSeriesFrame) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    if frame.is_empty() {
        return outcome;
    }

    let present: BTreeSet<u32> = frame
        .timestamps()
        .iter()
        .map(|ts| ts.weekday().num_days_from_monday())
        .collect();
    let missing: Vec<String> = WEEKDAYS
        .iter()
        .filter(|d| !present.contains(&d.num_days_from_monday()))
        .map(|d| d.to_string())
        .collect();

    if !missing.is_empty() {
        outcome.warnings.push(format!(
            "Weekday coverage: no rows on {}",
            missing.join(", ")
        ));
    }
    outcome
}
