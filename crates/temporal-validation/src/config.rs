use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::TemporalError;

/// Failure posture of a validator.
///
/// `Permissive` records every finding and returns the report; `Strict`
/// turns integrity errors (future rows, ordering, leaked features) into
/// [`TemporalError::IntegrityViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Strict,
    Permissive,
}

impl std::fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationMode::Strict => write!(f, "strict"),
            ValidationMode::Permissive => write!(f, "permissive"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ValidationMode::Strict),
            "permissive" | "lenient" => Ok(ValidationMode::Permissive),
            _ => Err(TemporalError::Config(format!("Invalid validation mode: {}", s))),
        }
    }
}

/// The individual integrity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    FutureContamination,
    TemporalOrdering,
    LookaheadBias,
    DataGaps,
    WeekdayCoverage,
}

impl CheckKind {
    pub const ALL: [CheckKind; 5] = [
        CheckKind::FutureContamination,
        CheckKind::TemporalOrdering,
        CheckKind::LookaheadBias,
        CheckKind::DataGaps,
        CheckKind::WeekdayCoverage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::FutureContamination => "future_contamination",
            CheckKind::TemporalOrdering => "temporal_ordering",
            CheckKind::LookaheadBias => "lookahead_bias",
            CheckKind::DataGaps => "data_gaps",
            CheckKind::WeekdayCoverage => "weekday_coverage",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CheckKind {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CheckKind::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| TemporalError::Config(format!("Unknown check: {}", s)))
    }
}

/// Thresholds and toggles for [`TemporalValidator`](crate::TemporalValidator).
///
/// The correlation thresholds are tuning constants for a best-effort linter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Checks to run, in order.
    pub checks: Vec<CheckKind>,
    /// Rows per rolling feature/target correlation window.
    pub rolling_window: usize,
    /// |corr| above which a window counts as mirroring the target.
    pub rolling_correlation_threshold: f64,
    /// Fraction of mirroring windows above which a warning is raised.
    pub suspicious_window_ratio: f64,
    /// |corr| against the future target above which a feature is a leak.
    pub shifted_correlation_threshold: f64,
    /// Periods the target is shifted backward by when hunting for leaks.
    pub shift_periods: Vec<usize>,
    /// Minimum finite pairs before a shifted correlation is trusted.
    pub min_correlation_samples: usize,
    /// Calendar-day spacing that counts as a data gap.
    pub max_gap_days: i64,
    /// Fraction of weekend rows tolerated for weekday-only markets.
    pub max_weekend_ratio: f64,
    /// Crypto and similar markets trade every day; disables the weekend check.
    pub market_trades_weekends: bool,
    /// Raw price/volume columns that are allowed to track the target.
    pub price_columns: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            checks: CheckKind::ALL.to_vec(),
            rolling_window: 20,
            rolling_correlation_threshold: 0.95,
            suspicious_window_ratio: 0.10,
            shifted_correlation_threshold: 0.98,
            shift_periods: vec![1, 2, 3, 5],
            min_correlation_samples: 10,
            max_gap_days: 7,
            max_weekend_ratio: 0.05,
            market_trades_weekends: false,
            price_columns: ["open", "high", "low", "close", "adj_close", "volume", "vwap"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ValidatorConfig {
    /// Load overrides from `TEMPORAL_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self, TemporalError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let checks = match env::var("TEMPORAL_CHECKS") {
            Ok(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(CheckKind::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.checks,
        };

        let shift_periods = match env::var("TEMPORAL_SHIFT_PERIODS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| parse_value("TEMPORAL_SHIFT_PERIODS", s.trim()))
                .collect::<Result<Vec<usize>, _>>()?,
            Err(_) => defaults.shift_periods,
        };

        let price_columns = env::var("TEMPORAL_PRICE_COLUMNS")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or(defaults.price_columns);

        let config = Self {
            checks,
            rolling_window: env_or("TEMPORAL_ROLLING_WINDOW", defaults.rolling_window)?,
            rolling_correlation_threshold: env_or(
                "TEMPORAL_ROLLING_CORR_THRESHOLD",
                defaults.rolling_correlation_threshold,
            )?,
            suspicious_window_ratio: env_or(
                "TEMPORAL_SUSPICIOUS_WINDOW_RATIO",
                defaults.suspicious_window_ratio,
            )?,
            shifted_correlation_threshold: env_or(
                "TEMPORAL_SHIFTED_CORR_THRESHOLD",
                defaults.shifted_correlation_threshold,
            )?,
            shift_periods,
            min_correlation_samples: env_or(
                "TEMPORAL_MIN_CORR_SAMPLES",
                defaults.min_correlation_samples,
            )?,
            max_gap_days: env_or("TEMPORAL_MAX_GAP_DAYS", defaults.max_gap_days)?,
            max_weekend_ratio: env_or("TEMPORAL_MAX_WEEKEND_RATIO", defaults.max_weekend_ratio)?,
            market_trades_weekends: env_or(
                "TEMPORAL_MARKET_TRADES_WEEKENDS",
                defaults.market_trades_weekends,
            )?,
            price_columns,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations that make the checks meaningless.
    pub fn validate(&self) -> Result<(), TemporalError> {
        if self.rolling_window < 2 {
            return Err(TemporalError::Config(
                "rolling_window must be at least 2".to_string(),
            ));
        }
        for (name, value) in [
            ("rolling_correlation_threshold", self.rolling_correlation_threshold),
            ("shifted_correlation_threshold", self.shifted_correlation_threshold),
            ("suspicious_window_ratio", self.suspicious_window_ratio),
            ("max_weekend_ratio", self.max_weekend_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TemporalError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.shift_periods.iter().any(|&p| p == 0) {
            return Err(TemporalError::Config(
                "shift_periods must be positive".to_string(),
            ));
        }
        if self.max_gap_days <= 0 || Duration::try_days(self.max_gap_days).is_none() {
            return Err(TemporalError::Config(format!(
                "max_gap_days must be a positive number of days within the date range, got {}",
                self.max_gap_days
            )));
        }
        Ok(())
    }

    pub fn is_enabled(&self, check: CheckKind) -> bool {
        self.checks.contains(&check)
    }

    pub fn is_price_column(&self, name: &str) -> bool {
        self.price_columns
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, TemporalError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, raw.trim()),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, TemporalError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| TemporalError::Config(format!("{}={}: {}", key, raw, e)))
}
