use analysis_core::TargetKind;
use serde::{Deserialize, Serialize};

use crate::ProcessorError;

/// Feature set and hand-off settings for [`ForecastingDataProcessor`](crate::ForecastingDataProcessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    /// Lags (in rows) of the simple return; each must be `>= feature_lag`.
    pub return_lags: Vec<usize>,
    pub volatility_periods: Vec<usize>,
    pub volume_sma_period: usize,
    /// Rows every indicator is shifted by; at least 1.
    pub feature_lag: usize,
    pub target: TargetKind,
    /// Keep unshifted OHLCV columns (exempt from the look-ahead heuristic).
    pub include_price_columns: bool,
    /// Drop leading rows where any column is still `NaN`.
    pub drop_warmup_rows: bool,
    pub test_size: f64,
    /// Embargo between train and test, in calendar days.
    pub gap_days: i64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sma_periods: vec![5, 10, 20, 50],
            ema_periods: vec![12, 26],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
            return_lags: vec![1, 2, 3, 5, 10],
            volatility_periods: vec![5, 20],
            volume_sma_period: 20,
            feature_lag: 1,
            target: TargetKind::Return,
            include_price_columns: true,
            drop_warmup_rows: true,
            test_size: 0.2,
            gap_days: 0,
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<(), ProcessorError> {
        if self.feature_lag == 0 {
            return Err(ProcessorError::InvalidConfig(
                "feature_lag must be at least 1 so row t only sees rows before t".to_string(),
            ));
        }
        if let Some(lag) = self.return_lags.iter().find(|&&l| l < self.feature_lag) {
            return Err(ProcessorError::InvalidConfig(format!(
                "return lag {} is shorter than feature_lag {}",
                lag, self.feature_lag
            )));
        }
        let periods = self
            .sma_periods
            .iter()
            .chain(&self.ema_periods)
            .chain(&self.volatility_periods)
            .chain([
                &self.rsi_period,
                &self.macd_fast,
                &self.macd_slow,
                &self.macd_signal,
                &self.bollinger_period,
                &self.volume_sma_period,
            ]);
        for &period in periods {
            if period == 0 {
                return Err(ProcessorError::InvalidConfig(
                    "indicator periods must be positive".to_string(),
                ));
            }
        }
        if self.macd_slow < self.macd_fast {
            return Err(ProcessorError::InvalidConfig(format!(
                "macd_slow ({}) must not be shorter than macd_fast ({})",
                self.macd_slow, self.macd_fast
            )));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ProcessorError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.gap_days < 0 {
            return Err(ProcessorError::InvalidConfig(
                "gap_days must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Index of the first row where every configured column is defined.
    pub fn warmup_rows(&self) -> usize {
        let lagged = self
            .sma_periods
            .iter()
            .chain(&self.ema_periods)
            .map(|p| p.saturating_sub(1))
            .chain(self.volatility_periods.iter().copied())
            .chain([
                self.rsi_period,
                (self.macd_slow + self.macd_signal).saturating_sub(2),
                self.bollinger_period.saturating_sub(1),
                self.volume_sma_period.saturating_sub(1),
            ])
            .max()
            .unwrap_or(0)
            + self.feature_lag;
        let returns = self.return_lags.iter().map(|l| l + 1).max().unwrap_or(0);
        let target = match self.target {
            TargetKind::Return => 1,
            TargetKind::Close => 0,
        };
        lagged.max(returns).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ProcessorConfig::default();
        assert!(config.validate().is_ok());
        // SMA(50) needs 49 prior rows, plus one row of lag
        assert_eq!(config.warmup_rows(), 50);
    }

    #[test]
    fn test_zero_lag_rejected() {
        let config = ProcessorConfig {
            feature_lag: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProcessorError::InvalidConfig(_))));
    }

    #[test]
    fn test_return_lag_shorter_than_feature_lag_rejected() {
        let config = ProcessorConfig {
            feature_lag: 2,
            return_lags: vec![1, 2],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_macd_rejected() {
        let config = ProcessorConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
