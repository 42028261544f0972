//! Lagged feature construction.
//!
//! Indicators are computed on data up to and including row `t` and then
//! shifted forward by `feature_lag` rows, so the value stored at row `t`
//! only depends on rows `<= t - feature_lag`. The target is the only column
//! that reflects row `t` itself (the raw OHLCV columns aside, which the
//! validator treats as price columns).

use analysis_core::series::{pct_change, rolling_std, shift};
use analysis_core::{AnalysisError, Bar, FeatureBuilder, TargetKind, TimeSeriesFrame};
use chrono::{DateTime, Utc};
use technical_analysis::{bollinger_bands, ema, macd, rsi, sma};
use temporal_validation::{
    PointInTimeDataset, SplitResult, TemporalDataSplitter, TemporalValidator, ValidationReport,
};
use tracing::Level;

use crate::{ProcessorConfig, ProcessorError};

pub const TARGET_COLUMN: &str = "target";

/// A validated, split feature frame for one symbol.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub symbol: String,
    pub frame: TimeSeriesFrame,
    pub report: ValidationReport,
    pub split: SplitResult,
}

pub struct ForecastingDataProcessor {
    config: ProcessorConfig,
    splitter: TemporalDataSplitter,
}

impl ForecastingDataProcessor {
    pub fn new(config: ProcessorConfig, validator: TemporalValidator) -> Result<Self, ProcessorError> {
        config.validate()?;
        Ok(Self {
            config,
            splitter: TemporalDataSplitter::new(validator),
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn validator(&self) -> &TemporalValidator {
        self.splitter.validator()
    }

    /// Build features, validate them as of `analysis_date` and split.
    pub fn prepare(
        &self,
        symbol: &str,
        bars: &[Bar],
        analysis_date: Option<DateTime<Utc>>,
    ) -> Result<PreparedDataset, ProcessorError> {
        let frame = self.feature_frame(bars)?;
        if frame.is_empty() {
            return Err(ProcessorError::InsufficientData(format!(
                "{}: {} bars do not cover the {}-row warm-up",
                symbol,
                bars.len(),
                self.config.warmup_rows()
            )));
        }

        let report = self
            .validator()
            .validate_temporal_integrity(&frame, analysis_date)?;
        if !report.is_valid {
            self.log(
                Level::WARN,
                format!("{}: feature frame failed validation: {}", symbol, report.summary()),
            );
        }

        let split = self.splitter.temporal_train_test_split(
            &frame,
            self.config.test_size,
            self.config.gap_days,
        )?;

        self.log(
            Level::INFO,
            format!(
                "{}: prepared {} rows x {} columns ({} train / {} test)",
                symbol,
                frame.len(),
                frame.columns().len(),
                split.train.len(),
                split.test.len()
            ),
        );

        Ok(PreparedDataset {
            symbol: symbol.to_string(),
            frame,
            report,
            split,
        })
    }

    /// Features built only from bars observable at `as_of`, trimmed to the lookback window.
    pub fn point_in_time(
        &self,
        bars: &[Bar],
        as_of: DateTime<Utc>,
        lookback_days: Option<i64>,
    ) -> Result<PointInTimeDataset, ProcessorError> {
        let visible: Vec<Bar> = bars
            .iter()
            .filter(|b| b.timestamp <= as_of)
            .cloned()
            .collect();
        let frame = self.feature_frame(&visible)?;
        Ok(self
            .validator()
            .create_point_in_time_dataset(&frame, as_of, lookback_days)?)
    }

    fn feature_frame(&self, bars: &[Bar]) -> Result<TimeSeriesFrame, ProcessorError> {
        let frame = self.build_features(bars)?;
        Ok(if self.config.drop_warmup_rows {
            frame.drop_incomplete_rows()
        } else {
            frame
        })
    }

    fn log(&self, level: Level, message: String) {
        self.validator().sink().record(level, &message);
    }

    fn lagged(&self, values: &[f64]) -> Vec<f64> {
        shift(values, self.config.feature_lag as isize)
    }
}

impl FeatureBuilder for ForecastingDataProcessor {
    fn build_features(&self, bars: &[Bar]) -> Result<TimeSeriesFrame, AnalysisError> {
        let mut bars = bars.to_vec();
        bars.sort_by_key(|b| b.timestamp);

        let cfg = &self.config;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let returns = pct_change(&closes, 1);

        let mut frame = TimeSeriesFrame::new(bars.iter().map(|b| b.timestamp).collect());

        if cfg.include_price_columns {
            frame.insert_column("open", bars.iter().map(|b| b.open).collect())?;
            frame.insert_column("high", bars.iter().map(|b| b.high).collect())?;
            frame.insert_column("low", bars.iter().map(|b| b.low).collect())?;
            frame.insert_column("close", closes.clone())?;
            frame.insert_column("volume", volumes.clone())?;
        }

        for &period in &cfg.sma_periods {
            let avg = sma(&closes, period);
            let distance: Vec<f64> = closes
                .iter()
                .zip(avg.iter())
                .map(|(c, m)| if *m != 0.0 { c / m - 1.0 } else { f64::NAN })
                .collect();
            frame.insert_column(format!("sma_{}", period), self.lagged(&avg))?;
            frame.insert_column(format!("close_to_sma_{}", period), self.lagged(&distance))?;
        }

        for &period in &cfg.ema_periods {
            frame.insert_column(format!("ema_{}", period), self.lagged(&ema(&closes, period)))?;
        }

        frame.insert_column(
            format!("rsi_{}", cfg.rsi_period),
            self.lagged(&rsi(&closes, cfg.rsi_period)),
        )?;

        let macd_result = macd(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        frame.insert_column("macd", self.lagged(&macd_result.macd_line))?;
        frame.insert_column("macd_signal", self.lagged(&macd_result.signal_line))?;
        frame.insert_column("macd_hist", self.lagged(&macd_result.histogram))?;

        let bands = bollinger_bands(&closes, cfg.bollinger_period, cfg.bollinger_std);
        frame.insert_column("bb_upper", self.lagged(&bands.upper))?;
        frame.insert_column("bb_lower", self.lagged(&bands.lower))?;
        frame.insert_column("bb_width", self.lagged(&bands.width()))?;
        frame.insert_column("bb_position", self.lagged(&bands.position(&closes)))?;

        // Return lags are absolute; validation guarantees each is >= feature_lag.
        for &lag in &cfg.return_lags {
            frame.insert_column(format!("return_lag_{}", lag), shift(&returns, lag as isize))?;
        }

        for &period in &cfg.volatility_periods {
            frame.insert_column(
                format!("volatility_{}", period),
                self.lagged(&rolling_std(&returns, period)),
            )?;
        }

        let volume_avg = sma(&volumes, cfg.volume_sma_period);
        let volume_ratio: Vec<f64> = volumes
            .iter()
            .zip(volume_avg.iter())
            .map(|(v, avg)| if *avg > 0.0 { v / avg } else { f64::NAN })
            .collect();
        frame.insert_column("volume_ratio", self.lagged(&volume_ratio))?;

        let target = match cfg.target {
            TargetKind::Close => closes,
            TargetKind::Return => returns,
        };
        frame.insert_column(TARGET_COLUMN, target)?;
        frame.with_target(TARGET_COLUMN)
    }
}
