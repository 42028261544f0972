//! Forecasting Data
//!
//! Builds lagged feature/label frames from OHLCV bars and hands them to the
//! temporal validator and splitter.

pub mod config;
pub mod error;
pub mod processor;

pub use config::ProcessorConfig;
pub use error::ProcessorError;
pub use processor::{ForecastingDataProcessor, PreparedDataset, TARGET_COLUMN};
