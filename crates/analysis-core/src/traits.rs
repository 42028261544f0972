use crate::{AnalysisError, Bar, TimeSeriesFrame};

/// Turns raw bars into a feature/label frame.
///
/// Implementations must only use rows `<= t - 1` for every feature at row `t`.
pub trait FeatureBuilder: Send + Sync {
    fn build_features(&self, bars: &[Bar]) -> Result<TimeSeriesFrame, AnalysisError>;
}
