use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// Which value the label column carries at row `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Closing price at `t`.
    Close,
    /// Simple return from `t - 1` to `t`.
    #[default]
    Return,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Close => write!(f, "close"),
            TargetKind::Return => write!(f, "return"),
        }
    }
}

impl std::str::FromStr for TargetKind {
    type Err = crate::AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "close" => Ok(TargetKind::Close),
            "return" | "returns" => Ok(TargetKind::Return),
            _ => Err(crate::AnalysisError::InvalidData(format!(
                "Invalid target kind: {}",
                s
            ))),
        }
    }
}
