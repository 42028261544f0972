use analysis_core::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemporalError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Temporal integrity violated: {}", .errors.join("; "))]
    IntegrityViolation { errors: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),
}
