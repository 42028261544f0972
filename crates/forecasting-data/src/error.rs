use analysis_core::AnalysisError;
use temporal_validation::TemporalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),

    #[error("Invalid processor config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
