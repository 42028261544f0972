use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}
