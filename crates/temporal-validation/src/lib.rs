//! Temporal Validation
//!
//! Leakage linting and chronological splitting for time-indexed datasets.
//! The checks are heuristics: a clean report means none of the implemented
//! checks fired, not that the data is proven leak-free.

pub mod config;
pub mod error;
pub mod report;
pub mod sink;
pub mod splitter;
pub mod validator;

mod checks;

#[cfg(test)]
mod tests;

pub use config::{CheckKind, ValidationMode, ValidatorConfig};
pub use error::TemporalError;
pub use report::{LeakFinding, PointInTimeDataset, SnoopingReport, ValidationReport};
pub use sink::{DiagnosticSink, MemorySink, TracingSink};
pub use splitter::{SplitResult, TemporalDataSplitter, WalkForwardSplit, WalkForwardSplits};
pub use validator::TemporalValidator;
