//! Where validator findings go.
//!
//! Components take an `Arc<dyn DiagnosticSink>` instead of writing to a
//! process-wide logger, so tests can capture output per instance.

use std::sync::Mutex;

use tracing::Level;

pub trait DiagnosticSink: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

/// Forwards findings to `tracing` under the `temporal_validation` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "temporal_validation", "{}", message),
            Level::WARN => tracing::warn!(target: "temporal_validation", "{}", message),
            Level::INFO => tracing::info!(target: "temporal_validation", "{}", message),
            Level::DEBUG => tracing::debug!(target: "temporal_validation", "{}", message),
            _ => tracing::trace!(target: "temporal_validation", "{}", message),
        }
    }
}

/// Keeps every finding in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_filters_by_level() {
        let sink = MemorySink::new();
        sink.record(Level::WARN, "gap");
        sink.record(Level::ERROR, "future rows");
        sink.record(Level::WARN, "weekend");

        assert_eq!(sink.entries().len(), 3);
        assert_eq!(sink.messages_at(Level::WARN), vec!["gap", "weekend"]);

        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
