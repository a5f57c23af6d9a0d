//! Query log entries.
//!
//! A connection reports each query it issues to a [`Logger`] before calling
//! the bindings. The default [`TracingLogger`] forwards entries to `tracing`.

use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTopic {
    Query,
    PreparedStatement,
    Insert,
}

/// Whether the query runs to completion or streams its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Run,
    Send,
}

/// A single log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub topic: LogTopic,
    pub event: LogEvent,
    /// Query text, or the target table for inserts.
    pub value: String,
}

impl LogEntry {
    /// An entry stamped with the current time.
    pub fn client(topic: LogTopic, event: LogEvent, value: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            topic,
            event,
            value: value.into(),
        }
    }
}

/// Sink for query log entries.
pub trait Logger: Send + Sync {
    fn log(&self, entry: LogEntry);
}

/// Forwards log entries as `info` events on the `zero_engine::query` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, entry: LogEntry) {
        let LogEntry {
            timestamp,
            topic,
            event,
            value,
        } = entry;
        let millis = timestamp
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        tracing::info!(
            target: "zero_engine::query",
            timestamp = millis, ?topic, ?event, "{}", value
        );
    }
}
