//! Append-only event log port.

use crate::event::domain::LogRecord;
use thiserror::Error;

/// Result type for event log operations.
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Durable, append-only record of published events and their
/// acknowledgements, shared by every process using the same state
/// directory.
#[cfg_attr(test, mockall::automock)]
pub trait EventLog: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError`] when the record cannot be encoded or
    /// written.
    fn append(&self, record: &LogRecord) -> EventLogResult<()>;

    /// Returns every readable record in append order. Unreadable records
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError`] when the log cannot be opened or read.
    fn read_all(&self) -> EventLogResult<Vec<LogRecord>>;
}

/// Errors returned by event log implementations.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// Log file access failed.
    #[error("event log {file}: {source}")]
    Io {
        /// Log file name.
        file: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded.
    #[error("failed to encode event log record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl EventLogError {
    /// Wraps an I/O failure on the named log file.
    #[must_use]
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            file: file.into(),
            source,
        }
    }
}
