//! In-memory event log.

use crate::event::domain::LogRecord;
use crate::event::ports::{EventLog, EventLogResult};
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe in-memory event log; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of appended records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, record: &LogRecord) -> EventLogResult<()> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn read_all(&self) -> EventLogResult<Vec<LogRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
