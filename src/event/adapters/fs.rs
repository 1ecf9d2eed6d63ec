//! JSON Lines event log.
//!
//! One serialized record per line: a published event or an
//! acknowledgement of one. Appends hold an exclusive advisory lock
//! on the log file so lines from concurrent processes never interleave.

use crate::event::domain::LogRecord;
use crate::event::ports::{EventLog, EventLogError, EventLogResult};
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use fs2::FileExt;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::sync::Arc;
use tracing::warn;

/// Append-only event log file inside a directory.
#[derive(Debug, Clone)]
pub struct JsonLinesEventLog {
    dir: Arc<Dir>,
    file: String,
}

impl JsonLinesEventLog {
    /// Creates a log writing to `file` inside `dir`.
    #[must_use]
    pub fn new(dir: Arc<Dir>, file: impl Into<String>) -> Self {
        Self {
            dir,
            file: file.into(),
        }
    }

    /// Returns the log file name.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    fn io_error(&self, source: std::io::Error) -> EventLogError {
        EventLogError::io(self.file.as_str(), source)
    }
}

impl EventLog for JsonLinesEventLog {
    fn append(&self, record: &LogRecord) -> EventLogResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        let mut file = self
            .dir
            .open_with(&self.file, &options)
            .map_err(|err| self.io_error(err))?
            .into_std();
        FileExt::lock_exclusive(&file).map_err(|err| self.io_error(err))?;
        let written = file.write_all(line.as_bytes()).and_then(|()| file.flush());
        if let Err(err) = FileExt::unlock(&file) {
            warn!(file = %self.file, error = %err, "failed to release event log lock");
        }
        written.map_err(|err| self.io_error(err))
    }

    fn read_all(&self) -> EventLogResult<Vec<LogRecord>> {
        let file = match self.dir.open(&self.file) {
            Ok(file) => file.into_std(),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        FileExt::lock_shared(&file).map_err(|err| self.io_error(err))?;

        let mut records = Vec::new();
        for (index, read) in BufReader::new(&file).lines().enumerate() {
            let line = read.map_err(|err| self.io_error(err))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(file = %self.file, line = index + 1, error = %err, "skipping malformed log record");
                }
            }
        }

        if let Err(err) = FileExt::unlock(&file) {
            warn!(file = %self.file, error = %err, "failed to release event log lock");
        }
        Ok(records)
    }
}
