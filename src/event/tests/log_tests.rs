//! Tests for event log adapters.

#![expect(
    clippy::expect_used,
    reason = "Test fixtures use expect for setup failures"
)]

use super::agent;
use crate::event::adapters::{InMemoryEventLog, JsonLinesEventLog};
use crate::event::domain::{Acknowledgement, Event, EventType, LogRecord, PublishRequest};
use crate::event::ports::EventLog;
use crate::store::adapters::StateDir;
use camino::Utf8PathBuf;
use chrono::Utc;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct LogDir {
    _temp: TempDir,
    state: StateDir,
    log: JsonLinesEventLog,
}

#[fixture]
fn log_dir() -> LogDir {
    let temp = TempDir::new().expect("temporary directory");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    let state = StateDir::open(&root, ".agent_coordination").expect("state directory");
    let log = JsonLinesEventLog::new(state.shared_dir(), "events.jsonl");
    LogDir {
        _temp: temp,
        state,
        log,
    }
}

fn event(event_type: EventType) -> Event {
    Event::new(PublishRequest::new(event_type, agent("codex")), Utc::now())
}

#[rstest]
fn missing_log_reads_empty(log_dir: LogDir) -> eyre::Result<()> {
    eyre::ensure!(log_dir.log.read_all()?.is_empty());
    Ok(())
}

#[rstest]
fn appended_events_are_one_per_line(log_dir: LogDir) -> eyre::Result<()> {
    let first = event(EventType::LockAcquired);
    let second = event(EventType::LockReleased);
    log_dir.log.append(&LogRecord::from(first.clone()))?;
    log_dir.log.append(&LogRecord::from(second.clone()))?;

    let raw = log_dir.state.dir().read_to_string("events.jsonl")?;
    eyre::ensure!(raw.lines().count() == 2);
    eyre::ensure!(
        log_dir.log.read_all()? == vec![LogRecord::from(first), LogRecord::from(second)]
    );
    Ok(())
}

#[rstest]
fn acknowledgements_follow_their_event(log_dir: LogDir) -> eyre::Result<()> {
    let published = event(EventType::TaskAssigned);
    let ack = Acknowledgement::new(published.event_id(), agent("claude"), Utc::now());
    log_dir.log.append(&LogRecord::from(published.clone()))?;
    log_dir.log.append(&LogRecord::from(ack.clone()))?;

    let raw = log_dir.state.dir().read_to_string("events.jsonl")?;
    let second_line = raw.lines().nth(1).unwrap_or_default();
    eyre::ensure!(second_line.contains("\"ack\""));
    eyre::ensure!(
        log_dir.log.read_all()? == vec![LogRecord::from(published), LogRecord::from(ack)]
    );
    Ok(())
}

#[rstest]
fn bare_event_lines_read_as_published(log_dir: LogDir) -> eyre::Result<()> {
    let published = event(EventType::FileModified);
    let line = serde_json::to_string(&published)?;
    log_dir.state.dir().write("events.jsonl", format!("{line}\n"))?;

    eyre::ensure!(log_dir.log.read_all()? == vec![LogRecord::Published(published)]);
    Ok(())
}

#[rstest]
fn malformed_lines_are_skipped(log_dir: LogDir) -> eyre::Result<()> {
    let kept = event(EventType::TaskCreated);
    log_dir.log.append(&LogRecord::from(kept.clone()))?;
    let mut raw = log_dir.state.dir().read_to_string("events.jsonl")?;
    raw.push_str("{truncated\n\n");
    log_dir.state.dir().write("events.jsonl", raw)?;

    eyre::ensure!(log_dir.log.read_all()? == vec![LogRecord::from(kept)]);
    Ok(())
}

#[rstest]
fn in_memory_log_shares_records_between_clones() -> eyre::Result<()> {
    let log = InMemoryEventLog::new();
    let shared = log.clone();
    log.append(&LogRecord::from(event(EventType::SystemStartup)))?;

    eyre::ensure!(shared.len() == 1);
    eyre::ensure!(!shared.is_empty());
    Ok(())
}
