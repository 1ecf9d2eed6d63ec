//! Exclusive file locks with time-to-live expiry.

use super::AgentId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lock lifetime.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(3600);

/// Kind of lock requested. Both kinds occupy the path exclusively; the
/// kind is recorded for external tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// Writer lock.
    #[default]
    Exclusive,
    /// Reader lock.
    Shared,
}

/// A lock held by one agent on one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLock {
    path: String,
    agent_id: AgentId,
    acquired_at: DateTime<Utc>,
    #[serde(default)]
    lock_type: LockType,
    #[serde(default = "default_ttl_seconds")]
    ttl_seconds: u64,
}

const fn default_ttl_seconds() -> u64 {
    DEFAULT_LOCK_TTL.as_secs()
}

impl FileLock {
    /// Creates a lock acquired at `acquired_at`.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        agent_id: AgentId,
        lock_type: LockType,
        ttl: Duration,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            path: path.into(),
            agent_id,
            acquired_at,
            lock_type,
            ttl_seconds: whole_seconds(ttl),
        }
    }

    /// Returns the locked path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the holder.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns when the lock was first acquired.
    #[must_use]
    pub const fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Returns the lock kind.
    #[must_use]
    pub const fn lock_type(&self) -> LockType {
        self.lock_type
    }

    /// Returns the lifetime in whole seconds, rounded up.
    #[must_use]
    pub const fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Returns the instant after which the lock is expired.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        self.acquired_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns whether the lock has outlived its TTL at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}

/// Rounds a TTL up to whole seconds.
fn whole_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0))
}

/// Normalizes a repository-relative path: trims whitespace and strips any
/// leading `./`. Returns `None` for an empty path.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    let mut normalized = path.trim();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_owned())
    }
}
