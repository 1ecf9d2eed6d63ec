//! Coordination settings.
//!
//! Everything except the project root has a default; the root is the only
//! value read from the environment.

use crate::agent::domain::DEFAULT_LOCK_TTL;
use crate::event::services::DEFAULT_HISTORY_LIMIT;
use camino::Utf8PathBuf;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the project root.
pub const PROJECT_ROOT_ENV: &str = "ATELIER_PROJECT_ROOT";

/// Directory created under the project root for coordination state.
pub const DEFAULT_STATE_DIR: &str = ".agent_coordination";

/// Agents silent for longer than this are no longer active.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The project root from the environment is not valid UTF-8.
    #[error("ATELIER_PROJECT_ROOT is not valid UTF-8: {}", .0.display())]
    NonUtf8ProjectRoot(PathBuf),
}

/// Where coordination state lives and how long things last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationConfig {
    project_root: Utf8PathBuf,
    state_dir: String,
    history_limit: usize,
    heartbeat_timeout: Duration,
    lock_ttl: Duration,
}

impl CoordinationConfig {
    /// Creates a configuration rooted at `project_root` with default limits.
    #[must_use]
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            state_dir: DEFAULT_STATE_DIR.to_owned(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    /// Reads the project root from [`PROJECT_ROOT_ENV`], falling back to the
    /// working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonUtf8ProjectRoot`] when the variable holds a
    /// path that is not UTF-8.
    pub fn from_env() -> Result<Self, ConfigError> {
        let Some(raw) = env::var_os(PROJECT_ROOT_ENV) else {
            return Ok(Self::default());
        };
        let root = Utf8PathBuf::from_path_buf(PathBuf::from(raw))
            .map_err(ConfigError::NonUtf8ProjectRoot)?;
        Ok(Self::new(root))
    }

    /// Sets the state directory name.
    #[must_use]
    pub fn with_state_dir(mut self, state_dir: impl Into<String>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// Sets how many events the bus keeps in memory.
    #[must_use]
    pub const fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Sets the heartbeat activity window.
    #[must_use]
    pub const fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Sets the lifetime given to new locks.
    #[must_use]
    pub const fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Returns the project root.
    #[must_use]
    pub const fn project_root(&self) -> &Utf8PathBuf {
        &self.project_root
    }

    /// Returns the state directory name.
    #[must_use]
    pub fn state_dir(&self) -> &str {
        &self.state_dir
    }

    /// Returns the event history limit.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Returns the heartbeat activity window.
    #[must_use]
    pub const fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    /// Returns the default lock lifetime.
    #[must_use]
    pub const fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinationConfig, DEFAULT_STATE_DIR};
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn defaults_match_shipped_limits() {
        let config = CoordinationConfig::new("/srv/project");

        assert_eq!(config.project_root().as_str(), "/srv/project");
        assert_eq!(config.state_dir(), DEFAULT_STATE_DIR);
        assert_eq!(config.history_limit(), 1000);
        assert_eq!(config.heartbeat_timeout(), Duration::from_secs(300));
        assert_eq!(config.lock_ttl(), Duration::from_secs(3600));
    }

    #[rstest]
    fn builders_override_defaults() {
        let config = CoordinationConfig::default()
            .with_state_dir("state")
            .with_history_limit(10)
            .with_heartbeat_timeout(Duration::from_secs(5))
            .with_lock_ttl(Duration::from_secs(60));

        assert_eq!(config.project_root().as_str(), ".");
        assert_eq!(config.state_dir(), "state");
        assert_eq!(config.history_limit(), 10);
        assert_eq!(config.heartbeat_timeout(), Duration::from_secs(5));
        assert_eq!(config.lock_ttl(), Duration::from_secs(60));
    }
}
