//! Subscriber contracts.

use crate::event::domain::Event;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a subscriber. The bus logs it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Subscriber invoked inline during `publish`.
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the subscriber fails; the bus logs it.
    fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self(event)
    }
}

/// Subscriber spawned on the current tokio runtime; `publish` never waits
/// for it.
#[async_trait]
pub trait AsyncEventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the subscriber fails; the bus logs it.
    async fn handle(&self, event: Event) -> Result<(), HandlerError>;
}
