//! Port contracts for the event bus.

pub mod handler;
pub mod log;

pub use handler::{AsyncEventHandler, EventHandler, HandlerError};
pub use log::{EventLog, EventLogError, EventLogResult};
