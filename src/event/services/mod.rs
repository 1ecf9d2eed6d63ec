//! Application services for the event bus.

mod bus;

pub use bus::{DEFAULT_HISTORY_LIMIT, EventBus, Handler};
