//! Domain model for coordination events.

mod event;
mod event_type;
mod filter;
mod ids;
mod record;

pub use event::{Event, PublishRequest};
pub use event_type::{EventType, ParseEventTypeError};
pub use filter::EventFilter;
pub use ids::{EventId, SubscriptionId};
pub use record::{Acknowledgement, LogRecord};
