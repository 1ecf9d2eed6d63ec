//! Domain model for conflicts and their resolution.

mod conflict;
mod error;
mod ids;
mod kind;
mod ledger;
mod resolution;

pub use conflict::{Conflict, ConflictMetadata, NewConflict};
pub use error::{ParseConflictTypeError, ParseResolutionStrategyError};
pub use ids::ConflictId;
pub use kind::{ConflictSeverity, ConflictType};
pub use ledger::ConflictLedger;
pub use resolution::{ConflictResolution, ResolutionAction, ResolutionStrategy};
