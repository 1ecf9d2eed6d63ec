//! Domain model for agent coordination.
//!
//! Agents, locks and zones are plain values; persistence and marker files
//! stay outside the domain boundary.

mod agent;
mod error;
mod ids;
mod lock;
mod role;
mod state;
mod zone;

pub use agent::{Agent, AgentMetadata, top_level_directory};
pub use error::{AgentDomainError, ParseAgentRoleError, ParseAgentStatusError};
pub use ids::AgentId;
pub use lock::{DEFAULT_LOCK_TTL, FileLock, LockType, normalize_path};
pub use role::{AgentRole, AgentStatus};
pub use state::CoordinationState;
pub use zone::{FileZone, PathScope};
