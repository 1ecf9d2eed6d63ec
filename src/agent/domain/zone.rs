//! Per-role file access zones.

use super::AgentRole;

/// Paths a zone grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScope {
    /// Every path.
    Everything,
    /// Paths starting with one of the listed prefixes.
    Prefixes(&'static [&'static str]),
}

/// Immutable path-prefix access policy for one role.
///
/// Forbidden prefixes are checked before allowed ones, so a forbidden match
/// always denies access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileZone {
    role: AgentRole,
    allowed: PathScope,
    forbidden: &'static [&'static str],
    priority: u8,
    human: bool,
}

static ARCHITECT_ZONE: FileZone = FileZone {
    role: AgentRole::Architect,
    allowed: PathScope::Prefixes(&["plans/", "docs/adr/"]),
    forbidden: &["src/", "tests/", ".gitlab-ci.yml", "deploy/"],
    priority: 1,
    human: false,
};

static CODER_ZONE: FileZone = FileZone {
    role: AgentRole::Coder,
    allowed: PathScope::Prefixes(&["src/", "tests/", "alembic/"]),
    forbidden: &["plans/", "ROADMAP.md", "STATUS.md"],
    priority: 2,
    human: false,
};

static REVIEWER_ZONE: FileZone = FileZone {
    role: AgentRole::Reviewer,
    allowed: PathScope::Prefixes(&["src/", "tests/", "docs/"]),
    forbidden: &[],
    priority: 3,
    human: false,
};

static RESEARCHER_ZONE: FileZone = FileZone {
    role: AgentRole::Researcher,
    allowed: PathScope::Prefixes(&["experiments/", "tests/load/", "benchmarks/", "docs/perf/"]),
    forbidden: &["src/"],
    priority: 1,
    human: false,
};

static COORDINATOR_ZONE: FileZone = FileZone {
    role: AgentRole::Coordinator,
    allowed: PathScope::Everything,
    forbidden: &[],
    priority: FileZone::MAX_PRIORITY,
    human: true,
};

impl FileZone {
    /// Highest priority any zone can carry.
    pub const MAX_PRIORITY: u8 = 10;

    /// Returns the default zone shipped for `role`.
    #[must_use]
    pub fn for_role(role: AgentRole) -> &'static Self {
        match role {
            AgentRole::Architect => &ARCHITECT_ZONE,
            AgentRole::Coder => &CODER_ZONE,
            AgentRole::Reviewer => &REVIEWER_ZONE,
            AgentRole::Researcher => &RESEARCHER_ZONE,
            AgentRole::Coordinator => &COORDINATOR_ZONE,
        }
    }

    /// Returns the role this zone applies to.
    #[must_use]
    pub const fn role(&self) -> AgentRole {
        self.role
    }

    /// Returns the paths this zone grants.
    #[must_use]
    pub const fn allowed(&self) -> PathScope {
        self.allowed
    }

    /// Returns the forbidden prefixes.
    #[must_use]
    pub const fn forbidden(&self) -> &'static [&'static str] {
        self.forbidden
    }

    /// Returns the tie-break priority; higher wins.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// Returns whether the role is played by a human.
    ///
    /// Human agents are never reported in same-priority collisions.
    #[must_use]
    pub const fn is_human(&self) -> bool {
        self.human
    }

    /// Returns whether `path` may be edited under this zone.
    #[must_use]
    pub fn can_access(&self, path: &str) -> bool {
        if self.forbidden.iter().any(|prefix| path.starts_with(prefix)) {
            return false;
        }
        match self.allowed {
            PathScope::Everything => true,
            PathScope::Prefixes(prefixes) => prefixes.iter().any(|prefix| path.starts_with(prefix)),
        }
    }
}
