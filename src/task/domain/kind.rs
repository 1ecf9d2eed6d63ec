//! Task type catalogue grouped by pipeline stage.

use super::ParseTaskTypeError;
use crate::agent::domain::AgentRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the feature pipeline a task type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Architecture and interface work.
    Design,
    /// Implementation.
    Code,
    /// Alternatives, optimization and load testing.
    Research,
    /// Review.
    Review,
    /// Merge, deploy and documentation.
    Integrate,
}

impl PipelineStage {
    /// Returns the role that handles this stage.
    #[must_use]
    pub const fn role(self) -> AgentRole {
        match self {
            Self::Design => AgentRole::Architect,
            Self::Code => AgentRole::Coder,
            Self::Research => AgentRole::Researcher,
            Self::Review => AgentRole::Reviewer,
            Self::Integrate => AgentRole::Coordinator,
        }
    }

    /// Returns the stage tag used on pipeline tasks.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Code => "code",
            Self::Research => "research",
            Self::Review => "review",
            Self::Integrate => "integrate",
        }
    }
}

/// Kind of work a task describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Architecture design.
    #[serde(rename = "design.architecture")]
    DesignArchitecture,
    /// Interface design.
    #[serde(rename = "design.interface")]
    DesignInterface,
    /// Work breakdown.
    #[serde(rename = "design.decomposition")]
    DesignDecomposition,
    /// Feature implementation.
    #[serde(rename = "code.implement")]
    CodeImplement,
    /// Test writing.
    #[serde(rename = "code.test")]
    CodeTest,
    /// Schema or data migration.
    #[serde(rename = "code.migration")]
    CodeMigration,
    /// Code review.
    #[serde(rename = "review.code")]
    ReviewCode,
    /// Security review.
    #[serde(rename = "review.security")]
    ReviewSecurity,
    /// Refactoring review.
    #[serde(rename = "review.refactor")]
    ReviewRefactor,
    /// Alternatives and edge cases.
    #[serde(rename = "research.alternatives")]
    ResearchAlternatives,
    /// Performance work.
    #[serde(rename = "research.optimization")]
    ResearchOptimization,
    /// Load testing.
    #[serde(rename = "research.load_test")]
    ResearchLoadTest,
    /// Merge.
    #[serde(rename = "integrate.merge")]
    IntegrateMerge,
    /// Deployment.
    #[serde(rename = "integrate.deploy")]
    IntegrateDeploy,
    /// Documentation.
    #[serde(rename = "integrate.document")]
    IntegrateDocument,
}

impl TaskType {
    /// Every task type, in pipeline order.
    pub const ALL: [Self; 15] = [
        Self::DesignArchitecture,
        Self::DesignInterface,
        Self::DesignDecomposition,
        Self::CodeImplement,
        Self::CodeTest,
        Self::CodeMigration,
        Self::ResearchAlternatives,
        Self::ResearchOptimization,
        Self::ResearchLoadTest,
        Self::ReviewCode,
        Self::ReviewSecurity,
        Self::ReviewRefactor,
        Self::IntegrateMerge,
        Self::IntegrateDeploy,
        Self::IntegrateDocument,
    ];

    /// Returns the dotted wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DesignArchitecture => "design.architecture",
            Self::DesignInterface => "design.interface",
            Self::DesignDecomposition => "design.decomposition",
            Self::CodeImplement => "code.implement",
            Self::CodeTest => "code.test",
            Self::CodeMigration => "code.migration",
            Self::ReviewCode => "review.code",
            Self::ReviewSecurity => "review.security",
            Self::ReviewRefactor => "review.refactor",
            Self::ResearchAlternatives => "research.alternatives",
            Self::ResearchOptimization => "research.optimization",
            Self::ResearchLoadTest => "research.load_test",
            Self::IntegrateMerge => "integrate.merge",
            Self::IntegrateDeploy => "integrate.deploy",
            Self::IntegrateDocument => "integrate.document",
        }
    }

    /// Returns the pipeline stage this type belongs to.
    #[must_use]
    pub const fn stage(self) -> PipelineStage {
        match self {
            Self::DesignArchitecture | Self::DesignInterface | Self::DesignDecomposition => {
                PipelineStage::Design
            }
            Self::CodeImplement | Self::CodeTest | Self::CodeMigration => PipelineStage::Code,
            Self::ReviewCode | Self::ReviewSecurity | Self::ReviewRefactor => PipelineStage::Review,
            Self::ResearchAlternatives | Self::ResearchOptimization | Self::ResearchLoadTest => {
                PipelineStage::Research
            }
            Self::IntegrateMerge | Self::IntegrateDeploy | Self::IntegrateDocument => {
                PipelineStage::Integrate
            }
        }
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == normalized)
            .ok_or_else(|| ParseTaskTypeError(value.to_owned()))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
