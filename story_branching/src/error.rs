//! Error types for branch exploration.

use thiserror::Error;

use crate::branch::BranchId;

/// Errors surfaced by the branch tree and its collaborators.
///
/// Per-candidate failures (`GenerationFailure`, `ViabilityExhaustion`) are recovered
/// locally and only reported; tree-level precondition violations are returned to the
/// caller and never retried.
#[derive(Debug, Error)]
pub enum BranchError {
    /// A generator or the synthesis collaborator failed for one candidate.
    #[error("generation failed for candidate '{cause}': {reason}")]
    GenerationFailure { cause: String, reason: String },

    /// Every candidate of a step was filtered out.
    #[error("no viable candidates from branch {parent}")]
    ViabilityExhaustion { parent: BranchId },

    /// Collapse was requested with no active branches.
    #[error("cannot collapse: no active branches")]
    CollapseOnEmptyTree,

    /// Constraint parameters were malformed; the tree was left unchanged.
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("unknown branch: {0}")]
    UnknownBranch(BranchId),

    /// The parent already sits at the configured depth below the committed tip.
    #[error("branch {parent} is at depth {depth}, budget is {max_depth}")]
    DepthBudgetExhausted {
        parent: BranchId,
        depth: u32,
        max_depth: u32,
    },

    /// The parent was discarded while candidates were being synthesized.
    #[error("branch {0} was discarded before its children could be admitted")]
    StaleParent(BranchId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BranchError {
    /// Whether the error only affected a single candidate.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            BranchError::GenerationFailure { .. } | BranchError::ViabilityExhaustion { .. }
        )
    }
}

pub type BranchResult<T> = Result<T, BranchError>;
