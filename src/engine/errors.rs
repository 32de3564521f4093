//! engine::errors
//!
//! Error type for ordering engine operations.

use thiserror::Error;

use super::lock::LockError;
use super::ranking::RankingError;
use crate::core::types::{NodeId, NodeKind, RelationKind};
use crate::core::verify::VerifyError;
use crate::store::StoreError;

/// Errors from ordering engine operations.
///
/// Every error aborts the operation before its write batch is applied, or
/// reports that the applied batch left a group in a bad state. No partial
/// rank state is ever written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("parent node {0} not found")]
    ParentNotFound(NodeId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("{parent_kind} nodes cannot contain {child_kind} nodes")]
    UnsupportedChildKind {
        parent_kind: NodeKind,
        child_kind: NodeKind,
    },

    #[error("rank {rank} is outside 1..={size}")]
    RankOutOfRange { rank: u32, size: usize },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("sibling group ({parent}, {kind}) violates rank invariant: {error}")]
    InvariantViolation {
        parent: NodeId,
        kind: NodeKind,
        error: VerifyError,
    },

    #[error("node {0} has no rank in a sibling group")]
    Unranked(NodeId),

    #[error("{relation} edges cannot link {source_kind} to {target_kind}")]
    UnsupportedRelation {
        relation: RelationKind,
        source_kind: NodeKind,
        target_kind: NodeKind,
    },

    #[error("placing {node} under {parent} would create a cycle")]
    WouldCycle { node: NodeId, parent: NodeId },

    #[error("busy: {0}")]
    Busy(String),
}

impl EngineError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::StoreUnavailable(_)
                | EngineError::InvariantViolation { .. }
                | EngineError::Busy(_)
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => EngineError::StoreUnavailable(msg),
            // The engine validates before writing, so these only surface
            // when something outside the engine changed the graph.
            other => EngineError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<LockError> for EngineError {
    fn from(e: LockError) -> Self {
        EngineError::Busy(e.to_string())
    }
}

impl From<RankingError> for EngineError {
    fn from(e: RankingError) -> Self {
        match e {
            RankingError::NotMember(id) => EngineError::NodeNotFound(id),
            RankingError::Unranked(id) => EngineError::Unranked(id),
            RankingError::OutOfRange { rank, size } => EngineError::RankOutOfRange { rank, size },
        }
    }
}
