//! engine::command
//!
//! Command objects for outline mutations.
//!
//! # Architecture
//!
//! Callers never mutate outline state directly. Every change is described
//! as a [`Command`] and run through
//! [`OrderingEngine::execute`](super::OrderingEngine::execute), which
//! dispatches to exactly one engine operation. Commands are plain,
//! serializable data so they can be queued, logged, or sent over the wire.
//!
//! # Example
//!
//! ```
//! use outliner::core::types::{NodeId, NodeKind};
//! use outliner::engine::Command;
//!
//! let cmd = Command::InsertChild {
//!     parent: NodeId::generate(),
//!     kind: NodeKind::Branch,
//!     title: "Methods".to_string(),
//! };
//! assert_eq!(cmd.name(), "insert_child");
//! assert!(cmd.is_structural());
//!
//! let json = serde_json::to_string(&cmd).unwrap();
//! let back: Command = serde_json::from_str(&json).unwrap();
//! assert_eq!(back, cmd);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::{NodeId, NodeKind, Rank, RelationKind};

/// A requested outline mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Create a parentless, unranked node.
    CreateNode { kind: NodeKind, title: String },

    /// Create a node at the end of `parent`'s sibling group for `kind`.
    InsertChild {
        parent: NodeId,
        kind: NodeKind,
        title: String,
    },

    /// Move a node to `rank` inside its current sibling group.
    Reorder { node: NodeId, rank: u32 },

    /// Delete a node and its `Contains` subtree.
    Delete { node: NodeId },

    /// Create an edge, re-parenting the target for `Contains`.
    Attach {
        source: NodeId,
        target: NodeId,
        relation: RelationKind,
    },

    /// Remove an edge.
    Detach {
        source: NodeId,
        target: NodeId,
        relation: RelationKind,
    },

    /// Change a node's title.
    Rename { node: NodeId, title: String },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode { .. } => "create_node",
            Command::InsertChild { .. } => "insert_child",
            Command::Reorder { .. } => "reorder",
            Command::Delete { .. } => "delete",
            Command::Attach { .. } => "attach",
            Command::Detach { .. } => "detach",
            Command::Rename { .. } => "rename",
        }
    }

    /// Whether the command can change hierarchy or ranks, and therefore
    /// display numbers.
    pub fn is_structural(&self) -> bool {
        match self {
            Command::InsertChild { .. } | Command::Reorder { .. } | Command::Delete { .. } => true,
            Command::Attach { relation, .. } | Command::Detach { relation, .. } => {
                relation.is_hierarchical()
            }
            Command::CreateNode { .. } | Command::Rename { .. } => false,
        }
    }
}

/// What a successfully executed command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutput {
    /// A node was created.
    Created { id: NodeId },
    /// A node now sits at `rank` under a new parent (or already did).
    Contained { rank: Rank },
    /// A non-hierarchical edge exists.
    Linked,
    /// The node was moved (or already sat at the requested rank).
    Reordered,
    /// A delete ran; `existed` is false for unknown ids.
    Deleted { existed: bool },
    /// A detach ran; `existed` is false if there was no such edge.
    Detached { existed: bool },
    /// The title changed.
    Renamed,
}
