//! store::traits
//!
//! Graph store trait definition.
//!
//! # Design
//!
//! The `GraphStore` trait is async because a real store sits behind a
//! network connection. Reads return canonical field values; every write
//! goes through [`GraphStore::apply`], which applies a [`WriteBatch`]
//! all-or-nothing.
//!
//! The store does not know about rank contiguity. It checks referential
//! integrity (endpoints exist, a node has at most one `Contains` parent,
//! `WriteRanks` only touches members of the named group) and leaves the
//! ordering rules to the engine.
//!
//! # Example
//!
//! ```
//! use outliner::core::forest::Node;
//! use outliner::core::types::NodeKind;
//! use outliner::store::{GraphStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let id = store.create_node(Node::new(NodeKind::Root, "Thesis")).await.unwrap();
//! let node = store.read_node(&id).await.unwrap().unwrap();
//! assert_eq!(node.title, "Thesis");
//! # });
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::forest::{Edge, ForestSnapshot, Node};
use crate::core::types::{NodeId, NodeKind, Rank};

/// Errors from store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A referenced node or edge does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write collides with existing state (duplicate id, second parent).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write is malformed for the current state.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transport or transaction failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A direct child as returned by [`GraphStore::read_children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub id: NodeId,
    pub rank: Option<Rank>,
}

/// A rank to write for one member of a sibling group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub id: NodeId,
    pub rank: Rank,
}

impl RankUpdate {
    pub fn new(id: NodeId, rank: Rank) -> Self {
        Self { id, rank }
    }
}

/// A typed write operation.
///
/// Each op is applied in order inside one batch; a failing op aborts the
/// whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WriteOp {
    /// Create a node. The id must be fresh.
    CreateNode { node: Node },

    /// Create an edge between two existing nodes.
    ///
    /// Creating an edge that already exists is a no-op.
    CreateEdge { edge: Edge },

    /// Remove an existing edge.
    RemoveEdge { edge: Edge },

    /// Replace a node's title.
    SetTitle { id: NodeId, title: String },

    /// Set or clear a single node's rank.
    SetRank { id: NodeId, rank: Option<Rank> },

    /// Rewrite ranks inside one sibling group.
    ///
    /// Every entry must currently be a `Contains` child of `parent` with
    /// kind `kind`.
    WriteRanks {
        parent: NodeId,
        kind: NodeKind,
        entries: Vec<RankUpdate>,
    },

    /// Delete `root` and every node below it via `Contains`, plus every
    /// edge touching a deleted node.
    DeleteSubtree { root: NodeId },
}

impl WriteOp {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            WriteOp::CreateNode { .. } => "create_node",
            WriteOp::CreateEdge { .. } => "create_edge",
            WriteOp::RemoveEdge { .. } => "remove_edge",
            WriteOp::SetTitle { .. } => "set_title",
            WriteOp::SetRank { .. } => "set_rank",
            WriteOp::WriteRanks { .. } => "write_ranks",
            WriteOp::DeleteSubtree { .. } => "delete_subtree",
        }
    }
}

/// An ordered list of writes applied all-or-nothing.
///
/// # Example
///
/// ```
/// use outliner::core::forest::{Edge, Node};
/// use outliner::core::types::{NodeKind, Rank};
/// use outliner::store::{WriteBatch, WriteOp};
///
/// let root = Node::new(NodeKind::Root, "Thesis");
/// let intro = Node::new(NodeKind::Branch, "Intro").with_rank(Rank::FIRST);
/// let batch = WriteBatch::new("insert_child")
///     .with_op(WriteOp::CreateNode { node: intro.clone() })
///     .with_op(WriteOp::CreateEdge { edge: Edge::contains(root.id, intro.id) });
///
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WriteBatch {
    /// Operation that produced the batch, for logs.
    pub label: String,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ops: Vec::new(),
        }
    }

    /// Builder-style append.
    pub fn with_op(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Counts of what a successful batch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub ops_applied: usize,
    pub nodes_created: usize,
    pub nodes_deleted: usize,
    pub edges_created: usize,
    pub edges_removed: usize,
    pub ranks_written: usize,
}

/// The backing graph store.
///
/// Implementations must make [`GraphStore::apply`] atomic: either every op
/// in the batch takes effect or none does.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Get the store name (for logs).
    fn name(&self) -> &'static str;

    /// Read one node. Unknown ids yield `Ok(None)`.
    async fn read_node(&self, id: &NodeId) -> Result<Option<Node>, StoreError>;

    /// Read the `Contains` parent of an existing node.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node does not exist.
    async fn read_parent(&self, id: &NodeId) -> Result<Option<NodeId>, StoreError>;

    /// Read one sibling group, sorted by rank (unranked last), then id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist.
    async fn read_children(
        &self,
        parent: &NodeId,
        kind: NodeKind,
    ) -> Result<Vec<ChildEntry>, StoreError>;

    /// Read the outline under `root` as one consistent snapshot.
    ///
    /// Includes everything reachable via `Contains` and `Cites`, the
    /// external documents linked to reached citations, and every edge among
    /// those nodes.
    async fn read_snapshot(&self, root: &NodeId) -> Result<ForestSnapshot, StoreError>;

    /// Apply a batch atomically.
    async fn apply(&self, batch: WriteBatch) -> Result<WriteReceipt, StoreError>;

    /// Create a single node.
    async fn create_node(&self, node: Node) -> Result<NodeId, StoreError> {
        let id = node.id;
        self.apply(WriteBatch::new("create_node").with_op(WriteOp::CreateNode { node }))
            .await?;
        Ok(id)
    }

    /// Create a single edge.
    async fn create_edge(&self, edge: Edge) -> Result<(), StoreError> {
        self.apply(WriteBatch::new("create_edge").with_op(WriteOp::CreateEdge { edge }))
            .await?;
        Ok(())
    }

    /// Delete a subtree.
    async fn delete_subtree(&self, root: &NodeId) -> Result<(), StoreError> {
        self.apply(WriteBatch::new("delete_subtree").with_op(WriteOp::DeleteSubtree { root: *root }))
            .await?;
        Ok(())
    }

    /// Rewrite ranks in one sibling group as a single atomic call.
    async fn write_ranks(
        &self,
        parent: &NodeId,
        kind: NodeKind,
        entries: Vec<RankUpdate>,
    ) -> Result<(), StoreError> {
        let op = WriteOp::WriteRanks {
            parent: *parent,
            kind,
            entries,
        };
        self.apply(WriteBatch::new("write_ranks").with_op(op)).await?;
        Ok(())
    }
}
