//! engine::ordering
//!
//! The ordering engine: structural mutations that keep sibling ranks
//! contiguous.
//!
//! # Lifecycle
//!
//! Every mutating operation follows the same steps:
//!
//! ```text
//! Validate -> Lock group(s) -> Read group -> Plan ranks -> Apply batch -> Verify
//! ```
//!
//! - **Validate**: read the nodes involved, check kinds and relations
//! - **Lock**: take the [`SiblingLocks`] guard for every group the write
//!   touches, in `GroupKey` order
//! - **Read**: re-read the sibling group under the lock; the engine keeps
//!   no rank state between calls
//! - **Plan**: compute rank writes with the pure functions in
//!   [`super::ranking`]
//! - **Apply**: submit one [`WriteBatch`]; the store applies it atomically
//! - **Verify**: optionally re-read the touched groups and report
//!   [`EngineError::InvariantViolation`] if they are not `1..=n`
//!
//! # Invariants
//!
//! - One operation produces at most one write batch
//! - A failed operation leaves the store exactly as it was
//! - Verification never rewrites state; it only reports

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::command::{Command, CommandOutput};
use super::errors::EngineError;
use super::lock::{GroupGuard, GroupKey, SiblingLocks};
use super::ranking::{next_rank, plan_move, plan_removal};
use crate::core::config::{Config, EngineSettings};
use crate::core::forest::{Edge, ForestSnapshot, Node};
use crate::core::types::{NodeId, NodeKind, NodeRef, Rank, RelationKind};
use crate::core::verify::{verify_group, RankedEntry};
use crate::store::{ChildEntry, GraphStore, StoreError, WriteBatch, WriteOp, WriteReceipt};

/// A node together with its locked sibling group.
struct Membership {
    node: Node,
    parent: Option<NodeId>,
    _guard: Option<GroupGuard>,
}

/// Ordering engine over a [`GraphStore`].
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use outliner::core::types::NodeKind;
/// use outliner::engine::OrderingEngine;
/// use outliner::store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let engine = OrderingEngine::new(Arc::new(MemoryStore::new()));
/// let root = engine.create_node(NodeKind::Root, "Thesis").await.unwrap();
/// let intro = engine.insert_child(&root, NodeKind::Branch, "Intro").await.unwrap();
/// let methods = engine.insert_child(&root, NodeKind::Branch, "Methods").await.unwrap();
///
/// engine.reorder(&methods, 1).await.unwrap();
///
/// let snapshot = engine.snapshot(&root).await.unwrap();
/// let order: Vec<_> = snapshot.ordered_children(&root).iter().map(|n| n.id).collect();
/// assert_eq!(order, vec![methods, intro]);
/// # });
/// ```
pub struct OrderingEngine {
    store: Arc<dyn GraphStore>,
    locks: SiblingLocks,
    settings: EngineSettings,
}

impl OrderingEngine {
    /// Create an engine with default settings.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_settings(store, EngineSettings::default())
    }

    /// Create an engine with explicit settings.
    pub fn with_settings(store: Arc<dyn GraphStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            locks: SiblingLocks::new(),
            settings,
        }
    }

    /// Create an engine with the `[engine]` settings of a loaded config.
    pub fn from_config(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self::with_settings(store, config.engine_settings())
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// The active settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Read a consistent snapshot of the outline under `root`.
    pub async fn snapshot(&self, root: &NodeId) -> Result<ForestSnapshot, EngineError> {
        match self.store.read_snapshot(root).await {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::NotFound(_)) => Err(EngineError::NodeNotFound(*root)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve an id to its kind-tagged reference.
    pub async fn resolve(&self, id: &NodeId) -> Result<NodeRef, EngineError> {
        self.store
            .read_node(id)
            .await?
            .map(|n| n.node_ref())
            .ok_or(EngineError::NodeNotFound(*id))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a parentless, unranked node.
    #[tracing::instrument(skip(self))]
    pub async fn create_node(&self, kind: NodeKind, title: &str) -> Result<NodeId, EngineError> {
        let node = Node::new(kind, title);
        let id = node.id;
        self.submit(WriteBatch::new("create_node").with_op(WriteOp::CreateNode { node }))
            .await?;
        info!(node = %id, "created node");
        Ok(id)
    }

    /// Create a node as the last member of `parent`'s sibling group for `kind`.
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` if `parent` does not exist
    /// - `UnsupportedChildKind` if `parent` cannot contain `kind`
    #[tracing::instrument(skip(self))]
    pub async fn insert_child(
        &self,
        parent: &NodeId,
        kind: NodeKind,
        title: &str,
    ) -> Result<NodeId, EngineError> {
        let parent_node = self
            .store
            .read_node(parent)
            .await?
            .ok_or(EngineError::ParentNotFound(*parent))?;
        if !parent_node.kind.accepts_child(kind) {
            return Err(EngineError::UnsupportedChildKind {
                parent_kind: parent_node.kind,
                child_kind: kind,
            });
        }

        let key = GroupKey::new(*parent, kind);
        let _guard = self.locks.acquire(key, self.settings.lock_timeout).await?;
        let siblings = self.read_group_of(key, EngineError::ParentNotFound(*parent)).await?;

        let rank = next_rank(&siblings);
        let node = Node::new(kind, title).with_rank(rank);
        let id = node.id;
        let batch = WriteBatch::new("insert_child")
            .with_op(WriteOp::CreateNode { node })
            .with_op(WriteOp::CreateEdge {
                edge: Edge::contains(*parent, id),
            });
        match self.submit(batch).await {
            Ok(_) => {}
            Err(e @ StoreError::NotFound(_)) => {
                if self.is_absent(parent).await? {
                    return Err(EngineError::ParentNotFound(*parent));
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }
        self.verify_after_write(key).await?;

        info!(node = %id, %rank, "inserted child");
        Ok(id)
    }

    /// Move a node to `new_rank` inside its sibling group.
    ///
    /// Siblings between the old and new position shift by one; everything
    /// else is untouched. Moving to the current rank is a no-op.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `Unranked` if the node has no parent or no rank
    /// - `RankOutOfRange` unless `1 <= new_rank <= n`
    #[tracing::instrument(skip(self))]
    pub async fn reorder(&self, id: &NodeId, new_rank: u32) -> Result<(), EngineError> {
        let membership = self
            .lock_membership(id)
            .await?
            .ok_or(EngineError::NodeNotFound(*id))?;
        let parent = membership.parent.ok_or(EngineError::Unranked(*id))?;
        if membership.node.rank.is_none() {
            return Err(EngineError::Unranked(*id));
        }

        let key = GroupKey::new(parent, membership.node.kind);
        let group = self.read_group_of(key, EngineError::NodeNotFound(*id)).await?;
        check_group(key, &group)?;

        let rank = Rank::new(new_rank).map_err(|_| EngineError::RankOutOfRange {
            rank: new_rank,
            size: group.len(),
        })?;
        let updates = plan_move(&group, *id, rank)?;
        if updates.is_empty() {
            debug!("rank unchanged, nothing to write");
            return Ok(());
        }

        let shifted = updates.len() - 1;
        let batch = WriteBatch::new("reorder").with_op(WriteOp::WriteRanks {
            parent,
            kind: key.kind,
            entries: updates,
        });
        self.submit(batch).await?;
        self.verify_after_write(key).await?;

        info!(%rank, shifted, "reordered node");
        Ok(())
    }

    /// Delete a node, its `Contains` subtree, and every edge touching them.
    ///
    /// Former siblings ranked above the node move up by one. Citations and
    /// external documents reached only through other relations are
    /// detached, not deleted.
    ///
    /// Returns `false` if the node did not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_node(&self, id: &NodeId) -> Result<bool, EngineError> {
        let Some(membership) = self.lock_membership(id).await? else {
            debug!("node already absent, nothing to delete");
            return Ok(false);
        };

        let mut batch =
            WriteBatch::new("delete_node").with_op(WriteOp::DeleteSubtree { root: *id });
        let key = membership
            .parent
            .map(|parent| GroupKey::new(parent, membership.node.kind));
        if let Some(key) = key {
            let group = match self.read_group_of(key, EngineError::NodeNotFound(*id)).await {
                Ok(group) => group,
                Err(e @ EngineError::NodeNotFound(_)) => {
                    // An ancestor's delete took the parent, and the node with it.
                    if self.is_absent(id).await? {
                        debug!("node removed with its ancestor");
                        return Ok(false);
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            let updates = plan_removal(&group, *id);
            if !updates.is_empty() {
                batch.push(WriteOp::WriteRanks {
                    parent: key.parent,
                    kind: key.kind,
                    entries: updates,
                });
            }
        }

        let receipt = match self.submit(batch).await {
            Ok(receipt) => receipt,
            Err(e @ StoreError::NotFound(_)) => {
                // A concurrent delete of the node or one of its ancestors won.
                if self.is_absent(id).await? {
                    debug!("node removed concurrently");
                    return Ok(false);
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(key) = key {
            self.verify_after_write(key).await?;
        }

        info!(
            nodes = receipt.nodes_deleted,
            edges = receipt.edges_removed,
            "deleted subtree"
        );
        Ok(true)
    }

    /// Create an edge from `source` to `target`.
    ///
    /// For `Contains`, `target` becomes the last child of `source` in its
    /// sibling group; if it already had a parent it is moved and the old
    /// group is compacted in the same batch. Returns the assigned rank.
    /// Other relations create a plain edge and return `None`.
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` / `NodeNotFound` for missing endpoints
    /// - `UnsupportedChildKind` / `UnsupportedRelation` for disallowed kinds
    /// - `WouldCycle` if `target` is `source` or one of its ancestors
    #[tracing::instrument(skip(self))]
    pub async fn attach(
        &self,
        source: &NodeId,
        target: &NodeId,
        relation: RelationKind,
    ) -> Result<Option<Rank>, EngineError> {
        let source_node = self.store.read_node(source).await?.ok_or({
            if relation.is_hierarchical() {
                EngineError::ParentNotFound(*source)
            } else {
                EngineError::NodeNotFound(*source)
            }
        })?;
        let target_node = self
            .store
            .read_node(target)
            .await?
            .ok_or(EngineError::NodeNotFound(*target))?;

        if !relation.permits(source_node.kind, target_node.kind) {
            return Err(if relation.is_hierarchical() {
                EngineError::UnsupportedChildKind {
                    parent_kind: source_node.kind,
                    child_kind: target_node.kind,
                }
            } else {
                EngineError::UnsupportedRelation {
                    relation,
                    source_kind: source_node.kind,
                    target_kind: target_node.kind,
                }
            });
        }

        if relation.is_hierarchical() {
            return self.contain(*source, target_node).await.map(Some);
        }

        let edge = Edge::new(*source, *target, relation);
        self.submit(WriteBatch::new("attach").with_op(WriteOp::CreateEdge { edge }))
            .await?;
        info!("linked nodes");
        Ok(None)
    }

    /// Remove an edge.
    ///
    /// Detaching a `Contains` edge orphans the child: its rank is cleared
    /// and its former siblings are compacted. Returns `false` if there was
    /// no such edge.
    #[tracing::instrument(skip(self))]
    pub async fn detach(
        &self,
        source: &NodeId,
        target: &NodeId,
        relation: RelationKind,
    ) -> Result<bool, EngineError> {
        let edge = Edge::new(*source, *target, relation);

        if !relation.is_hierarchical() {
            return match self
                .submit(WriteBatch::new("detach").with_op(WriteOp::RemoveEdge { edge }))
                .await
            {
                Ok(_) => Ok(true),
                Err(StoreError::NotFound(_)) => Ok(false),
                Err(e) => Err(e.into()),
            };
        }

        let Some(membership) = self.lock_membership(target).await? else {
            return Ok(false);
        };
        if membership.parent != Some(*source) {
            debug!("node is not contained by source, nothing to detach");
            return Ok(false);
        }

        let key = GroupKey::new(*source, membership.node.kind);
        let group = self.read_group_of(key, EngineError::NodeNotFound(*source)).await?;
        let mut batch = WriteBatch::new("detach")
            .with_op(WriteOp::RemoveEdge { edge })
            .with_op(WriteOp::SetRank {
                id: *target,
                rank: None,
            });
        let updates = plan_removal(&group, *target);
        if !updates.is_empty() {
            batch.push(WriteOp::WriteRanks {
                parent: *source,
                kind: key.kind,
                entries: updates,
            });
        }
        self.submit(batch).await?;
        self.verify_after_write(key).await?;

        info!("orphaned node");
        Ok(true)
    }

    /// Change a node's title.
    #[tracing::instrument(skip(self))]
    pub async fn rename(&self, id: &NodeId, title: &str) -> Result<(), EngineError> {
        if self.store.read_node(id).await?.is_none() {
            return Err(EngineError::NodeNotFound(*id));
        }
        let op = WriteOp::SetTitle {
            id: *id,
            title: title.to_string(),
        };
        match self.submit(WriteBatch::new("rename").with_op(op)).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(EngineError::NodeNotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Run a command through the matching operation.
    pub async fn execute(&self, command: &Command) -> Result<CommandOutput, EngineError> {
        debug!(command = command.name(), "executing command");
        match command {
            Command::CreateNode { kind, title } => {
                let id = self.create_node(*kind, title).await?;
                Ok(CommandOutput::Created { id })
            }
            Command::InsertChild {
                parent,
                kind,
                title,
            } => {
                let id = self.insert_child(parent, *kind, title).await?;
                Ok(CommandOutput::Created { id })
            }
            Command::Reorder { node, rank } => {
                self.reorder(node, *rank).await?;
                Ok(CommandOutput::Reordered)
            }
            Command::Delete { node } => {
                let existed = self.delete_node(node).await?;
                Ok(CommandOutput::Deleted { existed })
            }
            Command::Attach {
                source,
                target,
                relation,
            } => match self.attach(source, target, *relation).await? {
                Some(rank) => Ok(CommandOutput::Contained { rank }),
                None => Ok(CommandOutput::Linked),
            },
            Command::Detach {
                source,
                target,
                relation,
            } => {
                let existed = self.detach(source, target, *relation).await?;
                Ok(CommandOutput::Detached { existed })
            }
            Command::Rename { node, title } => {
                self.rename(node, title).await?;
                Ok(CommandOutput::Renamed)
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Place `node` under `parent`, moving it out of its old group if needed.
    async fn contain(&self, parent: NodeId, node: Node) -> Result<Rank, EngineError> {
        let id = node.id;
        let kind = node.kind;
        if self.is_ancestor_or_self(&id, &parent).await? {
            return Err(EngineError::WouldCycle { node: id, parent });
        }

        let new_key = GroupKey::new(parent, kind);
        for attempt in 0..self.settings.lock_retries {
            let Some((current, old_parent)) = self.read_membership(&id).await? else {
                return Err(EngineError::NodeNotFound(id));
            };
            if old_parent == Some(parent) {
                debug!("already contained by parent");
                return current.rank.ok_or(EngineError::Unranked(id));
            }

            let old_key = old_parent.map(|p| GroupKey::new(p, kind));
            let _guards = self
                .locks
                .acquire_all(std::iter::once(new_key).chain(old_key), self.settings.lock_timeout)
                .await?;
            match self.read_membership(&id).await? {
                None => return Err(EngineError::NodeNotFound(id)),
                Some((_, now)) if now == old_parent => {}
                Some(_) => {
                    debug!(attempt, "node moved while locking, retrying");
                    continue;
                }
            }

            let siblings = self
                .read_group_of(new_key, EngineError::ParentNotFound(parent))
                .await?;
            let rank = next_rank(&siblings);

            let mut batch = WriteBatch::new("attach");
            if let Some(old) = old_key {
                let old_group = self.read_group_of(old, EngineError::NodeNotFound(id)).await?;
                batch.push(WriteOp::RemoveEdge {
                    edge: Edge::contains(old.parent, id),
                });
                let updates = plan_removal(&old_group, id);
                if !updates.is_empty() {
                    batch.push(WriteOp::WriteRanks {
                        parent: old.parent,
                        kind,
                        entries: updates,
                    });
                }
            }
            batch.push(WriteOp::CreateEdge {
                edge: Edge::contains(parent, id),
            });
            batch.push(WriteOp::SetRank {
                id,
                rank: Some(rank),
            });

            self.submit(batch).await?;
            self.verify_after_write(new_key).await?;
            if let Some(old) = old_key {
                self.verify_after_write(old).await?;
            }

            info!(node = %id, %rank, moved = old_key.is_some(), "contained node");
            return Ok(rank);
        }

        Err(EngineError::Busy(format!(
            "node {id} kept moving between sibling groups"
        )))
    }

    /// Read a node and its parent; `None` if the node does not exist.
    async fn read_membership(
        &self,
        id: &NodeId,
    ) -> Result<Option<(Node, Option<NodeId>)>, EngineError> {
        let Some(node) = self.store.read_node(id).await? else {
            return Ok(None);
        };
        match self.store.read_parent(id).await {
            Ok(parent) => Ok(Some((node, parent))),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Lock the sibling group `id` belongs to.
    ///
    /// The parent is re-read under the lock; if the node moved meanwhile
    /// the lock is released and the lookup retried. Parentless nodes are
    /// returned without a lock.
    async fn lock_membership(&self, id: &NodeId) -> Result<Option<Membership>, EngineError> {
        for attempt in 0..self.settings.lock_retries {
            let Some((node, parent)) = self.read_membership(id).await? else {
                return Ok(None);
            };
            let Some(parent) = parent else {
                return Ok(Some(Membership {
                    node,
                    parent: None,
                    _guard: None,
                }));
            };

            let key = GroupKey::new(parent, node.kind);
            let guard = self.locks.acquire(key, self.settings.lock_timeout).await?;
            match self.read_membership(id).await? {
                None => return Ok(None),
                Some((node, Some(current))) if current == parent => {
                    return Ok(Some(Membership {
                        node,
                        parent: Some(parent),
                        _guard: Some(guard),
                    }));
                }
                Some(_) => debug!(attempt, "node moved while locking, retrying"),
            }
        }

        Err(EngineError::Busy(format!(
            "node {id} kept moving between sibling groups"
        )))
    }

    /// Read a sibling group, reporting `missing` if its parent is gone.
    async fn read_group_of(
        &self,
        key: GroupKey,
        missing: EngineError,
    ) -> Result<Vec<ChildEntry>, EngineError> {
        match self.store.read_children(&key.parent, key.kind).await {
            Ok(children) => Ok(children),
            Err(StoreError::NotFound(_)) => Err(missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `id` is gone from the store.
    async fn is_absent(&self, id: &NodeId) -> Result<bool, EngineError> {
        Ok(self.store.read_node(id).await?.is_none())
    }

    /// Whether `candidate` is `start` or one of its ancestors.
    async fn is_ancestor_or_self(
        &self,
        candidate: &NodeId,
        start: &NodeId,
    ) -> Result<bool, EngineError> {
        let mut seen = HashSet::new();
        let mut current = Some(*start);
        while let Some(id) = current {
            if &id == candidate {
                return Ok(true);
            }
            if !seen.insert(id) {
                return Ok(false);
            }
            current = match self.store.read_parent(&id).await {
                Ok(parent) => parent,
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
        }
        Ok(false)
    }

    async fn submit(&self, batch: WriteBatch) -> Result<WriteReceipt, StoreError> {
        let label = batch.label.clone();
        let ops = batch.len();
        match self.store.apply(batch).await {
            Ok(receipt) => {
                debug!(
                    store = self.store.name(),
                    batch = %label,
                    ops,
                    ranks = receipt.ranks_written,
                    "applied write batch"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(store = self.store.name(), batch = %label, error = %e, "write batch failed");
                Err(e)
            }
        }
    }

    /// Re-read a group after a write and check it is ranked `1..=n`.
    async fn verify_after_write(&self, key: GroupKey) -> Result<(), EngineError> {
        if !self.settings.verify_writes {
            return Ok(());
        }
        match self.store.read_children(&key.parent, key.kind).await {
            Ok(children) => check_group(key, &children),
            // The parent itself was deleted by someone else; no group left.
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_group(key: GroupKey, children: &[ChildEntry]) -> Result<(), EngineError> {
    let entries: Vec<RankedEntry> = children.iter().map(|c| (c.id, c.rank)).collect();
    verify_group(&entries).map_err(|error| {
        warn!(group = %key, %error, "sibling group failed rank verification");
        EngineError::InvariantViolation {
            parent: key.parent,
            kind: key.kind,
            error,
        }
    })
}
