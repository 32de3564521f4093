//! store::memory
//!
//! In-memory graph store.
//!
//! # Design
//!
//! `MemoryStore` is the reference implementation of [`GraphStore`]. It is
//! used by the test suite and by embedders that do not need durability.
//!
//! - Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state
//! - `apply` stages the whole batch on a copy of the graph and swaps it in
//!   only if every op succeeds
//! - Failures can be injected with [`FailOn`]
//! - A store built with [`MemoryStore::recording`] logs every call as a
//!   [`StoreOperation`]; the default store keeps no log
//! - An optional artificial latency widens race windows in concurrency tests
//!
//! # Example
//!
//! ```
//! use outliner::store::memory::{FailOn, MemoryStore};
//! use outliner::store::StoreError;
//!
//! let store = MemoryStore::new()
//!     .fail_on(FailOn::Apply(StoreError::Unavailable("down".into())));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{
    ChildEntry, GraphStore, StoreError, WriteBatch, WriteOp, WriteReceipt,
};
use crate::core::forest::{Edge, ForestSnapshot, Node};
use crate::core::types::{NodeId, NodeKind, RelationKind};

/// Which calls should fail, and with what.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Every read (`read_node`, `read_parent`, `read_children`, `read_snapshot`).
    Reads(StoreError),
    /// Every `apply`, before any op is staged.
    Apply(StoreError),
    /// `apply` fails on reaching the op at `index`, after earlier ops were staged.
    ApplyAtOp { index: usize, error: StoreError },
    /// Only `read_snapshot`.
    Snapshot(StoreError),
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    ReadNode { id: NodeId },
    ReadParent { id: NodeId },
    ReadChildren { parent: NodeId, kind: NodeKind },
    ReadSnapshot { root: NodeId },
    Apply { batch: WriteBatch },
}

/// In-memory [`GraphStore`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    latency: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    graph: Graph,
    fail_on: Option<FailOn>,
    recording: bool,
    operations: Vec<StoreOperation>,
}

impl Inner {
    fn record(&mut self, op: StoreOperation) {
        if self.recording {
            self.operations.push(op);
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeSet<Edge>,
}

impl Graph {
    fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        self.edges
            .iter()
            .find(|e| e.relation.is_hierarchical() && &e.target == id)
            .map(|e| e.source)
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(*node);
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.parent_of(&id);
        }
        false
    }

    fn children_of(&self, parent: &NodeId, kind: NodeKind) -> Vec<ChildEntry> {
        let mut children: Vec<ChildEntry> = self
            .edges
            .iter()
            .filter(|e| e.relation.is_hierarchical() && &e.source == parent)
            .filter_map(|e| self.nodes.get(&e.target))
            .filter(|n| n.kind == kind)
            .map(|n| ChildEntry {
                id: n.id,
                rank: n.rank,
            })
            .collect();
        children.sort_by(|a, b| (a.rank.is_none(), a.rank, a.id).cmp(&(b.rank.is_none(), b.rank, b.id)));
        children
    }

    /// `root` plus everything below it via `Contains`.
    fn subtree(&self, root: &NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::from([*root]);
        let mut queue = VecDeque::from([*root]);
        while let Some(current) = queue.pop_front() {
            for edge in self
                .edges
                .iter()
                .filter(|e| e.relation.is_hierarchical() && e.source == current)
            {
                if seen.insert(edge.target) {
                    queue.push_back(edge.target);
                }
            }
        }
        seen
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, StoreError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("node {id}")))
    }

    fn apply_op(&mut self, op: &WriteOp, receipt: &mut WriteReceipt) -> Result<(), StoreError> {
        match op {
            WriteOp::CreateNode { node } => {
                if self.nodes.contains_key(&node.id) {
                    return Err(StoreError::Conflict(format!(
                        "node {} already exists",
                        node.id
                    )));
                }
                self.nodes.insert(node.id, node.clone());
                receipt.nodes_created += 1;
            }
            WriteOp::CreateEdge { edge } => {
                for end in [edge.source, edge.target] {
                    if !self.nodes.contains_key(&end) {
                        return Err(StoreError::NotFound(format!("node {end}")));
                    }
                }
                if self.edges.contains(edge) {
                    return Ok(());
                }
                if edge.relation.is_hierarchical() {
                    if let Some(parent) = self.parent_of(&edge.target) {
                        return Err(StoreError::Conflict(format!(
                            "node {} is already contained by {parent}",
                            edge.target
                        )));
                    }
                    if self.is_ancestor_or_self(&edge.target, &edge.source) {
                        return Err(StoreError::Rejected(format!(
                            "containing {} under {} would create a cycle",
                            edge.target, edge.source
                        )));
                    }
                }
                self.edges.insert(*edge);
                receipt.edges_created += 1;
            }
            WriteOp::RemoveEdge { edge } => {
                if !self.edges.remove(edge) {
                    return Err(StoreError::NotFound(format!(
                        "{} edge {} -> {}",
                        edge.relation, edge.source, edge.target
                    )));
                }
                receipt.edges_removed += 1;
            }
            WriteOp::SetTitle { id, title } => {
                self.node_mut(id)?.title = title.clone();
            }
            WriteOp::SetRank { id, rank } => {
                self.node_mut(id)?.rank = *rank;
                receipt.ranks_written += 1;
            }
            WriteOp::WriteRanks {
                parent,
                kind,
                entries,
            } => {
                for entry in entries {
                    let is_member = self.edges.contains(&Edge::contains(*parent, entry.id));
                    let node = self.node_mut(&entry.id)?;
                    if !is_member || node.kind != *kind {
                        return Err(StoreError::Rejected(format!(
                            "node {} is not a {kind} child of {parent}",
                            entry.id
                        )));
                    }
                    node.rank = Some(entry.rank);
                    receipt.ranks_written += 1;
                }
            }
            WriteOp::DeleteSubtree { root } => {
                if !self.nodes.contains_key(root) {
                    return Err(StoreError::NotFound(format!("node {root}")));
                }
                let doomed = self.subtree(root);
                for id in &doomed {
                    self.nodes.remove(id);
                }
                let before = self.edges.len();
                self.edges
                    .retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target));
                receipt.nodes_deleted += doomed.len();
                receipt.edges_removed += before - self.edges.len();
            }
        }
        Ok(())
    }

    fn snapshot(&self, root: &NodeId) -> ForestSnapshot {
        let mut reached = BTreeSet::from([*root]);
        let mut queue = VecDeque::from([*root]);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| {
                e.source == current
                    && matches!(e.relation, RelationKind::Contains | RelationKind::Cites)
            }) {
                if reached.insert(edge.target) {
                    queue.push_back(edge.target);
                }
            }
        }

        let citations: HashSet<NodeId> = reached
            .iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.kind == NodeKind::Citation)
            })
            .copied()
            .collect();
        let linked_docs: Vec<NodeId> = self
            .edges
            .iter()
            .filter_map(|e| match e.relation {
                RelationKind::References if citations.contains(&e.target) => Some(e.source),
                RelationKind::LinkedFrom if citations.contains(&e.source) => Some(e.target),
                _ => None,
            })
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.kind == NodeKind::ExternalDoc)
            })
            .collect();
        reached.extend(linked_docs);

        let nodes = reached.iter().filter_map(|id| self.nodes.get(id)).cloned();
        let edges = self
            .edges
            .iter()
            .filter(|e| reached.contains(&e.source) && reached.contains(&e.target))
            .copied();
        ForestSnapshot::new(nodes, edges).with_root(*root)
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            latency: None,
        }
    }

    /// Create a store holding the given nodes and edges as-is.
    ///
    /// No validation is done, so tests can seed malformed graphs.
    pub fn with_graph(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        let graph = Graph {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            edges: edges.into_iter().collect(),
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                graph,
                ..Inner::default()
            })),
            latency: None,
        }
    }

    /// Delay every call by `latency` before it touches state.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Log every call for later inspection with [`operations`](Self::operations).
    pub fn recording(self) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.recording = true;
        }
        self
    }

    /// Configure the store to fail.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure the store to fail, on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_on = Some(fail_on);
        }
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_on = None;
        }
    }

    /// Get all recorded operations; empty unless the store is recording.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.inner
            .lock()
            .map(|inner| inner.operations.clone())
            .unwrap_or_default()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.operations.clear();
        }
    }

    /// The batches applied so far (including failed ones).
    pub fn batches(&self) -> Vec<WriteBatch> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOperation::Apply { batch } => Some(batch),
                _ => None,
            })
            .collect()
    }

    /// Snapshot of the entire store, orphans included (for test verification).
    pub fn full_snapshot(&self) -> ForestSnapshot {
        self.inner
            .lock()
            .map(|inner| {
                ForestSnapshot::new(
                    inner.graph.nodes.values().cloned(),
                    inner.graph.edges.iter().copied(),
                )
            })
            .unwrap_or_default()
    }

    /// Number of stored nodes.
    pub fn node_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.graph.nodes.len())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Record a read and check for an injected read failure.
    fn begin_read(&self, op: StoreOperation) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock()?;
        let is_snapshot = matches!(op, StoreOperation::ReadSnapshot { .. });
        inner.record(op);
        let failure = match &inner.fail_on {
            Some(FailOn::Reads(e)) => Some(e.clone()),
            Some(FailOn::Snapshot(e)) if is_snapshot => Some(e.clone()),
            _ => None,
        };
        match failure {
            Some(e) => Err(e),
            None => Ok(inner),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_node(&self, id: &NodeId) -> Result<Option<Node>, StoreError> {
        self.pause().await;
        let inner = self.begin_read(StoreOperation::ReadNode { id: *id })?;
        Ok(inner.graph.nodes.get(id).cloned())
    }

    async fn read_parent(&self, id: &NodeId) -> Result<Option<NodeId>, StoreError> {
        self.pause().await;
        let inner = self.begin_read(StoreOperation::ReadParent { id: *id })?;
        if !inner.graph.nodes.contains_key(id) {
            return Err(StoreError::NotFound(format!("node {id}")));
        }
        Ok(inner.graph.parent_of(id))
    }

    async fn read_children(
        &self,
        parent: &NodeId,
        kind: NodeKind,
    ) -> Result<Vec<ChildEntry>, StoreError> {
        self.pause().await;
        let inner = self.begin_read(StoreOperation::ReadChildren {
            parent: *parent,
            kind,
        })?;
        if !inner.graph.nodes.contains_key(parent) {
            return Err(StoreError::NotFound(format!("node {parent}")));
        }
        Ok(inner.graph.children_of(parent, kind))
    }

    async fn read_snapshot(&self, root: &NodeId) -> Result<ForestSnapshot, StoreError> {
        self.pause().await;
        let inner = self.begin_read(StoreOperation::ReadSnapshot { root: *root })?;
        if !inner.graph.nodes.contains_key(root) {
            return Err(StoreError::NotFound(format!("node {root}")));
        }
        Ok(inner.graph.snapshot(root))
    }

    async fn apply(&self, batch: WriteBatch) -> Result<WriteReceipt, StoreError> {
        self.pause().await;
        let mut inner = self.lock()?;
        if inner.recording {
            inner.operations.push(StoreOperation::Apply {
                batch: batch.clone(),
            });
        }

        let fail_at = match &inner.fail_on {
            Some(FailOn::Apply(e)) => return Err(e.clone()),
            Some(FailOn::ApplyAtOp { index, error }) => Some((*index, error.clone())),
            _ => None,
        };

        let mut staged = inner.graph.clone();
        let mut receipt = WriteReceipt::default();
        for (index, op) in batch.ops.iter().enumerate() {
            if let Some((fail_index, error)) = &fail_at {
                if *fail_index == index {
                    return Err(error.clone());
                }
            }
            staged.apply_op(op, &mut receipt)?;
            receipt.ops_applied += 1;
        }

        inner.graph = staged;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rank;
    use crate::store::traits::RankUpdate;

    fn rank(n: u32) -> Rank {
        Rank::new(n).unwrap()
    }

    /// Root with two ranked branches; the first branch holds one leaf.
    fn seeded() -> (MemoryStore, Node, Node, Node, Node) {
        let root = Node::new(NodeKind::Root, "root");
        let a = Node::new(NodeKind::Branch, "a").with_rank(rank(1));
        let b = Node::new(NodeKind::Branch, "b").with_rank(rank(2));
        let leaf = Node::new(NodeKind::Leaf, "leaf").with_rank(rank(1));
        let store = MemoryStore::with_graph(
            vec![root.clone(), a.clone(), b.clone(), leaf.clone()],
            vec![
                Edge::contains(root.id, a.id),
                Edge::contains(root.id, b.id),
                Edge::contains(a.id, leaf.id),
            ],
        )
        .recording();
        (store, root, a, b, leaf)
    }

    #[tokio::test]
    async fn create_and_read_node() {
        let store = MemoryStore::new();
        let node = Node::new(NodeKind::Root, "Thesis");
        let id = store.create_node(node.clone()).await.unwrap();
        assert_eq!(store.read_node(&id).await.unwrap(), Some(node));
        assert_eq!(store.read_parent(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_unknown_node_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read_node(&NodeId::generate()).await.unwrap(), None);
        assert!(matches!(
            store.read_parent(&NodeId::generate()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn read_children_sorted_and_filtered_by_kind() {
        let (store, root, a, b, leaf) = seeded();
        let branches = store.read_children(&root.id, NodeKind::Branch).await.unwrap();
        assert_eq!(
            branches.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
        assert!(store
            .read_children(&root.id, NodeKind::Leaf)
            .await
            .unwrap()
            .is_empty());
        let leaves = store.read_children(&a.id, NodeKind::Leaf).await.unwrap();
        assert_eq!(leaves, vec![ChildEntry { id: leaf.id, rank: Some(rank(1)) }]);
    }

    #[tokio::test]
    async fn second_parent_conflicts() {
        let (store, _root, _a, b, leaf) = seeded();
        let result = store.create_edge(Edge::contains(b.id, leaf.id)).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn containment_cycle_rejected() {
        let (store, root, a, _b, _leaf) = seeded();
        let inner = Node::new(NodeKind::Branch, "inner");
        store.create_node(inner.clone()).await.unwrap();
        store.create_edge(Edge::contains(a.id, inner.id)).await.unwrap();

        // `a` already has a parent, so detach it first inside the same batch.
        let batch = WriteBatch::new("cycle")
            .with_op(WriteOp::RemoveEdge {
                edge: Edge::contains(root.id, a.id),
            })
            .with_op(WriteOp::CreateEdge {
                edge: Edge::contains(inner.id, a.id),
            });
        assert!(matches!(store.apply(batch).await, Err(StoreError::Rejected(_))));
        assert_eq!(store.read_parent(&a.id).await.unwrap(), Some(root.id));
    }

    #[tokio::test]
    async fn duplicate_edge_is_noop() {
        let (store, root, a, _b, _leaf) = seeded();
        let receipt = store
            .apply(WriteBatch::new("dup").with_op(WriteOp::CreateEdge {
                edge: Edge::contains(root.id, a.id),
            }))
            .await
            .unwrap();
        assert_eq!(receipt.edges_created, 0);
    }

    #[tokio::test]
    async fn write_ranks_rejects_non_member() {
        let (store, root, _a, _b, leaf) = seeded();
        let result = store
            .write_ranks(&root.id, NodeKind::Leaf, vec![RankUpdate::new(leaf.id, rank(1))])
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn failed_op_leaves_state_untouched() {
        let (store, root, a, b, _leaf) = seeded();
        let before = store.full_snapshot().fingerprint();

        let batch = WriteBatch::new("swap")
            .with_op(WriteOp::WriteRanks {
                parent: root.id,
                kind: NodeKind::Branch,
                entries: vec![RankUpdate::new(a.id, rank(2)), RankUpdate::new(b.id, rank(1))],
            })
            .with_op(WriteOp::SetTitle {
                id: NodeId::generate(),
                title: "missing".into(),
            });
        assert!(matches!(store.apply(batch).await, Err(StoreError::NotFound(_))));
        assert_eq!(store.full_snapshot().fingerprint(), before);
    }

    #[tokio::test]
    async fn injected_failure_mid_batch_is_atomic() {
        let (store, _root, a, _b, _leaf) = seeded();
        let before = store.full_snapshot().fingerprint();
        store.set_fail_on(FailOn::ApplyAtOp {
            index: 1,
            error: StoreError::Unavailable("timeout".into()),
        });

        let batch = WriteBatch::new("rename twice")
            .with_op(WriteOp::SetTitle {
                id: a.id,
                title: "first".into(),
            })
            .with_op(WriteOp::SetTitle {
                id: a.id,
                title: "second".into(),
            });
        assert!(store.apply(batch).await.is_err());
        assert_eq!(store.full_snapshot().fingerprint(), before);

        store.clear_fail_on();
        assert_eq!(store.read_node(&a.id).await.unwrap().unwrap().title, "a");
    }

    #[tokio::test]
    async fn delete_subtree_detaches_shared_nodes() {
        let (store, root, a, _b, leaf) = seeded();
        let citation = Node::new(NodeKind::Citation, "quote");
        store.create_node(citation.clone()).await.unwrap();
        store
            .create_edge(Edge::new(leaf.id, citation.id, RelationKind::Cites))
            .await
            .unwrap();

        let receipt = store
            .apply(WriteBatch::new("delete").with_op(WriteOp::DeleteSubtree { root: a.id }))
            .await
            .unwrap();
        assert_eq!(receipt.nodes_deleted, 2);
        assert_eq!(receipt.edges_removed, 3);

        assert!(store.read_node(&leaf.id).await.unwrap().is_none());
        assert!(store.read_node(&citation.id).await.unwrap().is_some());
        assert_eq!(
            store.read_children(&root.id, NodeKind::Branch).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn snapshot_follows_cites_and_document_links() {
        let (store, root, _a, _b, leaf) = seeded();
        let citation = Node::new(NodeKind::Citation, "quote");
        let doc = Node::new(NodeKind::ExternalDoc, "Paper");
        let unrelated = Node::new(NodeKind::ExternalDoc, "Other");
        for node in [citation.clone(), doc.clone(), unrelated.clone()] {
            store.create_node(node).await.unwrap();
        }
        store
            .create_edge(Edge::new(leaf.id, citation.id, RelationKind::Cites))
            .await
            .unwrap();
        store
            .create_edge(Edge::new(doc.id, citation.id, RelationKind::References))
            .await
            .unwrap();

        let snapshot = store.read_snapshot(&root.id).await.unwrap();
        assert_eq!(snapshot.root().map(|n| n.id), Some(root.id));
        assert!(snapshot.node(&citation.id).is_some());
        assert!(snapshot.node(&doc.id).is_some());
        assert!(snapshot.node(&unrelated.id).is_none());
        assert_eq!(snapshot.len(), 6);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_root_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read_snapshot(&NodeId::generate()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn read_failure_injection() {
        let (store, root, ..) = seeded();
        let store = store.fail_on(FailOn::Reads(StoreError::Unavailable("down".into())));
        assert!(matches!(
            store.read_children(&root.id, NodeKind::Branch).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn operations_recorded() {
        let (store, root, ..) = seeded();
        store.read_children(&root.id, NodeKind::Branch).await.unwrap();
        store.delete_subtree(&root.id).await.unwrap();

        let ops = store.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            StoreOperation::ReadChildren {
                parent: root.id,
                kind: NodeKind::Branch
            }
        );
        assert_eq!(store.batches()[0].label, "delete_subtree");
        assert_eq!(store.node_count(), 0);

        store.clear_operations();
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn default_store_keeps_no_log() {
        let store = MemoryStore::new();
        let root = Node::new(NodeKind::Root, "root");
        store.create_node(root.clone()).await.unwrap();
        for _ in 0..100 {
            store.read_node(&root.id).await.unwrap();
            store.read_children(&root.id, NodeKind::Branch).await.unwrap();
        }

        assert!(store.operations().is_empty());
        assert!(store.batches().is_empty());
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn store_name() {
        assert_eq!(MemoryStore::new().name(), "memory");
    }
}
