//! core::forest
//!
//! Outline forest representation.
//!
//! # Architecture
//!
//! A forest snapshot is an immutable, in-memory copy of a region of the
//! graph store:
//! - Nodes are typed ([`NodeKind`]) and optionally ranked
//! - Edges are typed ([`RelationKind`]); only `Contains` is hierarchical
//! - Root is the designated `Root` node, if any
//!
//! # Invariants
//!
//! - A node has at most one incoming `Contains` edge
//! - Ranks inside one sibling group are `1..=n` (checked by
//!   [`crate::core::verify`], not enforced here)
//!
//! Snapshots may be built from partial or malformed data; every query
//! degrades to "nothing found" instead of failing.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::types::{Fingerprint, NodeId, NodeKind, NodeRef, Rank, RelationKind, UtcTimestamp};

/// A node of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    /// Position in the node's sibling group; `None` for unordered nodes.
    pub rank: Option<Rank>,
    pub created_at: UtcTimestamp,
}

impl Node {
    /// Create an unranked node stamped with the current time.
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            kind,
            title: title.into(),
            rank: None,
            created_at: UtcTimestamp::now(),
        }
    }

    /// Builder-style rank assignment.
    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }

    /// The kind-tagged reference for this node.
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.kind, self.id)
    }
}

/// A directed, typed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: RelationKind,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, relation: RelationKind) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// Shorthand for a `Contains` edge.
    pub fn contains(parent: NodeId, child: NodeId) -> Self {
        Self::new(parent, child, RelationKind::Contains)
    }

    /// Whether the edge touches `id` at either end.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

/// An immutable view of (part of) an outline.
///
/// # Example
///
/// ```
/// use outliner::core::forest::{Edge, ForestSnapshot, Node};
/// use outliner::core::types::{NodeKind, Rank};
///
/// let root = Node::new(NodeKind::Root, "Thesis");
/// let intro = Node::new(NodeKind::Branch, "Intro").with_rank(Rank::FIRST);
/// let edges = vec![Edge::contains(root.id, intro.id)];
///
/// let snapshot = ForestSnapshot::new(vec![root.clone(), intro.clone()], edges);
/// assert_eq!(snapshot.root().map(|n| n.id), Some(root.id));
/// assert_eq!(snapshot.parent(&intro.id), Some(&root.id));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SnapshotParts", into = "SnapshotParts")]
pub struct ForestSnapshot {
    root: Option<NodeId>,
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    /// Parent -> `Contains` children, in edge order.
    children: HashMap<NodeId, Vec<NodeId>>,
    /// Child -> first `Contains` parent seen.
    parents: HashMap<NodeId, NodeId>,
}

/// Serialized form: the derived indices are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct SnapshotParts {
    root: Option<NodeId>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl From<SnapshotParts> for ForestSnapshot {
    fn from(parts: SnapshotParts) -> Self {
        let snapshot = ForestSnapshot::new(parts.nodes, parts.edges);
        match parts.root {
            Some(root) => snapshot.with_root(root),
            None => snapshot,
        }
    }
}

impl From<ForestSnapshot> for SnapshotParts {
    fn from(snapshot: ForestSnapshot) -> Self {
        SnapshotParts {
            root: snapshot.root,
            nodes: snapshot.nodes.into_values().collect(),
            edges: snapshot.edges,
        }
    }
}

impl ForestSnapshot {
    /// Build a snapshot from raw nodes and edges.
    ///
    /// The root is the unique `Root`-kind node; with zero or several of
    /// them no root is designated (use [`ForestSnapshot::with_root`]).
    /// Edges are sorted and de-duplicated so that equal graphs produce
    /// equal snapshots regardless of input order.
    pub fn new(nodes: impl IntoIterator<Item = Node>, edges: impl IntoIterator<Item = Edge>) -> Self {
        let nodes: BTreeMap<NodeId, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut edges: Vec<Edge> = edges.into_iter().collect();
        edges.sort();
        edges.dedup();

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        for edge in edges.iter().filter(|e| e.relation.is_hierarchical()) {
            children.entry(edge.source).or_default().push(edge.target);
            parents.entry(edge.target).or_insert(edge.source);
        }

        let mut roots = nodes.values().filter(|n| n.kind == NodeKind::Root);
        let root = match (roots.next(), roots.next()) {
            (Some(only), None) => Some(only.id),
            _ => None,
        };

        Self {
            root,
            nodes,
            edges,
            children,
            parents,
        }
    }

    /// Designate `root` as the outline root.
    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    /// The designated root node, if it exists and is of kind `Root`.
    pub fn root(&self) -> Option<&Node> {
        self.root
            .and_then(|id| self.nodes.get(&id))
            .filter(|n| n.kind == NodeKind::Root)
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges, sorted.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The `Contains` parent of a node.
    pub fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    /// Direct `Contains` children that exist in the snapshot, unordered.
    pub fn contains_children(&self, id: &NodeId) -> Vec<&Node> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Direct `Contains` children of one kind (one sibling group), sorted by rank.
    ///
    /// Unranked members are included and sort last.
    pub fn sibling_group(&self, parent: &NodeId, kind: NodeKind) -> Vec<&Node> {
        let mut group: Vec<&Node> = self
            .contains_children(parent)
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect();
        group.sort_by(|a, b| {
            (a.rank.is_none(), a.rank, a.id).cmp(&(b.rank.is_none(), b.rank, b.id))
        });
        group
    }

    /// The children visited by numbering and linearization, in visit order.
    ///
    /// This is the single ordering rule shared by both passes: ranked
    /// `Contains` children only, grouped by [`NodeKind::group_order`],
    /// ascending rank inside a group, ties broken by id.
    pub fn ordered_children(&self, id: &NodeId) -> Vec<&Node> {
        let mut ranked: Vec<(&Node, Rank)> = self
            .contains_children(id)
            .into_iter()
            .filter_map(|n| n.rank.map(|r| (n, r)))
            .collect();
        ranked.sort_by(|(a, ra), (b, rb)| {
            (a.kind.group_order(), ra, a.id).cmp(&(b.kind.group_order(), rb, b.id))
        });
        ranked.into_iter().map(|(n, _)| n).collect()
    }

    /// Nodes targeted by `Cites` edges from `id`, sorted by rank (unranked
    /// last), then creation time, then id.
    pub fn cited(&self, id: &NodeId) -> Vec<&Node> {
        let mut cited: Vec<&Node> = self
            .edges
            .iter()
            .filter(|e| e.relation == RelationKind::Cites && &e.source == id)
            .filter_map(|e| self.nodes.get(&e.target))
            .collect();
        cited.sort_by(|a, b| {
            (a.rank.is_none(), a.rank, a.created_at, a.id)
                .cmp(&(b.rank.is_none(), b.rank, b.created_at, b.id))
        });
        cited
    }

    /// The external document a citation came from.
    ///
    /// Prefers an incoming `References` edge from an `ExternalDoc`, then an
    /// outgoing `LinkedFrom` edge. Among several candidates the smallest id
    /// wins.
    pub fn source_document(&self, citation: &NodeId) -> Option<&Node> {
        let referenced_by = self
            .edges
            .iter()
            .filter(|e| e.relation == RelationKind::References && &e.target == citation)
            .filter_map(|e| self.nodes.get(&e.source))
            .filter(|n| n.kind == NodeKind::ExternalDoc)
            .min_by_key(|n| n.id);
        referenced_by.or_else(|| {
            self.edges
                .iter()
                .filter(|e| e.relation == RelationKind::LinkedFrom && &e.source == citation)
                .filter_map(|e| self.nodes.get(&e.target))
                .filter(|n| n.kind == NodeKind::ExternalDoc)
                .min_by_key(|n| n.id)
        })
    }

    /// All nodes below `id` via `Contains` edges (breadth-first, excluding `id`).
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([*id]);
        let mut queue: VecDeque<NodeId> = self.children.get(id).cloned().unwrap_or_default().into();

        while let Some(current) = queue.pop_front() {
            if seen.insert(current) {
                result.push(current);
                if let Some(children) = self.children.get(&current) {
                    queue.extend(children.iter().copied());
                }
            }
        }
        result
    }

    /// Nodes reachable from the root via `Contains` edges, root included.
    pub fn reachable_from_root(&self) -> HashSet<NodeId> {
        match self.root() {
            Some(root) => {
                let mut set: HashSet<NodeId> = self.descendants(&root.id).into_iter().collect();
                set.insert(root.id);
                set
            }
            None => HashSet::new(),
        }
    }

    /// Nodes with more than one incoming `Contains` edge.
    pub fn multi_parented(&self) -> Vec<NodeId> {
        let mut counts: BTreeMap<NodeId, usize> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| e.relation.is_hierarchical()) {
            *counts.entry(edge.target).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id)
            .collect()
    }

    /// Check the `Contains` hierarchy for cycles.
    ///
    /// Returns `Some(node)` if following parent pointers from that node
    /// comes back to it.
    pub fn find_cycle(&self) -> Option<NodeId> {
        for start in self.parents.keys() {
            let mut seen = HashSet::new();
            let mut current = Some(start);
            while let Some(node) = current {
                if !seen.insert(*node) {
                    return Some(*node);
                }
                current = self.parents.get(node);
            }
        }
        None
    }

    /// Every `(parent, kind)` sibling group present in the snapshot.
    pub fn groups(&self) -> Vec<(NodeId, NodeKind)> {
        let mut groups: Vec<(NodeId, NodeKind)> = self
            .children
            .iter()
            .flat_map(|(parent, kids)| {
                kids.iter()
                    .filter_map(|k| self.nodes.get(k))
                    .map(move |n| (*parent, n.kind))
            })
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Content hash over the canonical serialized form.
    pub fn fingerprint(&self) -> Fingerprint {
        // Nodes are id-ordered and edges sorted, so serialization is canonical.
        let parts = SnapshotParts {
            root: self.root,
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
        };
        let json = serde_json::to_vec(&parts).unwrap_or_default();
        Fingerprint::of_bytes(&json)
    }
}
