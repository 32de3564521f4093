//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`NodeId`] - Opaque node identifier (UUID)
//! - [`NodeKind`] - The five node kinds of an outline
//! - [`RelationKind`] - Typed edge relations
//! - [`Rank`] - 1-based position inside a sibling group
//! - [`NodeRef`] - Kind-tagged node identifier
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Content hash for snapshot comparison
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use outliner::core::types::{NodeKind, NodeRef, Rank};
//!
//! // Valid constructions
//! let rank = Rank::new(3).unwrap();
//! assert_eq!(rank.get(), 3);
//! assert!(NodeKind::Branch.accepts_child(NodeKind::Leaf));
//!
//! // Invalid constructions fail at creation time
//! assert!(Rank::new(0).is_err());
//! assert!("topic-12".parse::<NodeRef>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("invalid node kind: {0}")]
    InvalidNodeKind(String),

    #[error("invalid rank: {0}")]
    InvalidRank(String),

    #[error("invalid node reference: {0}")]
    InvalidNodeRef(String),
}

/// An opaque node identifier.
///
/// Ids are minted on the client side so that node creation can be part of
/// a single atomic write batch.
///
/// # Example
///
/// ```
/// use outliner::core::types::NodeId;
///
/// let id = NodeId::generate();
/// let parsed = NodeId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
///
/// assert!(NodeId::parse("not-a-uuid").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Mint a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an id from its hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNodeId` if the string is not a UUID.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidNodeId(format!("{s}: {e}")))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The kind of an outline node.
///
/// Declaration order is significant: it is the order in which sibling
/// groups of different kinds are visited under one parent (see
/// [`NodeKind::group_order`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The single top of an outline.
    Root,
    /// A numbered section.
    Branch,
    /// A body paragraph inside a section.
    Leaf,
    /// A quoted passage.
    Citation,
    /// A source document that citations come from.
    ExternalDoc,
}

impl NodeKind {
    /// All kinds, in declaration order.
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Root,
        NodeKind::Branch,
        NodeKind::Leaf,
        NodeKind::Citation,
        NodeKind::ExternalDoc,
    ];

    /// Whether a node of this kind may hold `child` through a `Contains` edge.
    ///
    /// # Example
    ///
    /// ```
    /// use outliner::core::types::NodeKind;
    ///
    /// assert!(NodeKind::Root.accepts_child(NodeKind::Branch));
    /// assert!(!NodeKind::Root.accepts_child(NodeKind::Leaf));
    /// assert!(!NodeKind::Leaf.accepts_child(NodeKind::Leaf));
    /// ```
    pub fn accepts_child(self, child: NodeKind) -> bool {
        matches!(
            (self, child),
            (NodeKind::Root, NodeKind::Branch)
                | (NodeKind::Branch, NodeKind::Branch)
                | (NodeKind::Branch, NodeKind::Leaf)
        )
    }

    /// Whether nodes of this kind carry dotted display numbers.
    pub fn is_numbered(self) -> bool {
        self == NodeKind::Branch
    }

    /// Visiting order of sibling groups under one parent.
    ///
    /// A section's paragraphs come before its subsections; anything else
    /// that ended up under a `Contains` edge is visited last.
    pub fn group_order(self) -> u8 {
        match self {
            NodeKind::Leaf => 0,
            NodeKind::Branch => 1,
            NodeKind::Citation => 2,
            NodeKind::ExternalDoc => 3,
            NodeKind::Root => 4,
        }
    }

    /// Lowercase name used in composite references and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Branch => "branch",
            NodeKind::Leaf => "leaf",
            NodeKind::Citation => "citation",
            NodeKind::ExternalDoc => "external_doc",
        }
    }

    /// Human-facing name used in fallback document blocks.
    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Branch => "Branch",
            NodeKind::Leaf => "Leaf",
            NodeKind::Citation => "Citation",
            NodeKind::ExternalDoc => "ExternalDoc",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TypeError::InvalidNodeKind(s.to_string()))
    }
}

/// The relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Hierarchical containment. The only relation that carries ranks.
    Contains,
    /// Leaf -> Citation.
    Cites,
    /// Branch | ExternalDoc -> Citation.
    References,
    /// Citation -> ExternalDoc.
    LinkedFrom,
}

impl RelationKind {
    /// Whether this relation is hierarchical.
    pub fn is_hierarchical(self) -> bool {
        self == RelationKind::Contains
    }

    /// Whether an edge of this relation may connect `source` to `target`.
    ///
    /// # Example
    ///
    /// ```
    /// use outliner::core::types::{NodeKind, RelationKind};
    ///
    /// assert!(RelationKind::Cites.permits(NodeKind::Leaf, NodeKind::Citation));
    /// assert!(!RelationKind::Cites.permits(NodeKind::Branch, NodeKind::Citation));
    /// assert!(RelationKind::Contains.permits(NodeKind::Branch, NodeKind::Leaf));
    /// ```
    pub fn permits(self, source: NodeKind, target: NodeKind) -> bool {
        match self {
            RelationKind::Contains => source.accepts_child(target),
            RelationKind::Cites => source == NodeKind::Leaf && target == NodeKind::Citation,
            RelationKind::References => {
                matches!(source, NodeKind::Branch | NodeKind::ExternalDoc)
                    && target == NodeKind::Citation
            }
            RelationKind::LinkedFrom => {
                source == NodeKind::Citation && target == NodeKind::ExternalDoc
            }
        }
    }

    /// Lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Contains => "contains",
            RelationKind::Cites => "cites",
            RelationKind::References => "references",
            RelationKind::LinkedFrom => "linked_from",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 1-based position inside a sibling group.
///
/// # Example
///
/// ```
/// use outliner::core::types::Rank;
///
/// let first = Rank::FIRST;
/// assert_eq!(first.get(), 1);
/// assert_eq!(first.next().get(), 2);
/// assert!(Rank::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Rank(u32);

impl Rank {
    /// Rank 1.
    pub const FIRST: Rank = Rank(1);

    /// Create a rank.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRank` for zero.
    pub fn new(value: u32) -> Result<Self, TypeError> {
        if value == 0 {
            return Err(TypeError::InvalidRank("rank must be positive".into()));
        }
        Ok(Self(value))
    }

    /// Rank for the 0-based position `index`.
    pub fn from_index(index: usize) -> Self {
        let value = u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1));
        Self(value)
    }

    /// The numeric value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The following rank.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The preceding rank, if any.
    pub fn prev(self) -> Option<Self> {
        Self::new(self.0 - 1).ok()
    }
}

impl TryFrom<u32> for Rank {
    type Error = TypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rank> for u32 {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node identifier tagged with its kind.
///
/// Built once where nodes enter the system so call sites dispatch on the
/// variant instead of re-parsing composite identifiers. The string form is
/// `<kind>-<uuid>`, e.g. `branch-5f0c...`.
///
/// # Example
///
/// ```
/// use outliner::core::types::{NodeId, NodeKind, NodeRef};
///
/// let id = NodeId::generate();
/// let r = NodeRef::new(NodeKind::Leaf, id);
/// let parsed: NodeRef = r.to_string().parse().unwrap();
/// assert_eq!(parsed, NodeRef::Leaf(id));
/// assert_eq!(parsed.kind(), NodeKind::Leaf);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeRef {
    Root(NodeId),
    Branch(NodeId),
    Leaf(NodeId),
    Citation(NodeId),
    ExternalDoc(NodeId),
}

impl NodeRef {
    /// Tag `id` with `kind`.
    pub fn new(kind: NodeKind, id: NodeId) -> Self {
        match kind {
            NodeKind::Root => NodeRef::Root(id),
            NodeKind::Branch => NodeRef::Branch(id),
            NodeKind::Leaf => NodeRef::Leaf(id),
            NodeKind::Citation => NodeRef::Citation(id),
            NodeKind::ExternalDoc => NodeRef::ExternalDoc(id),
        }
    }

    /// The untagged id.
    pub fn id(&self) -> NodeId {
        match *self {
            NodeRef::Root(id)
            | NodeRef::Branch(id)
            | NodeRef::Leaf(id)
            | NodeRef::Citation(id)
            | NodeRef::ExternalDoc(id) => id,
        }
    }

    /// The kind tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Root(_) => NodeKind::Root,
            NodeRef::Branch(_) => NodeKind::Branch,
            NodeRef::Leaf(_) => NodeKind::Leaf,
            NodeRef::Citation(_) => NodeKind::Citation,
            NodeRef::ExternalDoc(_) => NodeKind::ExternalDoc,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind(), self.id())
    }
}

impl FromStr for NodeRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Kind names never contain '-', UUIDs do.
        let (kind, id) = s
            .split_once('-')
            .ok_or_else(|| TypeError::InvalidNodeRef(s.to_string()))?;
        let kind: NodeKind = kind
            .parse()
            .map_err(|_| TypeError::InvalidNodeRef(s.to_string()))?;
        let id = NodeId::parse(id).map_err(|_| TypeError::InvalidNodeRef(s.to_string()))?;
        Ok(NodeRef::new(kind, id))
    }
}

/// A UTC timestamp.
///
/// # Example
///
/// ```
/// use outliner::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable SHA-256 hash over serialized content.
///
/// Used to tell whether two snapshots describe the same state without
/// comparing them field by field.
///
/// # Example
///
/// ```
/// use outliner::core::types::Fingerprint;
///
/// let a = Fingerprint::of_bytes(b"outline");
/// let b = Fingerprint::of_bytes(b"outline");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash raw bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod node_id {
        use super::*;

        #[test]
        fn generated_ids_are_distinct() {
            assert_ne!(NodeId::generate(), NodeId::generate());
        }

        #[test]
        fn display_parse_roundtrip() {
            let id = NodeId::generate();
            assert_eq!(NodeId::parse(&id.to_string()).unwrap(), id);
        }

        #[test]
        fn garbage_rejected() {
            assert!(matches!(
                NodeId::parse("12"),
                Err(TypeError::InvalidNodeId(_))
            ));
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = NodeId::generate();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id));
        }
    }

    mod node_kind {
        use super::*;

        #[test]
        fn containment_rules() {
            assert!(NodeKind::Root.accepts_child(NodeKind::Branch));
            assert!(NodeKind::Branch.accepts_child(NodeKind::Branch));
            assert!(NodeKind::Branch.accepts_child(NodeKind::Leaf));

            assert!(!NodeKind::Root.accepts_child(NodeKind::Root));
            assert!(!NodeKind::Branch.accepts_child(NodeKind::Citation));
            assert!(!NodeKind::Leaf.accepts_child(NodeKind::Branch));
            assert!(!NodeKind::Citation.accepts_child(NodeKind::Leaf));
            assert!(!NodeKind::ExternalDoc.accepts_child(NodeKind::Citation));
        }

        #[test]
        fn parse_all_kinds() {
            for kind in NodeKind::ALL {
                assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
            }
            assert!("topic".parse::<NodeKind>().is_err());
        }

        #[test]
        fn leaves_visit_before_branches() {
            assert!(NodeKind::Leaf.group_order() < NodeKind::Branch.group_order());
        }

        #[test]
        fn only_branches_are_numbered() {
            let numbered: Vec<_> = NodeKind::ALL.into_iter().filter(|k| k.is_numbered()).collect();
            assert_eq!(numbered, vec![NodeKind::Branch]);
        }
    }

    mod relation_kind {
        use super::*;

        #[test]
        fn endpoint_typing() {
            use NodeKind::*;

            assert!(RelationKind::References.permits(Branch, Citation));
            assert!(RelationKind::References.permits(ExternalDoc, Citation));
            assert!(!RelationKind::References.permits(Leaf, Citation));

            assert!(RelationKind::LinkedFrom.permits(Citation, ExternalDoc));
            assert!(!RelationKind::LinkedFrom.permits(ExternalDoc, Citation));

            assert!(!RelationKind::Contains.permits(Root, Leaf));
        }

        #[test]
        fn only_contains_is_hierarchical() {
            assert!(RelationKind::Contains.is_hierarchical());
            assert!(!RelationKind::Cites.is_hierarchical());
            assert!(!RelationKind::References.is_hierarchical());
            assert!(!RelationKind::LinkedFrom.is_hierarchical());
        }
    }

    mod rank {
        use super::*;

        #[test]
        fn zero_rejected() {
            assert!(Rank::new(0).is_err());
            assert!(serde_json::from_str::<Rank>("0").is_err());
        }

        #[test]
        fn from_index_is_one_based() {
            assert_eq!(Rank::from_index(0), Rank::FIRST);
            assert_eq!(Rank::from_index(4).get(), 5);
        }

        #[test]
        fn prev_of_first_is_none() {
            assert_eq!(Rank::FIRST.prev(), None);
            assert_eq!(Rank::new(3).unwrap().prev(), Some(Rank::new(2).unwrap()));
        }

        #[test]
        fn serde_as_number() {
            let rank = Rank::new(7).unwrap();
            assert_eq!(serde_json::to_string(&rank).unwrap(), "7");
            assert_eq!(serde_json::from_str::<Rank>("7").unwrap(), rank);
        }
    }

    mod node_ref {
        use super::*;

        #[test]
        fn composite_form() {
            let id = NodeId::generate();
            let r = NodeRef::Branch(id);
            assert_eq!(r.to_string(), format!("branch-{}", id));
        }

        #[test]
        fn external_doc_roundtrip() {
            let id = NodeId::generate();
            let r = NodeRef::ExternalDoc(id);
            assert_eq!(r.to_string().parse::<NodeRef>().unwrap(), r);
        }

        #[test]
        fn legacy_numeric_ids_rejected() {
            assert!("topic-12".parse::<NodeRef>().is_err());
            assert!("branch-12".parse::<NodeRef>().is_err());
            assert!("branch".parse::<NodeRef>().is_err());
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn differs_for_different_input() {
            assert_ne!(Fingerprint::of_bytes(b"a"), Fingerprint::of_bytes(b"b"));
        }
    }
}
