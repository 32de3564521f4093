//! core::verify
//!
//! Rank and structure verification.
//!
//! # Modes
//!
//! - **Group verify**: one sibling group, used as the read-back check after
//!   every engine write
//!   - Ranks present on every member
//!   - Ranks form exactly `1..=n`
//!
//! - **Snapshot verify**: every group plus structural checks
//!   - Single `Contains` parent per node
//!   - Acyclic hierarchy
//!   - Containment kinds allowed
//!
//! # Invariants
//!
//! - Never mutates anything
//! - Must be deterministic

use thiserror::Error;

use super::forest::ForestSnapshot;
use super::types::{NodeId, NodeKind, Rank};

/// A sibling as seen by verification: id plus optional rank.
pub type RankedEntry = (NodeId, Option<Rank>);

/// Errors from verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("node {0} has no rank inside its sibling group")]
    Unranked(NodeId),

    #[error("rank {rank} is used by more than one sibling")]
    DuplicateRank { rank: u32 },

    #[error("rank {rank} is missing from a group of {size}")]
    MissingRank { rank: u32, size: usize },

    #[error("node {0} has more than one parent")]
    MultipleParents(NodeId),

    #[error("containment cycle through node {0}")]
    CycleDetected(NodeId),

    #[error("{parent_kind} node {parent} cannot contain {child_kind}")]
    IllegalContainment {
        parent: NodeId,
        parent_kind: NodeKind,
        child_kind: NodeKind,
    },
}

/// Result of snapshot verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

/// Check that one sibling group is ranked exactly `1..=n`.
///
/// Reports the first problem found: unranked member, then duplicates, then
/// gaps.
///
/// # Example
///
/// ```
/// use outliner::core::types::{NodeId, Rank};
/// use outliner::core::verify::verify_group;
///
/// let r = |n| Some(Rank::new(n).unwrap());
/// let ok = vec![(NodeId::generate(), r(2)), (NodeId::generate(), r(1))];
/// assert!(verify_group(&ok).is_ok());
///
/// let gap = vec![(NodeId::generate(), r(1)), (NodeId::generate(), r(3))];
/// assert!(verify_group(&gap).is_err());
/// ```
pub fn verify_group(entries: &[RankedEntry]) -> Result<(), VerifyError> {
    let size = entries.len();
    let mut seen = vec![false; size];

    for (id, rank) in entries {
        let rank = rank.ok_or(VerifyError::Unranked(*id))?;
        let slot = rank.get() as usize;
        if slot > size {
            // Out-of-range rank implies some in-range slot stays empty.
            continue;
        }
        if seen[slot - 1] {
            return Err(VerifyError::DuplicateRank { rank: rank.get() });
        }
        seen[slot - 1] = true;
    }

    match seen.iter().position(|filled| !filled) {
        Some(missing) => Err(VerifyError::MissingRank {
            rank: missing as u32 + 1,
            size,
        }),
        None => Ok(()),
    }
}

/// Verify every sibling group and the hierarchy of a snapshot.
pub fn verify_snapshot(snapshot: &ForestSnapshot) -> VerifyResult {
    let mut errors = Vec::new();

    for id in snapshot.multi_parented() {
        errors.push(VerifyError::MultipleParents(id));
    }

    if let Some(id) = snapshot.find_cycle() {
        errors.push(VerifyError::CycleDetected(id));
    }

    for (parent, kind) in snapshot.groups() {
        if let Some(parent_node) = snapshot.node(&parent) {
            if !parent_node.kind.accepts_child(kind) {
                errors.push(VerifyError::IllegalContainment {
                    parent,
                    parent_kind: parent_node.kind,
                    child_kind: kind,
                });
            }
        }

        let entries: Vec<RankedEntry> = snapshot
            .sibling_group(&parent, kind)
            .iter()
            .map(|n| (n.id, n.rank))
            .collect();
        if let Err(e) = verify_group(&entries) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forest::{Edge, Node};

    fn entry(rank: Option<u32>) -> RankedEntry {
        (NodeId::generate(), rank.map(|r| Rank::new(r).unwrap()))
    }

    #[test]
    fn empty_group_is_contiguous() {
        assert!(verify_group(&[]).is_ok());
    }

    #[test]
    fn permuted_ranks_are_contiguous() {
        let group = vec![entry(Some(3)), entry(Some(1)), entry(Some(2))];
        assert!(verify_group(&group).is_ok());
    }

    #[test]
    fn duplicate_detected() {
        let group = vec![entry(Some(1)), entry(Some(2)), entry(Some(2))];
        assert_eq!(
            verify_group(&group),
            Err(VerifyError::DuplicateRank { rank: 2 })
        );
    }

    #[test]
    fn gap_detected() {
        let group = vec![entry(Some(1)), entry(Some(4)), entry(Some(3))];
        assert_eq!(
            verify_group(&group),
            Err(VerifyError::MissingRank { rank: 2, size: 3 })
        );
    }

    #[test]
    fn unranked_member_detected() {
        let unranked = entry(None);
        let group = vec![entry(Some(1)), unranked];
        assert_eq!(verify_group(&group), Err(VerifyError::Unranked(unranked.0)));
    }

    #[test]
    fn snapshot_with_valid_outline_passes() {
        let root = Node::new(NodeKind::Root, "r");
        let a = Node::new(NodeKind::Branch, "a").with_rank(Rank::FIRST);
        let b = Node::new(NodeKind::Branch, "b").with_rank(Rank::new(2).unwrap());
        let leaf = Node::new(NodeKind::Leaf, "l").with_rank(Rank::FIRST);
        let edges = vec![
            Edge::contains(root.id, a.id),
            Edge::contains(root.id, b.id),
            Edge::contains(a.id, leaf.id),
        ];
        let snapshot = ForestSnapshot::new(vec![root, a, b, leaf], edges);
        let result = verify_snapshot(&snapshot);
        assert!(result.ok, "{:?}", result.errors);
    }

    #[test]
    fn snapshot_reports_illegal_containment_and_gap() {
        let root = Node::new(NodeKind::Root, "r");
        let leaf = Node::new(NodeKind::Leaf, "l").with_rank(Rank::new(2).unwrap());
        let snapshot =
            ForestSnapshot::new(vec![root.clone(), leaf.clone()], vec![Edge::contains(root.id, leaf.id)]);
        let result = verify_snapshot(&snapshot);
        assert!(!result.ok);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, VerifyError::IllegalContainment { .. })));
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, VerifyError::MissingRank { rank: 1, .. })));
    }
}
