//! numbering
//!
//! Display numbers ("1.2.3.") derived from a forest snapshot.
//!
//! # Algorithm
//!
//! Starting at the root, walk `Contains` edges depth-first. Children are
//! visited in [`ForestSnapshot::ordered_children`] order, the same order
//! the document linearizer uses. Each `Branch` gets
//! `parent_label + rank + "."`, where the root's label is empty.
//!
//! Nodes that are unranked, unreachable from the root, or of a kind that
//! carries no dotted number get no entry.
//!
//! # Invariants
//!
//! - Pure: no I/O, no mutation, same snapshot in means same map out
//! - Never panics, whatever the snapshot looks like
//!
//! # Example
//!
//! ```
//! use outliner::core::forest::{Edge, ForestSnapshot, Node};
//! use outliner::core::types::{NodeKind, Rank};
//! use outliner::numbering::compute_numbers;
//!
//! let root = Node::new(NodeKind::Root, "Thesis");
//! let intro = Node::new(NodeKind::Branch, "Intro").with_rank(Rank::FIRST);
//! let scope = Node::new(NodeKind::Branch, "Scope").with_rank(Rank::FIRST);
//! let snapshot = ForestSnapshot::new(
//!     vec![root.clone(), intro.clone(), scope.clone()],
//!     vec![Edge::contains(root.id, intro.id), Edge::contains(intro.id, scope.id)],
//! );
//!
//! let numbers = compute_numbers(&snapshot);
//! assert_eq!(numbers[&intro.id], "1.");
//! assert_eq!(numbers[&scope.id], "1.1.");
//! assert!(!numbers.contains_key(&root.id));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::forest::ForestSnapshot;
use crate::core::types::NodeId;

/// Display number per node.
pub type Numbering = BTreeMap<NodeId, String>;

/// Compute display numbers for every numbered node under the root.
///
/// The walk is the same pre-order the linearizer uses: a node is claimed
/// when it is popped, so a node with several parents is numbered under the
/// parent it is placed under in the document.
pub fn compute_numbers(snapshot: &ForestSnapshot) -> Numbering {
    let mut numbers = Numbering::new();
    let Some(root) = snapshot.root() else {
        return numbers;
    };

    let mut visited = HashSet::new();
    // Each entry carries its parent's label; `None` below an unnumbered node.
    let mut stack = vec![(root, Some(String::new()))];
    while let Some((node, parent_label)) = stack.pop() {
        if !visited.insert(node.id) {
            continue;
        }

        let label = if node.id == root.id {
            Some(String::new())
        } else {
            match (parent_label, node.rank) {
                (Some(prefix), Some(rank)) if node.kind.is_numbered() => {
                    let label = format!("{prefix}{rank}.");
                    numbers.insert(node.id, label.clone());
                    Some(label)
                }
                _ => None,
            }
        };

        let children = snapshot.ordered_children(&node.id);
        stack.extend(children.into_iter().rev().map(|child| (child, label.clone())));
    }
    numbers
}

/// Difference between two numberings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingDiff {
    /// Nodes whose label is new or different, with the new label.
    pub changed: BTreeMap<NodeId, String>,
    /// Nodes that had a label and no longer do.
    pub removed: BTreeSet<NodeId>,
}

impl NumberingDiff {
    /// Whether nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }

    /// Number of label writes the diff implies.
    pub fn len(&self) -> usize {
        self.changed.len() + self.removed.len()
    }

    /// Bring `numbering` up to date.
    pub fn apply_to(&self, numbering: &mut Numbering) {
        for id in &self.removed {
            numbering.remove(id);
        }
        for (id, label) in &self.changed {
            numbering.insert(*id, label.clone());
        }
    }
}

/// Compare an old numbering with a freshly computed one.
///
/// # Example
///
/// ```
/// use outliner::numbering::{diff_numbers, Numbering};
///
/// let old = Numbering::new();
/// assert!(diff_numbers(&old, &old.clone()).is_empty());
/// ```
pub fn diff_numbers(old: &Numbering, new: &Numbering) -> NumberingDiff {
    let changed = new
        .iter()
        .filter(|(id, label)| old.get(*id) != Some(*label))
        .map(|(id, label)| (*id, label.clone()))
        .collect();
    let removed = old
        .keys()
        .filter(|id| !new.contains_key(*id))
        .copied()
        .collect();
    NumberingDiff { changed, removed }
}
