//! engine::ranking
//!
//! Pure rank planning for sibling groups.
//!
//! # Invariants
//!
//! - No I/O, no mutation; every function maps a group to the rank writes
//!   needed to keep it contiguous
//! - Only entries whose rank actually changes are returned
//!
//! # Example
//!
//! ```
//! use outliner::core::types::{NodeId, Rank};
//! use outliner::engine::ranking::plan_move;
//! use outliner::store::ChildEntry;
//!
//! let ids: Vec<NodeId> = (0..4).map(|_| NodeId::generate()).collect();
//! let group: Vec<ChildEntry> = ids
//!     .iter()
//!     .enumerate()
//!     .map(|(i, id)| ChildEntry { id: *id, rank: Some(Rank::from_index(i)) })
//!     .collect();
//!
//! // Moving the last entry to the front shifts every other entry down one.
//! let updates = plan_move(&group, ids[3], Rank::FIRST).unwrap();
//! assert_eq!(updates.len(), 4);
//! ```

use thiserror::Error;

use crate::core::types::{NodeId, Rank};
use crate::store::{ChildEntry, RankUpdate};

/// Errors from rank planning.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("node {0} is not in the sibling group")]
    NotMember(NodeId),

    #[error("node {0} has no rank")]
    Unranked(NodeId),

    #[error("rank {rank} is outside 1..={size}")]
    OutOfRange { rank: u32, size: usize },
}

/// Rank for a new member appended to `group`.
pub fn next_rank(group: &[ChildEntry]) -> Rank {
    Rank::from_index(group.len())
}

/// Rank writes that move `id` to `new_rank`.
///
/// Moving down (`old < new`) pulls every sibling in `old+1..=new` up by
/// one; moving up (`old > new`) pushes every sibling in `new..old` down by
/// one. The moved entry comes first in the result. Returns an empty plan
/// when the rank does not change.
pub fn plan_move(
    group: &[ChildEntry],
    id: NodeId,
    new_rank: Rank,
) -> Result<Vec<RankUpdate>, RankingError> {
    let size = group.len();
    if new_rank.get() as usize > size {
        return Err(RankingError::OutOfRange {
            rank: new_rank.get(),
            size,
        });
    }

    let old_rank = group
        .iter()
        .find(|e| e.id == id)
        .ok_or(RankingError::NotMember(id))?
        .rank
        .ok_or(RankingError::Unranked(id))?;
    if old_rank == new_rank {
        return Ok(Vec::new());
    }

    let mut updates = vec![RankUpdate::new(id, new_rank)];
    for entry in group.iter().filter(|e| e.id != id) {
        let Some(rank) = entry.rank else {
            continue;
        };
        let shifted = if old_rank < new_rank && rank > old_rank && rank <= new_rank {
            rank.prev()
        } else if old_rank > new_rank && rank >= new_rank && rank < old_rank {
            Some(rank.next())
        } else {
            None
        };
        if let Some(rank) = shifted {
            updates.push(RankUpdate::new(entry.id, rank));
        }
    }
    Ok(updates)
}

/// Rank writes that close the gap left by removing `id` from `group`.
///
/// Every remaining sibling ranked above the removed one moves up by one.
/// Unknown or unranked ids leave no gap and produce an empty plan.
pub fn plan_removal(group: &[ChildEntry], id: NodeId) -> Vec<RankUpdate> {
    let Some(removed) = group.iter().find(|e| e.id == id).and_then(|e| e.rank) else {
        return Vec::new();
    };

    group
        .iter()
        .filter(|e| e.id != id)
        .filter_map(|e| {
            e.rank
                .filter(|r| *r > removed)
                .and_then(Rank::prev)
                .map(|r| RankUpdate::new(e.id, r))
        })
        .collect()
}

/// Apply `updates` to `group`, returning the resulting ranks.
///
/// Used to preview a plan without touching the store.
pub fn apply_updates(group: &[ChildEntry], updates: &[RankUpdate]) -> Vec<ChildEntry> {
    group
        .iter()
        .map(|entry| match updates.iter().find(|u| u.id == entry.id) {
            Some(update) => ChildEntry {
                id: entry.id,
                rank: Some(update.rank),
            },
            None => *entry,
        })
        .collect()
}
