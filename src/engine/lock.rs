//! engine::lock
//!
//! Per-sibling-group locks.
//!
//! # Architecture
//!
//! Rank shifts and compactions read a sibling group, compute new ranks and
//! write them back. Two such operations racing on the same group would both
//! read the old ranks, so every mutation of a group runs while holding that
//! group's lock.
//!
//! A group is identified by [`GroupKey`] `(parent, child kind)`. Locks live
//! in a process-wide registry ([`SiblingLocks`]) and are handed out as RAII
//! guards.
//!
//! # Invariants
//!
//! - A guard holds its group for as long as it is alive; dropping it releases
//! - Acquisition is bounded by a timeout and fails with
//!   [`LockError::Timeout`] instead of waiting forever
//! - Several groups are always locked in ascending `GroupKey` order
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use outliner::core::types::{NodeId, NodeKind};
//! use outliner::engine::lock::{GroupKey, SiblingLocks};
//!
//! # tokio_test::block_on(async {
//! let locks = SiblingLocks::new();
//! let key = GroupKey::new(NodeId::generate(), NodeKind::Branch);
//!
//! let guard = locks.acquire(key, Duration::from_millis(10)).await.unwrap();
//! assert!(locks.acquire(key, Duration::from_millis(10)).await.is_err());
//!
//! drop(guard);
//! assert!(locks.acquire(key, Duration::from_millis(10)).await.is_ok());
//! # });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as GroupMutex, OwnedMutexGuard};

use crate::core::types::{NodeId, NodeKind};

/// Registry size above which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Errors from lock acquisition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    /// The group stayed locked for the whole timeout.
    #[error("sibling group {key} is busy (waited {waited:?})")]
    Timeout { key: GroupKey, waited: Duration },
}

/// Identifies one sibling group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub parent: NodeId,
    pub kind: NodeKind,
}

impl GroupKey {
    pub fn new(parent: NodeId, kind: NodeKind) -> Self {
        Self { parent, kind }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.parent, self.kind)
    }
}

/// Held lock on one sibling group.
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct GroupGuard {
    key: GroupKey,
    _guard: OwnedMutexGuard<()>,
}

impl GroupGuard {
    /// The locked group.
    pub fn key(&self) -> GroupKey {
        self.key
    }
}

/// Registry of per-group locks.
#[derive(Debug, Default)]
pub struct SiblingLocks {
    groups: Mutex<HashMap<GroupKey, Arc<GroupMutex<()>>>>,
}

impl SiblingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock one group, waiting at most `timeout`.
    pub async fn acquire(&self, key: GroupKey, timeout: Duration) -> Result<GroupGuard, LockError> {
        let slot = self.slot(key);
        match tokio::time::timeout(timeout, slot.lock_owned()).await {
            Ok(guard) => {
                tracing::trace!(group = %key, "locked sibling group");
                Ok(GroupGuard { key, _guard: guard })
            }
            Err(_) => Err(LockError::Timeout {
                key,
                waited: timeout,
            }),
        }
    }

    /// Lock several groups in ascending key order.
    ///
    /// Duplicate keys are locked once. If any acquisition times out, the
    /// guards taken so far are released.
    pub async fn acquire_all(
        &self,
        keys: impl IntoIterator<Item = GroupKey>,
        timeout: Duration,
    ) -> Result<Vec<GroupGuard>, LockError> {
        let mut keys: Vec<GroupKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key, timeout).await?);
        }
        Ok(guards)
    }

    /// Number of groups currently tracked.
    pub fn tracked(&self) -> usize {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, key: GroupKey) -> Arc<GroupMutex<()>> {
        // The map only caches mutexes, so a poisoned registry is still usable.
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        if groups.len() > PRUNE_THRESHOLD {
            groups.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        Arc::clone(groups.entry(key).or_default())
    }
}
