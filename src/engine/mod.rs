//! engine
//!
//! Structural mutations of the outline.
//!
//! # Architecture
//!
//! The engine is the only code that changes hierarchy or ranks. Each
//! operation runs a uniform lifecycle:
//!
//! ```text
//! Validate -> Lock -> Read -> Plan -> Apply -> Verify
//! ```
//!
//! - [`ordering`] - `OrderingEngine`, the operations themselves
//! - [`ranking`] - Pure rank planning (shift and compaction rules)
//! - [`lock`] - Per-sibling-group locks
//! - [`command`] - Serializable command objects
//! - [`errors`] - `EngineError`
//!
//! # Invariants
//!
//! - The engine holds no authoritative state between calls
//! - Every operation writes through a single atomic batch
//! - Mutations of one sibling group are serialized

pub mod command;
pub mod errors;
pub mod lock;
pub mod ordering;
pub mod ranking;

pub use command::{Command, CommandOutput};
pub use errors::EngineError;
pub use lock::{GroupKey, SiblingLocks};
pub use ordering::OrderingEngine;
