//! store
//!
//! Abstraction over the backing graph store.
//!
//! # Architecture
//!
//! The store is the sole owner of durable node and edge state. The ordering
//! engine talks to it only through the [`GraphStore`] trait, so a real
//! graph database adapter can replace [`MemoryStore`] without touching the
//! engine.
//!
//! # Modules
//!
//! - [`traits`] - `GraphStore` trait, write batches, and error types
//! - [`memory`] - In-memory implementation with fault injection

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{
    ChildEntry, GraphStore, RankUpdate, StoreError, WriteBatch, WriteOp, WriteReceipt,
};
