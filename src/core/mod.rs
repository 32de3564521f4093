//! core
//!
//! Core domain types, the forest model, verification, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: NodeId, NodeKind, Rank, NodeRef, etc.
//! - [`forest`] - Nodes, edges, and read-only forest snapshots
//! - [`verify`] - Rank contiguity and structural checks
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - All verification is deterministic

pub mod config;
pub mod forest;
pub mod types;
pub mod verify;
