//! Outliner - Ranked outline forests with numbering and document export
//!
//! Outliner maintains a typed, rooted forest of sections, paragraphs and
//! citations in a backing graph store. Siblings carry an explicit rank, and
//! two views are derived from the live structure: dotted display numbers
//! ("1.2.3.") and a linear, formatted document for export.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types, forest model, verification, and configuration
//! - [`store`] - The graph store interface and an in-memory implementation
//! - [`engine`] - Structural mutations: Validate → Lock → Read → Plan → Apply → Verify
//! - [`numbering`] - Pure snapshot → display number computation
//! - [`export`] - Pure snapshot → block linearization, escaping, and RTF output
//! - [`outline`] - Editing sessions tying commands, numbering and export together
//! - [`telemetry`] - Log subscriber setup for host applications
//!
//! # Correctness Invariants
//!
//! Outliner maintains the following invariants:
//!
//! 1. Ranks within every sibling group are exactly `1..=n`
//! 2. Every mutation is a single all-or-nothing store write
//! 3. Mutations of one sibling group never interleave
//! 4. Numbering and export visit children in the same order

pub mod core;
pub mod engine;
pub mod export;
pub mod numbering;
pub mod outline;
pub mod store;
pub mod telemetry;
