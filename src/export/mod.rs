//! export
//!
//! Turning an outline snapshot into a document.
//!
//! # Pipeline
//!
//! ```text
//! ForestSnapshot + Numbering -> linearize -> [Block] -> rtf::render -> String
//! ```
//!
//! - [`linearize`] - Depth-first flattening into format-neutral blocks
//! - [`escape`] - Per-format text escaping, applied while linearizing
//! - [`rtf`] - RTF rendering, file naming and saving
//!
//! # Invariants
//!
//! - Read-only over the snapshot; never touches the store
//! - A block's label always agrees with its position in the output

pub mod escape;
pub mod linearize;
pub mod rtf;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::NodeId;

pub use escape::{PlainEscaper, RtfEscaper, TextEscaper};
pub use linearize::{linearize, linearize_with, Align, Block, Emphasis, StyleHints, TextSize};

/// Errors from exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Export was requested for a node that is not an outline root.
    #[error("node {0} is not an outline root")]
    NotARoot(NodeId),

    /// Writing the output failed.
    #[error("failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
