//! outline
//!
//! An editing session over one outline.
//!
//! [`Outline`] ties the pieces together: commands go to the
//! [`OrderingEngine`], numbering is recomputed from a fresh snapshot
//! afterwards, and only the labels that actually changed are reported back.
//! Export reads one snapshot and derives numbering and blocks from it, so
//! labels and positions always agree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{Config, ExportSettings};
use crate::core::forest::ForestSnapshot;
use crate::core::types::{NodeId, NodeKind};
use crate::engine::{Command, CommandOutput, EngineError, OrderingEngine};
use crate::export::{linearize_with, rtf, Block, ExportError, RtfEscaper};
use crate::numbering::{compute_numbers, diff_numbers, Numbering, NumberingDiff};

/// Errors from an outline session.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineUpdate {
    pub output: CommandOutput,
    /// Labels that changed; empty means nothing to write downstream.
    pub diff: NumberingDiff,
}

/// An outline rooted at one `Root` node.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use outliner::core::types::NodeKind;
/// use outliner::engine::{Command, OrderingEngine};
/// use outliner::outline::Outline;
/// use outliner::store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let engine = Arc::new(OrderingEngine::new(Arc::new(MemoryStore::new())));
/// let mut outline = Outline::create(engine, "Thesis").await.unwrap();
///
/// let update = outline
///     .apply(&Command::InsertChild {
///         parent: outline.root(),
///         kind: NodeKind::Branch,
///         title: "Intro".into(),
///     })
///     .await
///     .unwrap();
/// assert_eq!(update.diff.changed.len(), 1);
///
/// let (name, rtf) = outline.export_rtf().await.unwrap();
/// assert_eq!(name, "export-thesis.rtf");
/// assert!(rtf.contains("1. Intro"));
/// # });
/// ```
pub struct Outline {
    engine: Arc<OrderingEngine>,
    root: NodeId,
    numbering: Numbering,
    export: ExportSettings,
}

impl Outline {
    /// Open an existing outline.
    ///
    /// Fails with [`ExportError::NotARoot`] if `root` is not a `Root` node.
    pub async fn open(engine: Arc<OrderingEngine>, root: NodeId) -> Result<Self, OutlineError> {
        let snapshot = engine.snapshot(&root).await?;
        if snapshot.root().is_none() {
            return Err(ExportError::NotARoot(root).into());
        }
        let numbering = compute_numbers(&snapshot);
        debug!(%root, labels = numbering.len(), "opened outline");
        Ok(Self {
            engine,
            root,
            numbering,
            export: ExportSettings::default(),
        })
    }

    /// Create a new root node and open it.
    pub async fn create(engine: Arc<OrderingEngine>, title: &str) -> Result<Self, OutlineError> {
        let root = engine.create_node(NodeKind::Root, title).await?;
        info!(%root, "created outline");
        Self::open(engine, root).await
    }

    /// Use non-default export settings.
    pub fn with_export_settings(mut self, settings: ExportSettings) -> Self {
        self.export = settings;
        self
    }

    /// Use the `[export]` settings of a loaded config.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_export_settings(config.export_settings())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn engine(&self) -> &Arc<OrderingEngine> {
        &self.engine
    }

    /// Current display numbers.
    pub fn numbers(&self) -> &Numbering {
        &self.numbering
    }

    /// Run a command, then bring the numbering up to date.
    ///
    /// Commands that cannot change structure skip re-numbering and report
    /// an empty diff.
    pub async fn apply(&mut self, command: &Command) -> Result<OutlineUpdate, OutlineError> {
        let output = self.engine.execute(command).await?;
        let diff = if command.is_structural() {
            self.refresh().await?
        } else {
            NumberingDiff::default()
        };
        Ok(OutlineUpdate { output, diff })
    }

    /// Recompute numbering from the store.
    ///
    /// Also picks up changes made by other sessions.
    pub async fn refresh(&mut self) -> Result<NumberingDiff, OutlineError> {
        let snapshot = self.engine.snapshot(&self.root).await?;
        let fresh = compute_numbers(&snapshot);
        let diff = diff_numbers(&self.numbering, &fresh);
        if diff.is_empty() {
            debug!(root = %self.root, "numbering unchanged");
        } else {
            debug!(
                root = %self.root,
                changed = diff.changed.len(),
                removed = diff.removed.len(),
                "numbering changed"
            );
            diff.apply_to(&mut self.numbering);
        }
        Ok(diff)
    }

    /// Linearize the current state of the outline.
    pub async fn linearize(&self) -> Result<Vec<Block>, OutlineError> {
        let snapshot = self.engine.snapshot(&self.root).await?;
        Ok(self.blocks(&snapshot))
    }

    /// Render the outline as RTF, returning `(file_name, document)`.
    pub async fn export_rtf(&self) -> Result<(String, String), OutlineError> {
        let snapshot = self.engine.snapshot(&self.root).await?;
        let title = snapshot
            .root()
            .map(|n| n.title.clone())
            .ok_or(ExportError::NotARoot(self.root))?;
        let blocks = self.blocks(&snapshot);
        let document = rtf::render(&blocks, &self.export);
        info!(root = %self.root, blocks = blocks.len(), "rendered rtf");
        Ok((rtf::file_name(&title, &self.root), document))
    }

    /// Render and write the outline into `dir`.
    pub async fn save_rtf(&self, dir: &Path) -> Result<PathBuf, OutlineError> {
        let (name, document) = self.export_rtf().await?;
        Ok(rtf::save(dir, &name, &document)?)
    }

    /// Numbering and blocks from the same snapshot.
    fn blocks(&self, snapshot: &ForestSnapshot) -> Vec<Block> {
        let numbering = compute_numbers(snapshot);
        linearize_with(snapshot, &numbering, &self.export, &RtfEscaper)
    }
}
