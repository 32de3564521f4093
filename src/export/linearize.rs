//! export::linearize
//!
//! Depth-first flattening of an outline into formatted blocks.
//!
//! # Traversal
//!
//! Pre-order from the root over `Contains` edges, visiting children in
//! [`ForestSnapshot::ordered_children`] order, the order numbering uses.
//! Leaves additionally pull in the citations they `Cites`, right after
//! themselves. Every visited node yields exactly one [`Block`].
//!
//! # Indentation
//!
//! | Kind | Level |
//! |------|-------|
//! | Root | 0 |
//! | Branch at depth d | d - 1 |
//! | Leaf | parent + 1 |
//! | Citation | citing leaf + 1 |
//! | anything else | depth - 1 |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::escape::{RtfEscaper, TextEscaper};
use crate::core::config::ExportSettings;
use crate::core::forest::{ForestSnapshot, Node};
use crate::core::types::{NodeId, NodeKind, NodeRef};
use crate::numbering::Numbering;

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

/// Font emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
}

/// Relative text size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    Title,
    Body,
    Small,
}

/// Format-neutral styling for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleHints {
    pub align: Align,
    /// Emphasis of the whole block.
    pub emphasis: Emphasis,
    /// Extra emphasis on the label only.
    pub label_emphasis: Emphasis,
    pub size: TextSize,
    /// Wrapped lines align under the text, not the label.
    pub hanging_indent: bool,
}

impl StyleHints {
    fn root() -> Self {
        Self {
            align: Align::Center,
            emphasis: Emphasis::Bold,
            label_emphasis: Emphasis::Plain,
            size: TextSize::Title,
            hanging_indent: false,
        }
    }

    fn section() -> Self {
        Self {
            align: Align::Left,
            emphasis: Emphasis::Bold,
            label_emphasis: Emphasis::Plain,
            size: TextSize::Body,
            hanging_indent: true,
        }
    }

    fn body(label_emphasis: Emphasis) -> Self {
        Self {
            align: Align::Left,
            emphasis: Emphasis::Plain,
            label_emphasis,
            size: TextSize::Body,
            hanging_indent: false,
        }
    }

    fn fallback() -> Self {
        Self {
            align: Align::Left,
            emphasis: Emphasis::Italic,
            label_emphasis: Emphasis::Plain,
            size: TextSize::Small,
            hanging_indent: false,
        }
    }
}

/// One formatted paragraph group of the output document.
///
/// `label` and `lines` are already escaped for the target format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub node: NodeRef,
    /// Prefix such as `1.2.`, `Paragraph 3:` or `Reference 1:`.
    pub label: Option<String>,
    /// One entry per paragraph; never empty.
    pub lines: Vec<String>,
    pub indent_level: u32,
    pub style: StyleHints,
}

/// Linearize with default labels and RTF escaping.
///
/// # Example
///
/// ```
/// use outliner::core::forest::{Edge, ForestSnapshot, Node};
/// use outliner::core::types::{NodeKind, Rank};
/// use outliner::export::linearize;
/// use outliner::numbering::compute_numbers;
///
/// let root = Node::new(NodeKind::Root, "Thesis");
/// let intro = Node::new(NodeKind::Branch, "Intro {draft}").with_rank(Rank::FIRST);
/// let snapshot = ForestSnapshot::new(
///     vec![root.clone(), intro.clone()],
///     vec![Edge::contains(root.id, intro.id)],
/// );
///
/// let blocks = linearize(&snapshot, &compute_numbers(&snapshot));
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[1].label.as_deref(), Some("1."));
/// assert_eq!(blocks[1].lines, vec![r"Intro \{draft\}".to_string()]);
/// ```
pub fn linearize(snapshot: &ForestSnapshot, numbering: &Numbering) -> Vec<Block> {
    linearize_with(snapshot, numbering, &ExportSettings::default(), &RtfEscaper)
}

/// Linearize with explicit label words and escaper.
pub fn linearize_with(
    snapshot: &ForestSnapshot,
    numbering: &Numbering,
    settings: &ExportSettings,
    escaper: &dyn TextEscaper,
) -> Vec<Block> {
    let Some(root) = snapshot.root() else {
        return Vec::new();
    };

    let walker = Walker {
        snapshot,
        numbering,
        settings,
        escaper,
    };
    walker.walk(root)
}

/// A pending visit.
struct Visit<'a> {
    node: &'a Node,
    depth: u32,
    parent_level: u32,
    /// Position among a leaf's citations; `None` for `Contains` visits.
    citation_ordinal: Option<usize>,
}

struct Walker<'a> {
    snapshot: &'a ForestSnapshot,
    numbering: &'a Numbering,
    settings: &'a ExportSettings,
    escaper: &'a dyn TextEscaper,
}

impl<'a> Walker<'a> {
    fn walk(&self, root: &'a Node) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![Visit {
            node: root,
            depth: 0,
            parent_level: 0,
            citation_ordinal: None,
        }];

        while let Some(visit) = stack.pop() {
            // Citations are terminal and may appear under several leaves.
            if visit.citation_ordinal.is_none() && !visited.insert(visit.node.id) {
                continue;
            }

            let block = self.block_for(&visit, root.id);
            let level = block.indent_level;
            blocks.push(block);
            if visit.citation_ordinal.is_some() {
                continue;
            }

            let mut next = Vec::new();
            if visit.node.kind == NodeKind::Leaf {
                for (index, cited) in self.snapshot.cited(&visit.node.id).into_iter().enumerate() {
                    next.push(Visit {
                        node: cited,
                        depth: visit.depth + 1,
                        parent_level: level,
                        citation_ordinal: Some(index + 1),
                    });
                }
            }
            for child in self.snapshot.ordered_children(&visit.node.id) {
                next.push(Visit {
                    node: child,
                    depth: visit.depth + 1,
                    parent_level: level,
                    citation_ordinal: None,
                });
            }
            stack.extend(next.into_iter().rev());
        }
        blocks
    }

    fn block_for(&self, visit: &Visit<'_>, root: NodeId) -> Block {
        let node = visit.node;
        let fallback_level = visit.depth.saturating_sub(1);

        match (node.kind, visit.citation_ordinal) {
            (NodeKind::Root, None) if node.id == root => Block {
                node: node.node_ref(),
                label: None,
                lines: vec![self.escaper.escape(&node.title)],
                indent_level: 0,
                style: StyleHints::root(),
            },
            (NodeKind::Branch, None) => Block {
                node: node.node_ref(),
                label: self.numbering.get(&node.id).cloned(),
                lines: vec![self.escaper.escape(&node.title)],
                indent_level: fallback_level,
                style: StyleHints::section(),
            },
            (NodeKind::Leaf, None) => {
                let ordinal = node.rank.map_or(1, |r| r.get() as usize);
                Block {
                    node: node.node_ref(),
                    label: Some(self.label(&self.settings.leaf_label, ordinal)),
                    lines: self.body_lines(&node.title),
                    indent_level: visit.parent_level + 1,
                    style: StyleHints::body(Emphasis::Bold),
                }
            }
            (NodeKind::Citation, Some(position)) => {
                let ordinal = node.rank.map_or(position, |r| r.get() as usize);
                let mut lines = self.body_lines(&node.title);
                if let Some(doc) = self.snapshot.source_document(&node.id) {
                    let annotation = format!(
                        " ({}: {})",
                        self.escaper.escape(&self.settings.annotation_prefix),
                        self.escaper.escape(&doc.title)
                    );
                    if let Some(last) = lines.last_mut() {
                        last.push_str(&annotation);
                    }
                }
                Block {
                    node: node.node_ref(),
                    label: Some(self.label(&self.settings.citation_label, ordinal)),
                    lines,
                    indent_level: visit.parent_level + 1,
                    style: StyleHints::body(Emphasis::Italic),
                }
            }
            _ => {
                let title = if node.title.is_empty() {
                    node.id.to_string()
                } else {
                    node.title.clone()
                };
                Block {
                    node: node.node_ref(),
                    label: None,
                    lines: vec![format!(
                        "({}: {})",
                        self.escaper.escape(node.kind.display_name()),
                        self.escaper.escape(&title)
                    )],
                    indent_level: fallback_level,
                    style: StyleHints::fallback(),
                }
            }
        }
    }

    fn label(&self, word: &str, ordinal: usize) -> String {
        self.escaper.escape(&format!("{word} {ordinal}:"))
    }

    /// Split on line breaks; each line becomes its own paragraph.
    fn body_lines(&self, text: &str) -> Vec<String> {
        text.split('\n')
            .map(|line| self.escaper.escape(line.strip_suffix('\r').unwrap_or(line)))
            .collect()
    }
}
