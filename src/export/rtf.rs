//! export::rtf
//!
//! RTF rendering of linearized blocks.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::linearize::{Align, Block, Emphasis, TextSize};
use super::ExportError;
use crate::core::config::ExportSettings;
use crate::core::types::NodeId;

const PARAGRAPH: &str = r"\pard\sa200\sl276\slmult1\f0";

/// Render blocks as a complete RTF document.
///
/// Block text must already be RTF-escaped; it is embedded verbatim.
pub fn render(blocks: &[Block], settings: &ExportSettings) -> String {
    let mut lines = vec![
        r"{\rtf1\ansi\deff0\nouicompat".to_string(),
        format!(r"{{\fonttbl{{\f0\fnil\fcharset0 {};}}}}", settings.font),
        r"{\colortbl ;\red0\green0\blue0;}".to_string(),
        format!(r"{PARAGRAPH}\fs{}", settings.body_size),
    ];
    lines.extend(blocks.iter().map(|block| paragraph(block, settings)));
    lines.push("}".to_string());
    lines.join("\r\n")
}

/// Paragraph control words for a block, ending with the separating space.
fn formatting(block: &Block, settings: &ExportSettings) -> String {
    let mut fmt = String::from(PARAGRAPH);
    match block.style.align {
        Align::Center => fmt.push_str(r"\qc"),
        Align::Left => {
            let indent = block.indent_level.saturating_mul(settings.indent_twips);
            fmt.push_str(&format!(r"\li{indent}"));
        }
    }
    if block.style.hanging_indent {
        fmt.push_str(&format!(r"\fi-{}", settings.hanging_twips));
    }
    let size = match block.style.size {
        TextSize::Title => settings.title_size,
        TextSize::Body => settings.body_size,
        TextSize::Small => settings.fallback_size,
    };
    fmt.push_str(&format!(r"\fs{size}"));
    match block.style.emphasis {
        Emphasis::Bold => fmt.push_str(r"\b"),
        Emphasis::Italic => fmt.push_str(r"\i"),
        Emphasis::Plain => {}
    }
    fmt.push(' ');
    fmt
}

fn paragraph(block: &Block, settings: &ExportSettings) -> String {
    let fmt = formatting(block, settings);
    let label = match (&block.label, block.style.label_emphasis) {
        (None, _) => String::new(),
        (Some(label), Emphasis::Bold) => format!(r"{{\b {label} }}"),
        (Some(label), Emphasis::Italic) => format!(r"{{\i {label} }}"),
        (Some(label), Emphasis::Plain) => format!("{label} "),
    };
    let separator = format!("\\par\r\n{fmt}");
    format!("{fmt}{label}{}\\par", block.lines.join(&separator))
}

/// Export file name for an outline.
///
/// Uses the root title, or the root id when the title is blank. Anything
/// outside `[a-z0-9_.-]` becomes `_` and the result is lowercased.
///
/// # Example
///
/// ```
/// use outliner::core::types::NodeId;
/// use outliner::export::rtf::file_name;
///
/// let id = NodeId::generate();
/// assert_eq!(file_name("My Thesis: Draft", &id), "export-my_thesis__draft.rtf");
/// ```
pub fn file_name(title: &str, root: &NodeId) -> String {
    let base = if title.trim().is_empty() {
        root.to_string()
    } else {
        title.to_string()
    };
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("export-{sanitized}.rtf")
}

/// Write an exported document into `dir`, atomically.
///
/// The content goes to a temporary sibling first and is renamed into place,
/// so readers never see a partial file.
pub fn save(dir: &Path, name: &str, content: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(name);
    let temp = dir.join(format!("{name}.tmp"));
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut file = fs::File::create(&temp).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    fs::rename(&temp, &path).map_err(io_err)?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NodeRef;
    use crate::export::linearize::StyleHints;

    fn block(label: Option<&str>, lines: &[&str], level: u32, style: StyleHints) -> Block {
        Block {
            node: NodeRef::Leaf(NodeId::generate()),
            label: label.map(str::to_string),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            indent_level: level,
            style,
        }
    }

    fn style(align: Align, emphasis: Emphasis, label: Emphasis, size: TextSize, hang: bool) -> StyleHints {
        StyleHints {
            align,
            emphasis,
            label_emphasis: label,
            size,
            hanging_indent: hang,
        }
    }

    #[test]
    fn empty_document_has_header_and_close() {
        let out = render(&[], &ExportSettings::default());
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(
            lines,
            vec![
                r"{\rtf1\ansi\deff0\nouicompat",
                r"{\fonttbl{\f0\fnil\fcharset0 Arial;}}",
                r"{\colortbl ;\red0\green0\blue0;}",
                r"\pard\sa200\sl276\slmult1\f0\fs24",
                "}",
            ]
        );
    }

    #[test]
    fn title_block_centered() {
        let b = block(
            None,
            &["Thesis"],
            0,
            style(Align::Center, Emphasis::Bold, Emphasis::Plain, TextSize::Title, false),
        );
        assert_eq!(
            paragraph(&b, &ExportSettings::default()),
            r"\pard\sa200\sl276\slmult1\f0\qc\fs32\b Thesis\par"
        );
    }

    #[test]
    fn section_block_hanging_indent() {
        let b = block(
            Some("1.2."),
            &["Scope"],
            1,
            style(Align::Left, Emphasis::Bold, Emphasis::Plain, TextSize::Body, true),
        );
        assert_eq!(
            paragraph(&b, &ExportSettings::default()),
            r"\pard\sa200\sl276\slmult1\f0\li720\fi-360\fs24\b 1.2. Scope\par"
        );
    }

    #[test]
    fn huge_indent_saturates() {
        let settings = ExportSettings {
            indent_twips: u32::MAX,
            ..ExportSettings::default()
        };
        let b = block(
            None,
            &["Deep"],
            40,
            style(Align::Left, Emphasis::Plain, Emphasis::Plain, TextSize::Body, false),
        );
        assert!(paragraph(&b, &settings).contains(&format!(r"\li{}\fs24", u32::MAX)));
    }

    #[test]
    fn multi_line_citation_repeats_formatting() {
        let b = block(
            Some("Reference 1:"),
            &["a", "b (Paper: X)"],
            2,
            style(Align::Left, Emphasis::Plain, Emphasis::Italic, TextSize::Body, false),
        );
        let fmt = r"\pard\sa200\sl276\slmult1\f0\li1440\fs24 ";
        assert_eq!(
            paragraph(&b, &ExportSettings::default()),
            format!("{fmt}{{\\i Reference 1: }}a\\par\r\n{fmt}b (Paper: X)\\par")
        );
    }

    #[test]
    fn settings_drive_font_and_sizes() {
        let settings = ExportSettings {
            font: "Times New Roman".to_string(),
            body_size: 22,
            fallback_size: 18,
            ..ExportSettings::default()
        };
        let b = block(
            None,
            &["(ExternalDoc: x)"],
            0,
            style(Align::Left, Emphasis::Italic, Emphasis::Plain, TextSize::Small, false),
        );
        let out = render(&[b], &settings);
        assert!(out.contains(r"\fcharset0 Times New Roman;"));
        assert!(out.contains(r"\li0\fs18\i (ExternalDoc: x)\par"));
        assert!(out.ends_with("\r\n}"));
    }

    #[test]
    fn file_name_falls_back_to_id() {
        let id = NodeId::generate();
        assert_eq!(file_name("  ", &id), format!("export-{id}.rtf"));
        assert_eq!(file_name("Ünï v1.0", &id), "export-_n__v1.0.rtf");
    }

    #[test]
    fn save_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(dir.path(), "export-x.rtf", "{\\rtf1}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\\rtf1}");
        assert!(!dir.path().join("export-x.rtf.tmp").exists());
    }
}
