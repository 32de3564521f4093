//! export::escape
//!
//! Escaping user text for an output format.
//!
//! The linearizer escapes every title before it goes into a block, so
//! renderers can embed block text verbatim.

/// Escapes text for embedding in a document format.
pub trait TextEscaper: Send + Sync {
    /// Escape one line of text (no line breaks).
    fn escape(&self, text: &str) -> String;
}

/// RTF escaping.
///
/// `\`, `{` and `}` are backslash-escaped, tabs become `\tab`, other
/// control characters are dropped, and every non-ASCII character is written
/// as `\uN?` with `N` the signed 16-bit value of each UTF-16 code unit, so
/// the output is 7-bit clean.
///
/// # Example
///
/// ```
/// use outliner::export::escape::{RtfEscaper, TextEscaper};
///
/// assert_eq!(RtfEscaper.escape(r"a{b}\c"), r"a\{b\}\\c");
/// assert_eq!(RtfEscaper.escape("é"), r"\u233?");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfEscaper;

impl TextEscaper for RtfEscaper {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\\' => out.push_str(r"\\"),
                '{' => out.push_str(r"\{"),
                '}' => out.push_str(r"\}"),
                '\t' => out.push_str(r"\tab "),
                c if c.is_ascii_control() => {}
                c if c.is_ascii() => out.push(c),
                c => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        out.push_str(&format!(r"\u{}?", *unit as i16));
                    }
                }
            }
        }
        out
    }
}

/// No escaping; for plain-text output and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEscaper;

impl TextEscaper for PlainEscaper {
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }
}
