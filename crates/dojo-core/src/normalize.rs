//! Snippet normalization
//!
//! Two canonical forms are used for comparison:
//! - loose: whitespace runs (including newlines, U+3000 and U+FEFF) fold to a
//!   single space
//! - strict: trailing comments are stripped per line, then all whitespace is removed
//!
//! Both functions are total and never panic.

/// Full-width (ideographic) space
pub const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Zero-width no-break space, as left behind by editors writing a BOM
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Ruby-style single-line comment marker
pub const DEFAULT_COMMENT_MARKER: &str = "#";

#[inline]
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == IDEOGRAPHIC_SPACE || c == BYTE_ORDER_MARK
}

/// Fold whitespace and trim
#[must_use]
pub fn normalize_loose(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_blank).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Strip `#` comments and remove all whitespace
#[must_use]
pub fn normalize_strict(text: &str) -> String {
    normalize_strict_with(text, DEFAULT_COMMENT_MARKER)
}

/// Strict normalization with an explicit comment marker
///
/// An empty marker disables comment stripping.
#[must_use]
pub fn normalize_strict_with(text: &str, comment_marker: &str) -> String {
    text.split(['\r', '\n'])
        .map(|line| strip_comment(line, comment_marker))
        .flat_map(str::chars)
        .filter(|c| !is_blank(*c))
        .collect()
}

fn strip_comment<'a>(line: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return line;
    }
    match line.find(marker) {
        Some(at) => &line[..at],
        None => line,
    }
}
