//! Cell cleaning: normalise one table cell for a single-line pipe-table slot.
//!
//! Extractors emit cell text with embedded carriage returns, hard line
//! breaks and runs of spaces left over from the page layout. A pipe-table
//! row must fit on one line, so all whitespace is collapsed to single
//! spaces. Non-whitespace text is never touched.
//!
//! Pipe characters are *not* escaped here; that is a separate, optional
//! step ([`escape_pipes`]) applied by the table renderer.

use crate::output::Cell;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_CARRIAGE_RETURNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r+").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean a cell: null becomes `""`, everything else its textual form with
/// carriage-return runs and then all whitespace runs collapsed to one
/// space, trimmed.
pub fn clean_cell(cell: &Cell) -> String {
    clean_text(&cell.text())
}

/// [`clean_cell`] for text that is already a string.
pub fn clean_text(text: &str) -> String {
    let s = RE_CARRIAGE_RETURNS.replace_all(text, " ");
    let s = RE_WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Escape every unescaped `|` as `\|`.
///
/// A pipe that is already preceded by a backslash is left alone so that
/// escaping twice is harmless.
pub fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut backslashes = 0usize;
    for c in text.chars() {
        if c == '|' && backslashes % 2 == 0 {
            out.push('\\');
        }
        if c == '\\' {
            backslashes += 1;
        } else {
            backslashes = 0;
        }
        out.push(c);
    }
    out
}
