//! Render orchestration: [`ExtractionResult`] → one Markdown document.
//!
//! ```text
//! select_content ───────────────────────────────┐
//!                                               ├─▶ text + tables ─▶ sentinel?
//! tables ─▶ recover_structure ─▶ render_table ──┘
//! ```
//!
//! A pure function of its input: no I/O, no shared state, no failure
//! modes. The tables section is appended after whatever text was selected,
//! including none, as long as at least one table produced a block.

use crate::config::RenderOptions;
use crate::output::{ExtractionResult, Table};
use crate::pipeline::recover::recover_structure;
use crate::pipeline::select::{select_content, ContentSource};
use crate::pipeline::table::{render_prerendered, render_table};
use tracing::debug;

/// Returned when a result has no renderable content at all.
pub const NO_CONTENT: &str = "No content available in the response.";

/// Heading that opens the tables section.
pub const TABLES_HEADING: &str = "## Extracted Tables";

/// A rendered document plus what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Never empty.
    pub markdown: String,
    pub source: ContentSource,
    pub tables_total: usize,
    pub tables_rendered: usize,
}

/// Render with default options.
pub fn render(result: &ExtractionResult) -> String {
    render_with(result, &RenderOptions::default()).markdown
}

/// Render with explicit options.
pub fn render_with(result: &ExtractionResult, options: &RenderOptions) -> Rendered {
    let selection = select_content(result);
    let tables = result.tables.as_deref().unwrap_or_default();
    let (tables_md, tables_rendered) = render_tables(tables, options);

    let mut markdown = selection.text;
    markdown.push_str(&tables_md);

    debug!(
        "Rendered document: source={}, tables {}/{}, {} bytes",
        selection.source,
        tables_rendered,
        tables.len(),
        markdown.len()
    );

    if markdown.trim().is_empty() {
        markdown = NO_CONTENT.to_string();
    }

    Rendered {
        markdown,
        source: selection.source,
        tables_total: tables.len(),
        tables_rendered,
    }
}

/// Render every table and wrap the blocks in the tables section.
///
/// Returns the section (empty when no table produced output) and the
/// number of tables rendered. Indexes are 1-based positions in `tables`,
/// so skipped tables leave gaps in the numbering.
pub fn render_tables(tables: &[Table], options: &RenderOptions) -> (String, usize) {
    let blocks: Vec<String> = tables
        .iter()
        .enumerate()
        .filter_map(|(i, table)| render_one(table, i + 1, options))
        .collect();

    if blocks.is_empty() {
        return (String::new(), 0);
    }

    let mut out = format!("\n\n{TABLES_HEADING}\n\n");
    for block in &blocks {
        out.push_str(block);
    }
    (out, blocks.len())
}

fn render_one(table: &Table, index: usize, options: &RenderOptions) -> Option<String> {
    let rows = recover_structure(table.rows());
    render_table(&rows, index, options).or_else(|| {
        table
            .content
            .as_deref()
            .and_then(|content| render_prerendered(content, index))
    })
}
