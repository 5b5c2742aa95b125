//! Table rendering: one (repaired) row sequence → one GFM pipe-table block.
//!
//! ```text
//! ### Table 2
//!
//! | Field | Value |
//! | --- | --- |
//! | Name | Alice |
//! ```
//!
//! The first row is the header. Short rows are padded with empty cells.
//! Rows wider than the header are never truncated: the header is extended
//! with `Column {i}` placeholders (1-based column position) up to the widest
//! row instead, so no extracted cell is lost.

use crate::config::RenderOptions;
use crate::output::{Cell, Row};
use crate::pipeline::cell::{clean_cell, escape_pipes};

/// Render one table as a Markdown block, or `None` when the table has no
/// columns at all (no rows, or only empty rows).
///
/// `index` is the table's 1-based position among all tables in the result.
pub fn render_table(rows: &[Row], index: usize, options: &RenderOptions) -> Option<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let (first, data) = rows.split_first()?;
    let headers = build_headers(first, width, options);

    let mut out = format!("### Table {index}\n\n");
    push_row(&mut out, &headers);
    push_row(&mut out, &vec!["---".to_string(); headers.len()]);
    for row in data {
        let mut cells: Vec<String> = row.iter().map(|c| cell_text(c, options)).collect();
        cells.resize(headers.len(), String::new());
        push_row(&mut out, &cells);
    }
    out.push_str("\n\n");
    Some(out)
}

/// Render a table the service already delivered as Markdown.
pub fn render_prerendered(content: &str, index: usize) -> Option<String> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    Some(format!("### Table {index}\n\n{content}\n\n"))
}

/// Cleaned header cells, extended with `Column {i}` up to `width`.
///
/// An empty first row yields placeholders for every column.
fn build_headers(first: &[Cell], width: usize, options: &RenderOptions) -> Vec<String> {
    let mut headers: Vec<String> = first.iter().map(|c| cell_text(c, options)).collect();
    for i in headers.len()..width {
        headers.push(format!("Column {}", i + 1));
    }
    headers
}

fn cell_text(cell: &Cell, options: &RenderOptions) -> String {
    let cleaned = clean_cell(cell);
    if options.escape_pipes {
        escape_pipes(&cleaned)
    } else {
        cleaned
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push_str("| ");
    out.push_str(&cells.join(" | "));
    out.push_str(" |\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    fn opts() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn renders_basic_table() {
        let rows = vec![row(&["Name", "Age"]), row(&["Alice", "30"])];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert_eq!(
            md,
            "### Table 1\n\n| Name | Age |\n| --- | --- |\n| Alice | 30 |\n\n\n"
        );
    }

    #[test]
    fn header_only_table() {
        let rows = vec![row(&["A", "B"])];
        let md = render_table(&rows, 3, &opts()).unwrap();
        assert_eq!(md, "### Table 3\n\n| A | B |\n| --- | --- |\n\n\n");
    }

    #[test]
    fn empty_table_is_skipped() {
        assert_eq!(render_table(&[], 1, &opts()), None);
        assert_eq!(render_table(&[row(&[]), row(&[])], 1, &opts()), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let rows = vec![row(&["A", "B", "C"]), row(&["1"])];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert!(md.contains("| 1 |  |  |\n"), "got: {md}");
    }

    #[test]
    fn wide_rows_extend_the_header() {
        let rows = vec![row(&["A", "B"]), row(&["1", "2", "3", "4"])];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert!(md.contains("| A | B | Column 3 | Column 4 |\n"), "got: {md}");
        assert!(md.contains("| --- | --- | --- | --- |\n"));
        assert!(md.contains("| 1 | 2 | 3 | 4 |\n"));
    }

    #[test]
    fn empty_first_row_gets_placeholder_headers() {
        let rows = vec![row(&[]), row(&["k1", "v1"]), row(&["k2", "v2", "extra"])];
        let md = render_table(&rows, 2, &opts()).unwrap();
        assert!(md.starts_with("### Table 2\n\n| Column 1 | Column 2 | Column 3 |\n"));
        assert!(md.contains("| k1 | v1 |  |\n"));
        assert!(md.contains("| k2 | v2 | extra |\n"));
    }

    #[test]
    fn cells_are_cleaned() {
        let rows = vec![row(&["Item\r\nName", "Qty"]), row(&["  Widget\t A ", "2"])];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert!(md.contains("| Item Name | Qty |"));
        assert!(md.contains("| Widget A | 2 |"));
    }

    #[test]
    fn null_cells_render_empty() {
        let rows = vec![row(&["A", "B"]), vec![Cell::Null, Cell::from("x")]];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert!(md.contains("|  | x |\n"));
    }

    #[test]
    fn pipes_escaped_by_default() {
        let rows = vec![row(&["A|B"]), row(&["x | y"])];
        let md = render_table(&rows, 1, &opts()).unwrap();
        assert!(md.contains("| A\\|B |"));
        assert!(md.contains("| x \\| y |"));
    }

    #[test]
    fn pipes_kept_when_escaping_disabled() {
        let rows = vec![row(&["A"]), row(&["x | y"])];
        let md = render_table(&rows, 1, &RenderOptions { escape_pipes: false }).unwrap();
        assert!(md.contains("| x | y |"));
    }

    #[test]
    fn prerendered_content() {
        assert_eq!(
            render_prerendered("\n| a |\n| --- |\n", 4).unwrap(),
            "### Table 4\n\n| a |\n| --- |\n\n"
        );
        assert_eq!(render_prerendered("  \n ", 1), None);
    }
}
