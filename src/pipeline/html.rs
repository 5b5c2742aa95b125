//! Markdown → HTML for display.
//!
//! A thin wrapper over `pulldown-cmark` with GFM tables enabled, since the
//! rendered documents rely on pipe tables. No templating happens here; the
//! output is an HTML fragment for the caller to embed.

use pulldown_cmark::{html, Options, Parser};

/// Convert CommonMark (with tables and strikethrough) to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_paragraphs() {
        let html = markdown_to_html("# Title\n\nBody");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn pipe_tables_become_html_tables() {
        let html = markdown_to_html("| Name | Age |\n| --- | --- |\n| Alice | 30 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Name</th>"));
        assert!(html.contains("<td>Alice</td>"));
    }

    #[test]
    fn escaped_pipe_stays_in_one_cell() {
        let html = markdown_to_html("| A | B |\n| --- | --- |\n| x \\| y | z |\n");
        assert_eq!(html.matches("<td>").count(), 2, "got: {html}");
        assert!(html.contains("x | y"));
    }

    #[test]
    fn raw_text_is_escaped() {
        let html = markdown_to_html("a < b & c");
        assert!(html.contains("a &lt; b &amp; c"));
    }
}
