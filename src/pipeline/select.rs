//! Content selection: pick the single best text representation.
//!
//! The service can describe the same document several ways. Exactly one
//! is used, in strict priority order, and never merged:
//!
//! | Priority | Source | Per-chunk output |
//! |----------|--------|------------------|
//! | 1 | `markdown` | the field verbatim |
//! | 2 | `chunking.semantic` | `{content}\n\n` |
//! | 3 | `chunking.recursive` | `{content}\n\n` |
//! | 4 | `chunking.page` | `## Page {page_number}\n\n{content}\n\n` |
//! | 5 | `chunking.header` | `### {header}\n\n{content}\n\n` |
//!
//! A chunk with missing or empty `content` contributes nothing. A method
//! whose chunks contribute nothing counts as empty, and selection moves on
//! to the next one.

use crate::output::{Chunk, ExtractionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heading used for header chunks that carry no `header`.
pub const DEFAULT_SECTION_HEADER: &str = "Section";

/// Which representation [`select_content`] used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Markdown,
    Semantic,
    Recursive,
    Page,
    Header,
    /// Nothing usable was found.
    #[default]
    None,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Markdown => "markdown",
            ContentSource::Semantic => "semantic",
            ContentSource::Recursive => "recursive",
            ContentSource::Page => "page",
            ContentSource::Header => "header",
            ContentSource::None => "none",
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selected text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub source: ContentSource,
    pub text: String,
}

/// Choose the text of the document. Returns an empty selection
/// ([`ContentSource::None`]) when no representation has content.
pub fn select_content(result: &ExtractionResult) -> Selection {
    if let Some(markdown) = result.markdown.as_deref().filter(|m| !m.is_empty()) {
        return Selection {
            source: ContentSource::Markdown,
            text: markdown.to_string(),
        };
    }

    let Some(chunking) = result.chunking.as_ref() else {
        return Selection::default();
    };

    let candidates = [
        (ContentSource::Semantic, chunking.semantic.as_deref()),
        (ContentSource::Recursive, chunking.recursive.as_deref()),
        (ContentSource::Page, chunking.page.as_deref()),
        (ContentSource::Header, chunking.header.as_deref()),
    ];

    for (source, chunks) in candidates {
        let Some(chunks) = chunks else { continue };
        let text = join_chunks(source, chunks);
        if !text.is_empty() {
            return Selection { source, text };
        }
    }

    Selection::default()
}

fn join_chunks(source: ContentSource, chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        let Some(content) = chunk.content.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        match source {
            ContentSource::Page => {
                let page = chunk
                    .page_number
                    .as_ref()
                    .map(|p| p.text().into_owned())
                    .unwrap_or_default();
                out.push_str(&format!("## Page {page}\n\n{content}\n\n"));
            }
            ContentSource::Header => {
                let header = chunk.header.as_deref().unwrap_or(DEFAULT_SECTION_HEADER);
                out.push_str(&format!("### {header}\n\n{content}\n\n"));
            }
            _ => {
                out.push_str(content);
                out.push_str("\n\n");
            }
        }
    }
    out
}
