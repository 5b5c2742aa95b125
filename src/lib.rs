//! # extract2md
//!
//! Turn document-extraction results into clean, readable Markdown.
//!
//! A hosted extraction service reads PDFs, office documents and images and
//! answers with a loosely structured JSON record: sometimes a ready-made
//! `markdown` field, sometimes only chunked text, usually a list of tables
//! as raw cell grids. Those tables are frequently malformed (a whole table
//! collapsed into one header cell, ragged rows, stray carriage returns).
//! This crate fetches that record and renders one Markdown document from
//! it, repairing the tables on the way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / URL
//!  │
//!  ├─ 1. Input    validate extension and size, read the upload
//!  ├─ 2. Extract  sample | convert | convert-then-extract against the service
//!  ├─ 3. Select   markdown > semantic > recursive > page > header chunks
//!  ├─ 4. Tables   recover structure, clean cells, emit pipe tables
//!  ├─ 5. Render   text + "## Extracted Tables", or the no-content sentinel
//!  └─ 6. HTML     optional CommonMark rendering for display
//! ```
//!
//! Steps 3 to 5 are pure and infallible; use [`render`] directly if you
//! already hold an extraction result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extract2md::{convert, ExtractConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from EXTRACT2MD_API_KEY
//!     let config = ExtractConfig::from_env().build()?;
//!     let output = convert("purchase-order.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("tables: {}/{}", output.stats.tables_rendered, output.stats.tables_total);
//!     Ok(())
//! }
//! ```
//!
//! Rendering a result you already have:
//!
//! ```rust
//! use extract2md::{render, ExtractionResult};
//!
//! let result = ExtractionResult::from_json(
//!     r#"{"tables": [{"data": [["Name", "Age"], ["Alice", 30]]}]}"#,
//! ).unwrap();
//! let md = render(&result);
//! assert!(md.contains("| Name | Age |\n| --- | --- |\n| Alice | 30 |"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `extract2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! extract2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sample;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChunkingMethod, ExtractConfig, ExtractConfigBuilder, ExtractionMode, OutputFormat,
    RenderOptions,
};
pub use convert::{convert, convert_sync, convert_to_file, format_output, render_file, write_output};
pub use error::{DocumentError, Extract2MdError};
pub use output::{
    Cell, Chunk, Chunking, ConversionOutput, ConversionStats, ExtractionResult, PlanInfo, Row,
    Table,
};
pub use pipeline::cell::clean_cell;
pub use pipeline::extract::ExtractionClient;
pub use pipeline::html::markdown_to_html;
pub use pipeline::recover::recover_structure;
pub use pipeline::render::{render, render_with, Rendered, NO_CONTENT};
pub use pipeline::select::{select_content, ContentSource};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, DocumentStream};
