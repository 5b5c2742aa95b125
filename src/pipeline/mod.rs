//! Pipeline stages for extraction-result-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step. Only
//! [`input`] and [`extract`] do I/O; everything from [`select`] onwards is
//! a pure function of the decoded result.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ select ─────────────────────────────┐
//! (path/URL) (HTTP)       │                                  ├─▶ render ──▶ html
//!                         └─ tables ─▶ recover ─▶ cell ─▶ table ┘
//! ```
//!
//! 1. [`input`]    validate the user-supplied path or URL and read the upload
//! 2. [`extract`]  speak the configured protocol to the extraction service
//! 3. [`select`]   choose one text representation of the document
//! 4. [`recover`]  repair tables whose first row swallowed the whole table
//! 5. [`cell`]     normalise cell text
//! 6. [`table`]    emit GFM pipe tables
//! 7. [`render`]   stitch text and tables together, apply the sentinel
//! 8. [`html`]     optional Markdown → HTML for display

pub mod cell;
pub mod extract;
pub mod html;
pub mod input;
pub mod recover;
pub mod render;
pub mod select;
pub mod table;
