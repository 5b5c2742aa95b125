//! Progress-callback trait for per-document conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ExtractConfigBuilder::progress_callback`] to receive
//! events as [`crate::stream::convert_stream`] works through a batch of
//! documents.
//!
//! # Example
//!
//! ```rust
//! use extract2md::{ConversionProgressCallback, ExtractConfig, ExtractionMode};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, input: &str, markdown_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{done} {input}: {markdown_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ExtractConfig::builder()
//!     .mode(ExtractionMode::Sample)
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each document.
///
/// Implementations must be `Send + Sync`: documents are processed
/// concurrently, so `on_document_*` may be called from several tasks at
/// once. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is uploaded.
    fn on_document_start(&self, input: &str) {
        let _ = input;
    }

    /// Called when a document has been fetched and rendered.
    ///
    /// `markdown_len` is the byte length of the rendered Markdown.
    fn on_document_complete(&self, input: &str, markdown_len: usize) {
        let _ = (input, markdown_len);
    }

    /// Called when a document fails.
    ///
    /// `error` is owned so implementations can move it into a spawned task.
    fn on_document_error(&self, input: &str, error: String) {
        let _ = (input, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
