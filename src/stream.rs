//! Streaming conversion API: emit documents as they complete.
//!
//! A batch of documents can take minutes against the remote service.
//! [`convert_stream`] runs up to `config.concurrency` documents at once and
//! yields each [`ConversionOutput`] as soon as it is ready, so callers can
//! write files or update a progress bar incrementally. Results arrive in
//! completion order, not input order (compare `output.input` if order
//! matters).
//!
//! A failed document yields a [`DocumentError`] and does not stop the rest
//! of the batch.

use crate::config::ExtractConfig;
use crate::convert::convert_with_client;
use crate::error::{DocumentError, Extract2MdError};
use crate::output::ConversionOutput;
use crate::pipeline::extract::ExtractionClient;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-document results.
pub type DocumentStream =
    Pin<Box<dyn Stream<Item = Result<ConversionOutput, DocumentError>> + Send>>;

/// Convert several documents concurrently, streaming results as they finish.
///
/// # Returns
/// - `Ok(DocumentStream)`: one item per input
/// - `Err(Extract2MdError)`: the HTTP client could not be created
///
/// # Example
/// ```rust,no_run
/// use extract2md::{convert_stream, ExtractConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractConfig::from_env().concurrency(2).build()?;
/// let inputs = vec!["a.pdf".to_string(), "b.docx".to_string()];
/// let mut stream = convert_stream(inputs, &config)?;
/// while let Some(item) = stream.next().await {
///     match item {
///         Ok(doc) => println!("{}: {} bytes", doc.input, doc.markdown.len()),
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    inputs: Vec<String>,
    config: &ExtractConfig,
) -> Result<DocumentStream, Extract2MdError> {
    let client = Arc::new(ExtractionClient::new(config)?);
    let total = inputs.len();
    let concurrency = config.concurrency.max(1);
    let callback = config.progress_callback.clone();
    info!(
        "Starting batch of {} documents (concurrency {})",
        total, concurrency
    );

    if let Some(ref cb) = callback {
        cb.on_batch_start(total);
    }

    let attempted = Arc::new(AtomicUsize::new(0));
    let succeeded = Arc::new(AtomicUsize::new(0));

    let s = stream::iter(inputs.into_iter().map(move |input| {
        let client = Arc::clone(&client);
        let callback = callback.clone();
        let attempted = Arc::clone(&attempted);
        let succeeded = Arc::clone(&succeeded);
        async move {
            if let Some(ref cb) = callback {
                cb.on_document_start(&input);
            }

            let result = convert_with_client(&client, &input).await;

            match &result {
                Ok(output) => {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                    if let Some(ref cb) = callback {
                        cb.on_document_complete(&input, output.markdown.len());
                    }
                }
                Err(e) => {
                    warn!("{}: {}", input, e);
                    if let Some(ref cb) = callback {
                        cb.on_document_error(&input, e.to_string());
                    }
                }
            }

            let done = attempted.fetch_add(1, Ordering::SeqCst) + 1;
            if done == total {
                let ok = succeeded.load(Ordering::SeqCst);
                info!("Batch complete: {}/{} documents", ok, total);
                if let Some(ref cb) = callback {
                    cb.on_batch_complete(total, ok);
                }
            }

            result.map_err(|source| DocumentError { input, source })
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
