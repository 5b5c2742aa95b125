//! Eager (whole-document) conversion entry points.
//!
//! [`convert`] resolves one input, fetches its extraction result and renders
//! it before returning. [`render_file`] does the same for a result saved
//! earlier as JSON, with no network at all. Use
//! [`crate::stream::convert_stream`] to run many documents concurrently.

use crate::config::{ExtractConfig, ExtractionMode, OutputFormat};
use crate::error::Extract2MdError;
use crate::output::{ConversionOutput, ConversionStats, ExtractionResult};
use crate::pipeline::extract::ExtractionClient;
use crate::pipeline::html::markdown_to_html;
use crate::pipeline::input;
use crate::pipeline::render::render_with;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Fetch and render one document.
///
/// # Arguments
/// * `input`: local file path or HTTP/HTTPS URL
/// * `config`: extraction configuration
///
/// # Errors
/// Any [`Extract2MdError`] from input validation or the service. Rendering
/// itself never fails: a result with no usable content renders as
/// [`crate::pipeline::render::NO_CONTENT`].
///
/// # Example
/// ```rust,no_run
/// use extract2md::{convert, ExtractConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // API key read from EXTRACT2MD_API_KEY
/// let config = ExtractConfig::from_env().build()?;
/// let output = convert("invoice.pdf", &config).await?;
/// println!("{}", output.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ExtractConfig,
) -> Result<ConversionOutput, Extract2MdError> {
    let input_str = input_str.as_ref();
    let client = ExtractionClient::new(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(input_str);
    }
    let result = convert_with_client(&client, input_str).await;
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(output) => cb.on_document_complete(input_str, output.markdown.len()),
            Err(e) => cb.on_document_error(input_str, e.to_string()),
        }
    }
    result
}

/// One document through an existing client. Shared with the stream API so
/// a batch reuses one connection pool.
pub(crate) async fn convert_with_client(
    client: &ExtractionClient,
    input_str: &str,
) -> Result<ConversionOutput, Extract2MdError> {
    let total_start = Instant::now();
    let config = client.config();
    info!("Starting conversion: {} (mode {})", input_str, config.mode);

    // ── Step 1: Resolve and validate input ───────────────────────────────
    let resolved = input::resolve_input(input_str, config.max_upload_bytes).await?;
    let upload_bytes = match config.mode {
        ExtractionMode::Sample => 0,
        _ => resolved.upload_len(),
    };

    // ── Step 2: Fetch the extraction result ──────────────────────────────
    let api_start = Instant::now();
    let result = client.extract(resolved).await?;
    let api_duration_ms = api_start.elapsed().as_millis() as u64;
    debug!("Extraction result received in {}ms", api_duration_ms);

    // ── Step 3: Render ───────────────────────────────────────────────────
    let mut output = finish(input_str, result, config);
    output.stats.upload_bytes = upload_bytes;
    output.stats.api_duration_ms = api_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} ({} bytes of Markdown, {}/{} tables, {}ms total)",
        input_str,
        output.markdown.len(),
        output.stats.tables_rendered,
        output.stats.tables_total,
        output.stats.total_duration_ms
    );
    Ok(output)
}

/// Render a saved extraction result (the JSON the service returned).
///
/// Needs no API key and does no network I/O.
pub fn render_file(
    path: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ConversionOutput, Extract2MdError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Extract2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Extract2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Extract2MdError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let result =
        ExtractionResult::from_json(&json).map_err(|e| Extract2MdError::InvalidResultFile {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut output = finish(&path.display().to_string(), result, config);
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Convert a document and write it straight to a file.
///
/// The file holds [`ExtractConfig::output_format`]. Uses an atomic write
/// (temp file + rename) so a failed run never leaves a partial file.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ConversionStats, Extract2MdError> {
    let output = convert(input_str, config).await?;
    write_output(&output, output_path.as_ref(), config.output_format).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ExtractConfig,
) -> Result<ConversionOutput, Extract2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Extract2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Serialise a conversion in the requested format.
pub fn format_output(
    output: &ConversionOutput,
    format: OutputFormat,
) -> Result<String, Extract2MdError> {
    match format {
        OutputFormat::Markdown => Ok(output.markdown.clone()),
        OutputFormat::Html => Ok(output
            .html
            .clone()
            .unwrap_or_else(|| markdown_to_html(&output.markdown))),
        OutputFormat::Json => serde_json::to_string_pretty(output)
            .map_err(|e| Extract2MdError::Internal(format!("JSON encoding: {e}"))),
    }
}

/// Atomically write a conversion to `path` in the given format.
pub async fn write_output(
    output: &ConversionOutput,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Extract2MdError> {
    let contents = format_output(output, format)?;
    let write_err = |e| Extract2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Wrote {} output to {}", format.extension(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Render a result and fill in the render-side statistics.
fn finish(input: &str, result: ExtractionResult, config: &ExtractConfig) -> ConversionOutput {
    let rendered = render_with(&result, &config.render);
    let html = config
        .include_html
        .then(|| markdown_to_html(&rendered.markdown));

    let stats = ConversionStats {
        source: rendered.source,
        tables_total: rendered.tables_total,
        tables_rendered: rendered.tables_rendered,
        pages_used: result.plan_info.as_ref().and_then(|p| p.pages_used),
        ..Default::default()
    };

    ConversionOutput {
        input: input.to_string(),
        markdown: rendered.markdown,
        html,
        result,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::NO_CONTENT;
    use crate::pipeline::select::ContentSource;
    use std::io::Write;

    fn sample_config() -> ExtractConfig {
        ExtractConfig::builder()
            .mode(ExtractionMode::Sample)
            .build()
            .unwrap()
    }

    fn json_file(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn render_file_uses_markdown() {
        let f = json_file(r##"{"markdown": "# Hi", "plan-info": {"pages_used": 3}}"##);
        let out = render_file(f.path(), &sample_config()).unwrap();
        assert_eq!(out.markdown, "# Hi");
        assert_eq!(out.stats.source, ContentSource::Markdown);
        assert_eq!(out.stats.pages_used, Some(3));
        assert_eq!(out.stats.upload_bytes, 0);
        assert!(out.html.is_none());
    }

    #[test]
    fn render_file_empty_object_is_sentinel() {
        let f = json_file("{}");
        let out = render_file(f.path(), &sample_config()).unwrap();
        assert_eq!(out.markdown, NO_CONTENT);
    }

    #[test]
    fn render_file_rejects_bad_json() {
        let f = json_file("{not json");
        let err = render_file(f.path(), &sample_config()).unwrap_err();
        assert!(matches!(err, Extract2MdError::InvalidResultFile { .. }));
    }

    #[test]
    fn render_file_missing() {
        let err = render_file("/no/such/result.json", &sample_config()).unwrap_err();
        assert!(matches!(err, Extract2MdError::FileNotFound { .. }));
    }

    #[test]
    fn include_html_renders_html() {
        let config = ExtractConfig::builder()
            .mode(ExtractionMode::Sample)
            .include_html(true)
            .build()
            .unwrap();
        let f = json_file(r##"{"markdown": "# Title"}"##);
        let out = render_file(f.path(), &config).unwrap();
        assert!(out.html.unwrap().contains("<h1>Title</h1>"));
    }

    #[test]
    fn format_output_variants() {
        let f = json_file(r##"{"markdown": "# T"}"##);
        let out = render_file(f.path(), &sample_config()).unwrap();
        assert_eq!(format_output(&out, OutputFormat::Markdown).unwrap(), "# T");
        assert!(format_output(&out, OutputFormat::Html)
            .unwrap()
            .contains("<h1>T</h1>"));
        let json: serde_json::Value =
            serde_json::from_str(&format_output(&out, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["markdown"], "# T");
        assert_eq!(json["stats"]["source"], "markdown");
    }

    #[tokio::test]
    async fn sample_mode_converts_any_allowed_file() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        f.write_all(b"%PDF-1.4").unwrap();
        let out = convert(f.path().to_str().unwrap(), &sample_config())
            .await
            .unwrap();
        assert!(out.markdown.starts_with("# Sample Purchase Order"));
        assert_eq!(out.stats.tables_rendered, 1);
        assert_eq!(out.stats.upload_bytes, 0);
    }

    #[tokio::test]
    async fn convert_to_file_writes_atomically() {
        let mut input = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        input.write_all(b"\x89PNG").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("nested").join("out.md");

        let stats = convert_to_file(input.path().to_str().unwrap(), &out_path, &sample_config())
            .await
            .unwrap();
        assert_eq!(stats.source, ContentSource::Markdown);

        let written = std::fs::read_to_string(&out_path).unwrap();
        assert!(written.contains("## Extracted Tables"));
        assert!(!out_path.with_extension("md.tmp").exists());
    }

    #[test]
    fn convert_sync_runs_without_runtime() {
        let err = convert_sync("/no/such/file.pdf", &sample_config()).unwrap_err();
        assert!(matches!(err, Extract2MdError::FileNotFound { .. }));
    }
}
