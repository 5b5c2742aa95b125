//! Configuration types for extraction and rendering.
//!
//! All behaviour is controlled through [`ExtractConfig`], built via its
//! [`ExtractConfigBuilder`] or read from the environment with
//! [`ExtractConfig::from_env`]. The API key is injected configuration: it
//! never has a default, is never written to logs, and is redacted from the
//! `Debug` output.

use crate::error::Extract2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of the hosted extraction service.
pub const DEFAULT_API_URL: &str = "https://api.runpulse.com";

/// Upload limit enforced before anything is sent. Default: 8 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 8 * 1024 * 1024;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "EXTRACT2MD_API_KEY";

/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "EXTRACT2MD_API_URL";

/// Configuration for fetching and rendering extraction results.
///
/// # Example
/// ```rust
/// use extract2md::{ExtractConfig, ExtractionMode};
///
/// let config = ExtractConfig::builder()
///     .mode(ExtractionMode::Sample)
///     .concurrency(4)
///     .include_html(true)
///     .build()
///     .unwrap();
/// assert!(config.include_html);
/// ```
#[derive(Clone)]
pub struct ExtractConfig {
    /// API key sent as `x-api-key`. Required by every mode except
    /// [`ExtractionMode::Sample`].
    pub api_key: Option<String>,

    /// Service base URL, without a trailing slash. Default: [`DEFAULT_API_URL`].
    pub api_url: String,

    /// Which request protocol to speak. Default: [`ExtractionMode::ConvertThenExtract`].
    pub mode: ExtractionMode,

    /// Chunking methods requested from `/extract`. Default: semantic, recursive.
    pub chunking: Vec<ChunkingMethod>,

    /// Ask `/extract` to return detected tables. Default: true.
    pub return_tables: bool,

    /// Per-request timeout in seconds. Default: 120.
    pub timeout_secs: u64,

    /// Uploads larger than this are rejected locally. Default: 8 MiB.
    pub max_upload_bytes: u64,

    /// Documents processed at once by [`crate::stream::convert_stream`]. Default: 4.
    pub concurrency: usize,

    /// Also render HTML alongside the Markdown. Default: false.
    pub include_html: bool,

    /// Markdown rendering knobs.
    pub render: RenderOptions,

    /// What [`crate::convert::convert_to_file`] writes. Default: Markdown.
    pub output_format: OutputFormat,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            mode: ExtractionMode::default(),
            chunking: vec![ChunkingMethod::Semantic, ChunkingMethod::Recursive],
            return_tables: true,
            timeout_secs: 120,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            concurrency: 4,
            include_html: false,
            render: RenderOptions::default(),
            output_format: OutputFormat::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("mode", &self.mode)
            .field("chunking", &self.chunking)
            .field("return_tables", &self.return_tables)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("concurrency", &self.concurrency)
            .field("include_html", &self.include_html)
            .field("render", &self.render)
            .field("output_format", &self.output_format)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }

    /// A builder pre-populated from [`API_KEY_ENV`] and [`API_URL_ENV`].
    ///
    /// Empty variables are ignored.
    pub fn from_env() -> ExtractConfigBuilder {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = non_empty_env(API_URL_ENV) {
            builder = builder.api_url(url);
        }
        builder
    }

    /// The API key, or an error naming the mode that needed it.
    pub(crate) fn require_api_key(&self) -> Result<&str, Extract2MdError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Extract2MdError::MissingApiKey {
                mode: self.mode.as_str().to_string(),
            })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn chunking(mut self, methods: Vec<ChunkingMethod>) -> Self {
        self.config.chunking = methods;
        self
    }

    pub fn return_tables(mut self, v: bool) -> Self {
        self.config.return_tables = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn include_html(mut self, v: bool) -> Self {
        self.config.include_html = v;
        self
    }

    pub fn escape_pipes(mut self, v: bool) -> Self {
        self.config.render.escape_pipes = v;
        self
    }

    pub fn render_options(mut self, options: RenderOptions) -> Self {
        self.config.render = options;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, Extract2MdError> {
        let c = &self.config;
        if !(c.api_url.starts_with("http://") || c.api_url.starts_with("https://")) {
            return Err(Extract2MdError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got '{}'",
                c.api_url
            )));
        }
        if c.timeout_secs == 0 {
            return Err(Extract2MdError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Extract2MdError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.mode.needs_api_key() {
            c.require_api_key()?;
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The request protocol used to obtain an extraction result.
///
/// The hosted service has exposed several protocols over time; rather than
/// branching inside one request handler, the protocol is chosen up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// No network: return a canned sample response. Useful for demos and
    /// for exercising the renderer without an API key.
    Sample,
    /// One multipart `POST /convert`; the reply is the result.
    Convert,
    /// `POST /convert` with the raw file body to obtain a presigned URL,
    /// then `POST /extract` pointing at it. (default)
    #[default]
    #[serde(rename = "convert-extract")]
    ConvertThenExtract,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Sample => "sample",
            ExtractionMode::Convert => "convert",
            ExtractionMode::ConvertThenExtract => "convert-extract",
        }
    }

    /// Whether requests in this mode reach the service.
    pub fn needs_api_key(&self) -> bool {
        !matches!(self, ExtractionMode::Sample)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunking strategy the service can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingMethod {
    Semantic,
    Recursive,
    Page,
    Header,
}

impl ChunkingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingMethod::Semantic => "semantic",
            ChunkingMethod::Recursive => "recursive",
            ChunkingMethod::Page => "page",
            ChunkingMethod::Header => "header",
        }
    }

    /// Comma-joined list as the `/extract` endpoint expects it.
    pub fn join(methods: &[ChunkingMethod]) -> String {
        methods
            .iter()
            .map(ChunkingMethod::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Options for the Markdown renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Escape `|` inside table cells as `\|` so cell text cannot split a
    /// column. Default: true.
    pub escape_pipes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { escape_pipes: true }
    }
}

/// File format written by [`crate::convert::convert_to_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The rendered Markdown document.
    #[default]
    Markdown,
    /// The Markdown converted to an HTML fragment.
    Html,
    /// The full [`crate::output::ConversionOutput`] as pretty JSON.
    Json,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}
