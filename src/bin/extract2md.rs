//! CLI binary for extract2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractConfig` and prints or writes results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use extract2md::config::{API_KEY_ENV, API_URL_ENV, DEFAULT_API_URL};
use extract2md::{
    convert, convert_stream, format_output, render_file, write_output, ConversionOutput,
    ConversionProgressCallback, ExtractConfig, ExtractionMode, OutputFormat, ProgressCallback,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents finish out of order, so start times are keyed by input.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, input: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(input))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.reset_eta();
    }

    fn on_document_start(&self, input: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(input.to_string(), Instant::now());
        }
        self.bar.set_message(short_name(input));
    }

    fn on_document_complete(&self, input: &str, markdown_len: usize) {
        let secs = self.elapsed_secs(input);
        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            green("✓"),
            short_name(input),
            dim(&format!("{markdown_len:>7} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, input: &str, error: String) {
        let secs = self.elapsed_secs(input);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let first_line = error.lines().next().unwrap_or_default();
        let msg: String = if first_line.chars().count() > 80 {
            first_line.chars().take(79).chain(['…']).collect()
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            short_name(input),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

/// Last path segment of a file path or URL, for log lines.
fn short_name(input: &str) -> String {
    input
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(input)
        .to_string()
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document (stdout)
  extract2md invoice.pdf

  # Convert to file
  extract2md invoice.pdf -o invoice.md

  # Try the renderer without an API key
  extract2md --mode sample invoice.pdf

  # Single-step multipart upload instead of upload-then-extract
  extract2md --mode convert scan.png

  # Keep the raw extraction result, render it again later
  extract2md report.docx --save-json report.json
  extract2md --from-json report.json --format html -o report.html

  # A whole folder, four at a time
  extract2md --concurrency 4 --output-dir out/ docs/*.pdf

MODES:
  sample           canned response, no network, no API key
  convert          POST /convert (multipart); the reply is the result
  convert-extract  POST /convert (raw body) → presigned URL → POST /extract (default)

SUPPORTED FILES:
  pdf docx doc txt csv xls xlsx jpg jpeg png   (8 MiB upload limit by default)

ENVIRONMENT VARIABLES:
  EXTRACT2MD_API_KEY   API key sent as x-api-key (required except in sample mode)
  EXTRACT2MD_API_URL   Service base URL (default https://api.runpulse.com)
  RUST_LOG             Log filter, e.g. extract2md=debug
"#;

/// Convert documents to Markdown through a document-extraction API.
#[derive(Parser, Debug)]
#[command(
    name = "extract2md",
    version,
    about = "Convert documents to Markdown through a document-extraction API",
    long_about = "Upload PDFs, office documents and images to a document-extraction service \
and render its result as clean Markdown, repairing malformed tables along the way. \
Saved results can be re-rendered offline with --from-json.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local files or HTTP/HTTPS URLs (saved JSON results with --from-json).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write the result to this file instead of stdout (single input only).
    #[arg(short, long, env = "EXTRACT2MD_OUTPUT", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write one file per input into this directory.
    #[arg(long, env = "EXTRACT2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Request protocol.
    #[arg(long, env = "EXTRACT2MD_MODE", value_enum, default_value = "convert-extract")]
    mode: ModeArg,

    /// Output format.
    #[arg(long, env = "EXTRACT2MD_FORMAT", value_enum, default_value = "markdown")]
    format: FormatArg,

    /// Service base URL.
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "EXTRACT2MD_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Reject uploads larger than this many MiB.
    #[arg(long, env = "EXTRACT2MD_MAX_UPLOAD_MB", default_value_t = 8,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_upload_mb: u64,

    /// Documents processed at once.
    #[arg(short, long, env = "EXTRACT2MD_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Leave `|` inside table cells unescaped.
    #[arg(long)]
    no_escape_pipes: bool,

    /// Also save the raw extraction result as JSON (single input only).
    #[arg(long)]
    save_json: Option<PathBuf>,

    /// Treat inputs as saved extraction results and render them offline.
    #[arg(long)]
    from_json: bool,

    /// Disable progress bar.
    #[arg(long, env = "EXTRACT2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EXTRACT2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EXTRACT2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Sample,
    Convert,
    ConvertExtract,
}

impl From<ModeArg> for ExtractionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Sample => ExtractionMode::Sample,
            ModeArg::Convert => ExtractionMode::Convert,
            ModeArg::ConvertExtract => ExtractionMode::ConvertThenExtract,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Markdown,
    Html,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight with the progress bar, so they are only shown
    // when the bar is off.
    let batch = cli.inputs.len() > 1;
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.from_json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if batch && cli.output.is_some() {
        bail!("--output takes a single input; use --output-dir for several");
    }
    if batch && cli.save_json.is_some() {
        bail!("--save-json takes a single input");
    }
    if batch && cli.output_dir.is_none() && !matches!(cli.format, FormatArg::Json) {
        bail!("Several inputs need --output-dir (or --format json for a stream on stdout)");
    }
    if let Some(ref dir) = cli.output_dir {
        check_output_collisions(dir, &cli.inputs, OutputFormat::from(cli.format))?;
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let format = OutputFormat::from(cli.format);

    // ── Offline rendering of saved results ───────────────────────────────
    if cli.from_json {
        let mut failed = 0usize;
        for input in &cli.inputs {
            match render_file(input, &config) {
                Ok(output) => emit(&cli, &output, format).await?,
                Err(e) => {
                    failed += 1;
                    eprintln!("{} {}: {}", red("✗"), input, e);
                }
            }
        }
        return finish(failed, cli.inputs.len());
    }

    // ── Single document ──────────────────────────────────────────────────
    if !batch {
        let input = &cli.inputs[0];
        let output = convert(input, &config)
            .await
            .with_context(|| format!("Conversion of '{input}' failed"))?;

        if let Some(ref path) = cli.save_json {
            save_result(&output, path).await?;
        }
        emit(&cli, &output, format).await?;

        if !cli.quiet {
            let s = &output.stats;
            eprintln!(
                "{}  {} via {}  {}/{} tables  {}ms",
                green("✔"),
                short_name(input),
                s.source,
                s.tables_rendered,
                s.tables_total,
                s.total_duration_ms,
            );
            if let Some(pages) = s.pages_used {
                eprintln!("   {} pages billed", dim(&pages.to_string()));
            }
        }
        return Ok(());
    }

    // ── Batch ────────────────────────────────────────────────────────────
    let total = cli.inputs.len();
    let mut stream = convert_stream(cli.inputs.clone(), &config).context("Failed to start batch")?;
    let mut failed = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(output) => emit(&cli, &output, format).await?,
            Err(e) => {
                failed += 1;
                if !show_progress {
                    eprintln!("{} {}", red("✗"), e);
                }
            }
        }
    }
    finish(failed, total)
}

/// Write one conversion to its destination.
async fn emit(cli: &Cli, output: &ConversionOutput, format: OutputFormat) -> Result<()> {
    if let Some(ref path) = cli.output {
        write_output(output, path, format)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("   →  {}", bold(&path.display().to_string()));
        }
        return Ok(());
    }

    if let Some(ref dir) = cli.output_dir {
        let path = output_path_for(dir, &output.input, format);
        write_output(output, &path, format)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }

    let text = match format {
        // One JSON document per line so a batch on stdout stays parseable.
        OutputFormat::Json => {
            serde_json::to_string(output).context("Failed to serialise output")?
        }
        _ => format_output(output, format)?,
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Save the raw extraction result next to the rendered output.
async fn save_result(output: &ConversionOutput, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(&output.result).context("Failed to serialise result")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// `<dir>/<input stem>.<ext>`.
fn output_path_for(dir: &Path, input: &str, format: OutputFormat) -> PathBuf {
    let name = short_name(input);
    let stem = Path::new(&name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    dir.join(format!("{stem}.{}", format.extension()))
}

/// Refuse a batch where two inputs would be written to the same file.
fn check_output_collisions(dir: &Path, inputs: &[String], format: OutputFormat) -> Result<()> {
    let mut targets: HashMap<PathBuf, &str> = HashMap::new();
    for input in inputs {
        let path = output_path_for(dir, input, format);
        if let Some(previous) = targets.insert(path.clone(), input) {
            bail!(
                "'{previous}' and '{input}' would both be written to {}; rename one or convert them separately",
                path.display()
            );
        }
    }
    Ok(())
}

fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} documents failed");
    }
    Ok(())
}

/// Map CLI args to `ExtractConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractConfig> {
    let mode = if cli.from_json {
        ExtractionMode::Sample
    } else {
        cli.mode.into()
    };

    let mut builder = ExtractConfig::from_env()
        .mode(mode)
        .api_url(cli.api_url.clone())
        .timeout_secs(cli.timeout)
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .concurrency(cli.concurrency)
        .include_html(matches!(cli.format, FormatArg::Html))
        .escape_pipes(!cli.no_escape_pipes)
        .output_format(cli.format.into());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder
        .build()
        .with_context(|| format!("Invalid configuration (is {API_KEY_ENV} set?)"))
}
