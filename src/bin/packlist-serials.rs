//! CLI binary for packlist-serials.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, prints the results and writes the spreadsheet.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use packlist_serials::config::DEFAULT_START_MARKER;
use packlist_serials::{
    extract_files, write_spreadsheet_file, BatchWarning, BrandWindow, ExtractionConfig,
    ExtractionProfile, ExtractionProgressCallback, ProgressCallback, ReadErrorPolicy,
    StartMarker, StreamMode,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar over the documents in the batch and a
/// log line per document.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, name: &str, page_count: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{page_count} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(error),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, _record_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!(
                "{} {}/{} documents read  ({} failed)",
                yellow("⚠"),
                total_documents.saturating_sub(failed),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One packing list, spreadsheet in the working directory
  packlist-serials march.pdf

  # Several packing lists into one workbook
  packlist-serials week1.pdf week2.pdf -o shipments/serials.xlsx

  # Marker heading wrapped across lines by the PDF layout
  packlist-serials --flexible-start march.pdf

  # A different supplier's layout
  packlist-serials --profile acme.json acme-packlist.pdf

  # Keep going when a file in the batch is not a readable PDF
  packlist-serials --skip-unreadable incoming/*.pdf

  # Machine-readable results
  packlist-serials --json --no-table march.pdf > serials.json

PROFILE FILE (JSON, every key optional):
  {
    "start_marker": { "kind": "literal", "phrase": "Shipped Serial Numbers/Asset Numbers" },
    "end_marker": "58000.0605",
    "serial_pattern": "ULT\\w{7}",
    "brands": { "tokens": ["FRAZIL"], "display": { "FRAZIL": "FRAZIL" } },
    "lookbehind_chars": 50,
    "brand_window": "lookbehind",
    "stream_mode": "per_document",
    "read_error_policy": "abort_batch"
  }
  Command-line flags override the profile.

BLOCK PAIRING:
  Each start marker takes the first end marker after it that no earlier block
  has taken. Blocks do not nest: when a block opens before the previous one
  closes, the text between the two start markers is read by both blocks.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   same as --pdfium-lib (default: ./, then system)
  RUST_LOG          tracing filter, overrides -v / -q
"#;

/// Extract serial numbers and brands from packing-list PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "packlist-serials",
    version,
    about = "Extract serial numbers and brands from packing-list PDFs into a spreadsheet",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Spreadsheet to write.
    #[arg(short, long, env = "PLS_OUTPUT", default_value = "extracted_serials.xlsx")]
    output: PathBuf,

    /// JSON profile with marker, pattern and brand settings.
    #[arg(long, env = "PLS_PROFILE")]
    profile: Option<PathBuf>,

    /// Phrase that opens a serial-number block.
    #[arg(long, env = "PLS_START_MARKER")]
    start_marker: Option<String>,

    /// Match the start phrase case-insensitively, across line breaks and punctuation.
    #[arg(long, env = "PLS_FLEXIBLE_START")]
    flexible_start: bool,

    /// Literal text that closes a serial-number block.
    #[arg(long, env = "PLS_END_MARKER")]
    end_marker: Option<String>,

    /// Regular expression a serial number must match.
    #[arg(long, env = "PLS_SERIAL_PATTERN")]
    serial_pattern: Option<String>,

    /// Characters before the start marker searched for a brand.
    #[arg(long, env = "PLS_LOOKBEHIND")]
    lookbehind: Option<usize>,

    /// Where to look for the brand.
    #[arg(long, env = "PLS_BRAND_WINDOW", value_enum)]
    brand_window: Option<BrandWindowArg>,

    /// Treat all inputs as one text stream (blocks may span files).
    #[arg(long, env = "PLS_COMBINED")]
    combined: bool,

    /// Skip unreadable documents with a warning instead of aborting.
    #[arg(long, env = "PLS_SKIP_UNREADABLE")]
    skip_unreadable: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PLS_PASSWORD")]
    password: Option<String>,

    /// Print the full result as JSON on stdout.
    #[arg(long, env = "PLS_JSON")]
    json: bool,

    /// Don't print the results table.
    #[arg(long, env = "PLS_NO_TABLE")]
    no_table: bool,

    /// Disable progress bar.
    #[arg(long, env = "PLS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PLS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PLS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PLS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// libpdfium file or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BrandWindowArg {
    Lookbehind,
    BlockInterior,
}

impl From<BrandWindowArg> for BrandWindow {
    fn from(v: BrandWindowArg) -> Self {
        match v {
            BrandWindowArg::Lookbehind => BrandWindow::Lookbehind,
            BrandWindowArg::BlockInterior => BrandWindow::BlockInterior,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Unpaired-block warnings are printed by the binary itself, so library
    // logs stay at error level unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract_files(&cli.inputs, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        for warning in &output.warnings {
            match warning {
                BatchWarning::UnpairedBlock { .. } => {
                    eprintln!("{} {}", yellow("Warning:"), warning)
                }
                BatchWarning::DocumentSkipped { .. } => eprintln!("{} {}", red("Skipped:"), warning),
            }
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.no_table && !cli.quiet {
        print!("{}", output.table());
    }

    write_spreadsheet_file(&output, &cli.output)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if !cli.quiet {
        eprintln!("{} {}", green("✔"), bold(&output.summary_message()));
        eprintln!(
            "   {} blocks  {} skipped  {}ms  →  {}",
            dim(&output.stats.blocks_paired.to_string()),
            dim(&output.stats.blocks_unpaired.to_string()),
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
    }

    Ok(())
}

/// Map the profile file and CLI flags to `ExtractionConfig`.
///
/// Flags win over the profile; the profile wins over built-in defaults.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let profile = match cli.profile {
        Some(ref path) => ExtractionProfile::from_file(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => ExtractionProfile::default(),
    };

    let start_phrase = cli
        .start_marker
        .clone()
        .or_else(|| profile.start_marker.as_ref().map(|m| m.phrase().to_string()));
    let profile_is_flexible = matches!(profile.start_marker, Some(StartMarker::Flexible(_)));

    let mut builder = ExtractionConfig::builder()
        .profile(profile)
        .download_timeout_secs(cli.download_timeout);

    if cli.start_marker.is_some() || cli.flexible_start {
        let phrase = start_phrase.unwrap_or_else(|| DEFAULT_START_MARKER.to_string());
        builder = builder.start_marker(if cli.flexible_start || profile_is_flexible {
            StartMarker::Flexible(phrase)
        } else {
            StartMarker::Literal(phrase)
        });
    }
    if let Some(ref end) = cli.end_marker {
        builder = builder.end_marker(end.clone());
    }
    if let Some(ref pattern) = cli.serial_pattern {
        builder = builder.serial_pattern(pattern.clone());
    }
    if let Some(n) = cli.lookbehind {
        builder = builder.lookbehind_chars(n);
    }
    if let Some(window) = cli.brand_window {
        builder = builder.brand_window(window.into());
    }
    if cli.combined {
        builder = builder.stream_mode(StreamMode::Combined);
    }
    if cli.skip_unreadable {
        builder = builder.read_error_policy(ReadErrorPolicy::SkipDocument);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
