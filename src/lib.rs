//! # packlist-serials
//!
//! Pull equipment serial numbers and their brands out of shipping
//! packing-list PDFs and export them as a two-column spreadsheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF(s)
//!  │
//!  ├─ 1. Input      resolve local files or download from URLs
//!  ├─ 2. Aggregate  concatenate page text via pdfium (spawn_blocking)
//!  ├─ 3. Segment    pair start/end markers into blocks
//!  ├─ 4. Harvest    brand from the text before each block, serials inside it
//!  └─ 5. Report     terminal table + .xlsx (Serial Number, Brand)
//! ```
//!
//! A block opens at the start-marker phrase ("Shipped Serial Numbers/Asset
//! Numbers" by default) and closes at the first unclaimed end-marker
//! ("58000.0605") after it. Pairing is greedy and never nests: if a second
//! block opens before the first closes, the first block claims the nearest
//! end marker and the second one claims the next, so the overlapping region
//! is read twice. Packing lists in the wild never nest, so this is left as-is.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packlist_serials::{extract_files, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract_files(&["march.pdf", "april.pdf"], &config).await?;
//!     print!("{}", output.table());
//!     println!("{}", output.summary_message());
//!     std::fs::write("extracted_serials.xlsx", output.to_spreadsheet()?.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! Text that is already extracted can go straight to the segmenter:
//!
//! ```rust
//! use packlist_serials::{extract_text, ExtractionConfig};
//!
//! let text = "FRAZIL Shipped Serial Numbers/Asset Numbers ULT1234567 58000.0605";
//! let out = extract_text(text, &ExtractionConfig::default());
//! assert_eq!(out.records[0].serial_number, "ULT1234567");
//! assert_eq!(out.records[0].brand, "FRAZIL");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `packlist-serials` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! pdfium is loaded at runtime from [`ExtractionConfig::pdfium_library`] when
//! set, otherwise from `PDFIUM_LIB_PATH`, the working directory, or the system
//! library path, in that order. Failing to load it aborts the batch.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BrandVocabulary, BrandWindow, ExtractionConfig, ExtractionConfigBuilder, ExtractionProfile,
    ExtractionRules, ReadErrorPolicy, StartMarker, StreamMode, UNKNOWN_BRAND,
};
pub use error::{BatchWarning, ScrapeError};
pub use extract::{
    extract_files, extract_sources, extract_sync, extract_text, extract_to_file,
    write_spreadsheet_file,
};
pub use output::{
    DocumentSummary, ExtractedRecord, ExtractionOutput, ExtractionStats, TextExtraction,
};
pub use pipeline::input::PdfSource;
pub use pipeline::report::{read_spreadsheet, write_spreadsheet, SpreadsheetArtifact};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
