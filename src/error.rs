//! Error types for the packlist-serials library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScrapeError`] — **Fatal**: the batch (or, under
//!   [`crate::config::ReadErrorPolicy::SkipDocument`], one document) cannot be
//!   processed at all: missing file, corrupt or encrypted PDF, invalid
//!   configuration. Returned as `Err(ScrapeError)` from the `extract*`
//!   entry points.
//!
//! * [`BatchWarning`] — **Non-fatal**: a start marker without an end marker,
//!   or a document skipped under the skip policy. Stored inside
//!   [`crate::output::ExtractionOutput`] so callers see partial results plus
//!   every problem that shaped them.
//!
//! A brand that cannot be resolved is neither: it falls back to
//! [`crate::config::UNKNOWN_BRAND`] silently.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the packlist-serials library.
#[derive(Debug, Error)]
pub enum ScrapeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a PDF path or a valid HTTP/HTTPS URL.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── Document read errors ──────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium opened the document but could not extract text from a page.
    #[error("Text extraction failed for '{name}' page {page}: {detail}")]
    PageTextFailed {
        name: String,
        page: usize,
        detail: String,
    },

    // ── Spreadsheet errors ────────────────────────────────────────────────
    /// The workbook could not be serialised.
    #[error("Failed to build spreadsheet: {0}")]
    SpreadsheetWrite(String),

    /// A workbook could not be read back, or it does not have the export layout.
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetRead(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output spreadsheet file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or profile validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium (https://github.com/bblanchon/pdfium-binaries) and either:\n\
  • place it next to the binary or in the working directory, or\n\
  • set PDFIUM_LIB_PATH=/dir/containing/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrapeError {
    /// True for failures that concern one document's bytes rather than the
    /// whole run. Only these are eligible for
    /// [`crate::config::ReadErrorPolicy::SkipDocument`].
    pub fn is_document_read_error(&self) -> bool {
        matches!(
            self,
            ScrapeError::NotAPdf { .. }
                | ScrapeError::CorruptPdf { .. }
                | ScrapeError::PasswordRequired { .. }
                | ScrapeError::WrongPassword { .. }
                | ScrapeError::PageTextFailed { .. }
        )
    }
}

/// A non-fatal problem recorded while processing a batch.
///
/// Stored in [`crate::output::ExtractionOutput::warnings`] in the order it
/// occurred. The batch continues after each one.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchWarning {
    /// A start marker had no unclaimed end marker after it; the block was skipped.
    ///
    /// `document` is `None` when documents share one combined text stream.
    #[error(
        "No end marker found for block starting at offset {start_offset}{}. Skipping.",
        in_document(.document)
    )]
    UnpairedBlock {
        document: Option<String>,
        start_offset: usize,
    },

    /// A document could not be read and was left out of the batch.
    #[error("Skipped '{document}': {reason}")]
    DocumentSkipped { document: String, reason: String },
}

fn in_document(document: &Option<String>) -> String {
    document
        .as_ref()
        .map(|d| format!(" in '{d}'"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaired_block_display_with_document() {
        let w = BatchWarning::UnpairedBlock {
            document: Some("march.pdf".into()),
            start_offset: 40,
        };
        let msg = w.to_string();
        assert!(msg.contains("offset 40"), "got: {msg}");
        assert!(msg.contains("'march.pdf'"), "got: {msg}");
        assert!(msg.ends_with("Skipping."), "got: {msg}");
    }

    #[test]
    fn test_unpaired_block_display_combined_stream() {
        let w = BatchWarning::UnpairedBlock {
            document: None,
            start_offset: 7,
        };
        assert_eq!(
            w.to_string(),
            "No end marker found for block starting at offset 7. Skipping."
        );
    }

    #[test]
    fn test_password_required_display() {
        let e = ScrapeError::PasswordRequired {
            name: "locked.pdf".into(),
        };
        assert!(e.to_string().contains("locked.pdf"));
        assert!(e.to_string().contains("--password"));
    }

    #[test]
    fn test_document_read_errors_are_classified() {
        assert!(ScrapeError::CorruptPdf {
            name: "a.pdf".into(),
            detail: "bad xref".into()
        }
        .is_document_read_error());
        assert!(ScrapeError::WrongPassword {
            name: "a.pdf".into()
        }
        .is_document_read_error());
        assert!(!ScrapeError::InvalidConfig("x".into()).is_document_read_error());
        assert!(!ScrapeError::PdfiumBindingFailed("no lib".into()).is_document_read_error());
    }

    #[test]
    fn test_warning_serialises_to_json() {
        let w = BatchWarning::DocumentSkipped {
            document: "broken.pdf".into(),
            reason: "corrupt".into(),
        };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("DocumentSkipped"));
        let back: BatchWarning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
