//! Text aggregation: extract the plain text of every page of a PDF.
//!
//! pdfium needs a file it can open, so each document's bytes are written to
//! a scratch [`NamedTempFile`] first. The scratch file is owned by the
//! blocking task and deleted when the task returns, whether extraction
//! succeeded or not.
//!
//! pdfium is not async-safe and text extraction is CPU-bound, so the work
//! runs inside `tokio::task::spawn_blocking`.
//!
//! pdfium ends lines with `\r\n`; page text is normalised to `\n` so a line
//! break costs one character of the brand lookbehind window, not two.

use crate::error::ScrapeError;
use crate::pipeline::input::PdfSource;
use pdfium_render::prelude::*;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Concatenated page text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    pub name: String,
    pub page_count: usize,
    /// Page texts joined in page order, with no separator.
    pub text: String,
}

/// Check the `%PDF` magic bytes before handing a buffer to pdfium.
pub fn ensure_pdf_magic(source: &PdfSource) -> Result<(), ScrapeError> {
    if source.bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(ScrapeError::NotAPdf {
            name: source.name.clone(),
            magic: source.bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Extract the text of every page of `source`, in page order.
///
/// `library` names the libpdfium file or directory; `None` falls back to
/// `PDFIUM_LIB_PATH`, the working directory and the system library path.
pub async fn document_text(
    source: PdfSource,
    password: Option<&str>,
    library: Option<&Path>,
) -> Result<DocumentText, ScrapeError> {
    ensure_pdf_magic(&source)?;
    let password = password.map(str::to_string);
    let library = library.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        document_text_blocking(source, password.as_deref(), library.as_deref())
    })
    .await
    .map_err(|e| ScrapeError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`document_text`].
fn document_text_blocking(
    source: PdfSource,
    password: Option<&str>,
    library: Option<&Path>,
) -> Result<DocumentText, ScrapeError> {
    let scratch = write_scratch(&source)?;
    let pdfium = bind_pdfium(library)?;

    let document = pdfium
        .load_pdf_from_file(scratch.path(), password)
        .map_err(|e| load_error(&source.name, password, e))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("'{}' loaded: {} pages", source.name, page_count);

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map_err(|e| ScrapeError::PageTextFailed {
            name: source.name.clone(),
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        let content = page_text.all();
        let content = normalise_line_breaks(&content);
        debug!("Page {} → {} chars", idx + 1, content.chars().count());
        text.push_str(&content);
    }

    Ok(DocumentText {
        name: source.name,
        page_count,
        text,
    })
}

/// Turn `\r\n` and lone `\r` into `\n`.
pub fn normalise_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Copy the document to a scratch file that is deleted on drop.
fn write_scratch(source: &PdfSource) -> Result<NamedTempFile, ScrapeError> {
    let mut scratch = tempfile::Builder::new()
        .prefix("packlist-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ScrapeError::Internal(format!("tempfile: {e}")))?;
    scratch
        .write_all(&source.bytes)
        .map_err(|e| ScrapeError::Internal(format!("tempfile write: {e}")))?;
    scratch
        .flush()
        .map_err(|e| ScrapeError::Internal(format!("tempfile flush: {e}")))?;
    debug!(
        "Scratch copy of '{}' at {}",
        source.name,
        scratch.path().display()
    );
    Ok(scratch)
}

/// Map a pdfium load failure to the matching document read error.
fn load_error(name: &str, password: Option<&str>, e: PdfiumError) -> ScrapeError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ScrapeError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            ScrapeError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        ScrapeError::CorruptPdf {
            name: name.to_string(),
            detail: err_str,
        }
    }
}

/// Bind to libpdfium.
///
/// An explicit `library` (file or directory) is the only place tried. Otherwise
/// `PDFIUM_LIB_PATH` is used the same way, and without it the working
/// directory is tried first, then the system library path.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, ScrapeError> {
    let from_env = std::env::var_os("PDFIUM_LIB_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let bindings = match library.map(Path::to_path_buf).or(from_env) {
        Some(location) => Pdfium::bind_to_library(library_path(&location)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ScrapeError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn library_path(location: &Path) -> PathBuf {
    if location.is_file() {
        location.to_path_buf()
    } else {
        Pdfium::pdfium_platform_library_name_at_path(location)
    }
}
