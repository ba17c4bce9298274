//! Input resolution: turn a user-supplied path or URL into a named PDF buffer.
//!
//! Everything downstream works on [`PdfSource`], a name plus the document's
//! bytes, so local files, downloads and in-memory uploads enter the pipeline
//! the same way. Local paths must carry a `.pdf` extension; this is
//! the CLI's equivalent of an upload control filtered to PDFs.

use crate::error::ScrapeError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A PDF document identified by name.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl std::fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSource")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// True when `path` ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Resolve the input string to a named PDF buffer.
///
/// URLs are downloaded; local files are validated and read.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfSource, ScrapeError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local file after checking extension, existence and permissions.
async fn read_local(path_str: &str) -> Result<PdfSource, ScrapeError> {
    let path = PathBuf::from(path_str);

    if !has_pdf_extension(&path) {
        return Err(ScrapeError::InvalidInput {
            input: path_str.to_string(),
            reason: "only .pdf files are accepted".into(),
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScrapeError::PermissionDenied { path: path.clone() },
        _ => ScrapeError::FileNotFound { path: path.clone() },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfSource::new(name, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfSource, ScrapeError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScrapeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScrapeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ScrapeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ScrapeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ScrapeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(PdfSource::new(filename_from_url(url), bytes.to_vec()))
}

/// The last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/packlist.pdf"));
        assert!(is_url("http://example.com/packlist.pdf"));
        assert!(!is_url("/tmp/packlist.pdf"));
        assert!(!is_url("packlist.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_pdf_extension_filter() {
        assert!(has_pdf_extension(Path::new("a.pdf")));
        assert!(has_pdf_extension(Path::new("/x/SHIPMENT.PDF")));
        assert!(!has_pdf_extension(Path::new("a.xlsx")));
        assert!(!has_pdf_extension(Path::new("pdf")));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/docs/march.pdf?x=1"),
            "march.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/docs/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn test_local_non_pdf_is_rejected() {
        let err = resolve_input("notes.txt", 5).await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_missing_local_pdf_is_file_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::FileNotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_local_pdf_is_read_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("week12.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();

        let src = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(src.name, "week12.pdf");
        assert_eq!(src.bytes, b"%PDF-1.4 fake");
    }

    #[test]
    fn test_debug_hides_bytes() {
        let src = PdfSource::new("a.pdf", vec![0u8; 2048]);
        let dbg = format!("{src:?}");
        assert!(dbg.contains("<2048 bytes>"));
    }
}
