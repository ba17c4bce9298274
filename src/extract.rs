//! Batch extraction entry points.
//!
//! A batch runs strictly forward: resolve inputs, extract each document's
//! text in input order, segment the text (per document or combined), harvest
//! records, and optionally write the spreadsheet. Every run owns its text,
//! marker lists and claimed-end set; nothing survives between calls.

use crate::config::{ExtractionConfig, ReadErrorPolicy, StreamMode};
use crate::error::{BatchWarning, ScrapeError};
use crate::output::{DocumentSummary, ExtractionOutput, ExtractionStats, TextExtraction};
use crate::pipeline::aggregate::{self, DocumentText};
use crate::pipeline::input::{self, PdfSource};
use crate::pipeline::{harvest, report};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the segmenter over one text stream.
///
/// This is the pure core of the pipeline: no I/O, no PDF. Useful when the
/// caller already has the text (or for testing marker definitions).
pub fn extract_text(text: &str, config: &ExtractionConfig) -> TextExtraction {
    harvest::harvest_stream(text, config.rules(), None)
}

/// Extract serial numbers from in-memory PDF documents.
///
/// # Returns
/// `Ok(ExtractionOutput)` even when blocks were skipped or documents were
/// left out under [`ReadErrorPolicy::SkipDocument`]; check
/// `output.warnings`.
///
/// # Errors
/// Under [`ReadErrorPolicy::AbortBatch`], the first document that cannot be
/// read. Under either policy, errors that are not about a single document
/// (e.g. pdfium cannot be loaded).
pub async fn extract_sources(
    sources: Vec<PdfSource>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScrapeError> {
    let total_start = Instant::now();
    let total = sources.len();
    info!("Starting extraction of {} documents", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 1: Aggregate text ───────────────────────────────────────────
    let mut texts: Vec<DocumentText> = Vec::with_capacity(total);
    let mut warnings: Vec<BatchWarning> = Vec::new();

    for (i, source) in sources.into_iter().enumerate() {
        let index = i + 1;
        let name = source.name.clone();
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, &name);
        }

        let read = aggregate::document_text(
            source,
            config.password.as_deref(),
            config.pdfium_library.as_deref(),
        )
        .await;
        match read {
            Ok(doc) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_complete(index, total, &name, doc.page_count);
                }
                texts.push(doc);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(index, total, &name, &e.to_string());
                }
                if e.is_document_read_error()
                    && config.read_error_policy == ReadErrorPolicy::SkipDocument
                {
                    warn!("Skipping '{}': {}", name, e);
                    warnings.push(BatchWarning::DocumentSkipped {
                        document: name,
                        reason: e.to_string(),
                    });
                    continue;
                }
                return Err(e);
            }
        }
    }

    // ── Step 2: Segment and harvest ──────────────────────────────────────
    let mut output = segment_documents(&texts, config);
    let skipped = warnings.len();
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    // ── Step 3: Stats ────────────────────────────────────────────────────
    output.stats.documents_skipped = skipped;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Extraction complete: {} records from {} blocks in {} documents, {}ms",
        output.stats.records,
        output.stats.blocks_paired,
        output.stats.documents,
        output.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, output.records.len());
    }

    Ok(output)
}

/// Resolve paths/URLs, then run [`extract_sources`].
///
/// Inputs that cannot be resolved at all (missing file, non-PDF path, failed
/// download) abort the batch regardless of the read-error policy.
pub async fn extract_files<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScrapeError> {
    let mut sources = Vec::with_capacity(inputs.len());
    for input_str in inputs {
        sources.push(input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?);
    }
    extract_sources(sources, config).await
}

/// Extract and write the spreadsheet directly to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated workbook behind.
pub async fn extract_to_file<S: AsRef<str>>(
    inputs: &[S],
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScrapeError> {
    let output = extract_files(inputs, config).await?;
    write_spreadsheet_file(&output, output_path).await?;
    Ok(output)
}

/// Write `output`'s records as `.xlsx` to `path`, atomically.
pub async fn write_spreadsheet_file(
    output: &ExtractionOutput,
    path: impl AsRef<Path>,
) -> Result<(), ScrapeError> {
    let path = path.as_ref();
    let bytes = report::write_spreadsheet(&output.records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScrapeError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    let written = match tokio::fs::write(&tmp_path, &bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ScrapeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`extract_files`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScrapeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScrapeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_files(inputs, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Segment aggregated documents according to the stream mode.
fn segment_documents(texts: &[DocumentText], config: &ExtractionConfig) -> ExtractionOutput {
    let rules = config.rules();
    let extractions: Vec<TextExtraction> = match config.stream_mode {
        StreamMode::PerDocument => texts
            .iter()
            .map(|doc| harvest::harvest_stream(&doc.text, rules, Some(&doc.name)))
            .collect(),
        StreamMode::Combined => {
            let combined: String = texts.iter().map(|doc| doc.text.as_str()).collect();
            debug!(
                "Combined {} documents into one stream of {} chars",
                texts.len(),
                combined.chars().count()
            );
            vec![harvest::harvest_stream(&combined, rules, None)]
        }
    };

    let mut output = ExtractionOutput {
        documents: texts
            .iter()
            .map(|doc| DocumentSummary {
                name: doc.name.clone(),
                page_count: doc.page_count,
                text_chars: doc.text.chars().count(),
            })
            .collect(),
        ..Default::default()
    };

    let mut stats = ExtractionStats {
        documents: texts.len(),
        pages: texts.iter().map(|d| d.page_count).sum(),
        ..Default::default()
    };

    for ex in extractions {
        stats.start_markers += ex.start_markers;
        stats.end_markers += ex.end_markers;
        stats.blocks_paired += ex.blocks_paired;
        stats.blocks_unpaired += ex.warnings.len();
        output.records.extend(ex.records);
        output.warnings.extend(ex.warnings);
    }

    stats.records = output.records.len();
    stats.distinct_brands = output.distinct_brands().len();
    output.stats = stats;
    output
}
