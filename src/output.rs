//! Result types returned by the extraction entry points.

use crate::error::{BatchWarning, ScrapeError};
use crate::pipeline::report::{self, SpreadsheetArtifact};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One serial number and the brand of the block it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub serial_number: String,
    pub brand: String,
}

impl ExtractedRecord {
    pub fn new(serial_number: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            brand: brand.into(),
        }
    }
}

/// What segmenting a single text stream produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextExtraction {
    /// Records in block order, then match order within each block.
    pub records: Vec<ExtractedRecord>,
    /// One [`BatchWarning::UnpairedBlock`] per start marker left without an end marker.
    pub warnings: Vec<BatchWarning>,
    pub start_markers: usize,
    pub end_markers: usize,
    pub blocks_paired: usize,
}

/// Per-document facts from text aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    pub page_count: usize,
    /// Length of the document's extracted text, in characters.
    pub text_chars: usize,
}

/// Counters for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Documents whose text was extracted.
    pub documents: usize,
    /// Documents left out under [`crate::config::ReadErrorPolicy::SkipDocument`].
    pub documents_skipped: usize,
    pub pages: usize,
    pub start_markers: usize,
    pub end_markers: usize,
    pub blocks_paired: usize,
    pub blocks_unpaired: usize,
    pub records: usize,
    pub distinct_brands: usize,
    pub total_duration_ms: u64,
}

/// Everything one batch run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub records: Vec<ExtractedRecord>,
    /// Unpaired blocks and skipped documents, in the order they occurred.
    pub warnings: Vec<BatchWarning>,
    pub documents: Vec<DocumentSummary>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Distinct brand values across all records, sorted.
    pub fn distinct_brands(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.brand.as_str()).collect()
    }

    /// The status line shown after a run, e.g.
    /// `Extracted 12 serial numbers from 2 brands.`
    pub fn summary_message(&self) -> String {
        format!(
            "Extracted {} serial numbers from {} brands.",
            self.records.len(),
            self.distinct_brands().len()
        )
    }

    /// Two-column text table of the records.
    pub fn table(&self) -> String {
        report::render_table(&self.records)
    }

    /// The `.xlsx` export of the records, with its download filename and MIME type.
    pub fn to_spreadsheet(&self) -> Result<SpreadsheetArtifact, ScrapeError> {
        report::spreadsheet_artifact(&self.records)
    }

    /// Start offsets of blocks that were skipped for lack of an end marker.
    pub fn unpaired_blocks(&self) -> impl Iterator<Item = (Option<&str>, usize)> {
        self.warnings.iter().filter_map(|w| match w {
            BatchWarning::UnpairedBlock {
                document,
                start_offset,
            } => Some((document.as_deref(), *start_offset)),
            BatchWarning::DocumentSkipped { .. } => None,
        })
    }
}
