//! Result reporting: text table for the terminal and the `.xlsx` export.
//!
//! The workbook has one sheet, a header row (`Serial Number`, `Brand`) and
//! one row per record, with no index column. An empty record list still
//! produces a valid, header-only workbook.

use crate::error::ScrapeError;
use crate::output::ExtractedRecord;
use calamine::{Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use std::io::Cursor;

pub const SERIAL_COLUMN: &str = "Serial Number";
pub const BRAND_COLUMN: &str = "Brand";

/// File name offered for download.
pub const SPREADSHEET_FILENAME: &str = "extracted_serials.xlsx";

pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serialised spreadsheet plus what a download needs to describe it.
#[derive(Debug, Clone, Serialize)]
pub struct SpreadsheetArtifact {
    pub filename: &'static str,
    pub mime: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Build the export and wrap it with its file name and MIME type.
pub fn spreadsheet_artifact(records: &[ExtractedRecord]) -> Result<SpreadsheetArtifact, ScrapeError> {
    Ok(SpreadsheetArtifact {
        filename: SPREADSHEET_FILENAME,
        mime: SPREADSHEET_MIME,
        bytes: write_spreadsheet(records)?,
    })
}

/// Serialise records to `.xlsx` bytes.
pub fn write_spreadsheet(records: &[ExtractedRecord]) -> Result<Vec<u8>, ScrapeError> {
    build_workbook(records).map_err(|e| ScrapeError::SpreadsheetWrite(e.to_string()))
}

fn build_workbook(records: &[ExtractedRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    sheet.write_string_with_format(0, 0, SERIAL_COLUMN, &header)?;
    sheet.write_string_with_format(0, 1, BRAND_COLUMN, &header)?;
    sheet.set_column_width(0, 18.0)?;
    sheet.set_column_width(1, 16.0)?;

    for (row, record) in (1u32..).zip(records) {
        sheet.write_string(row, 0, &record.serial_number)?;
        sheet.write_string(row, 1, &record.brand)?;
    }

    workbook.save_to_buffer()
}

/// Read records back from a workbook written by [`write_spreadsheet`].
///
/// The first sheet must start with the `Serial Number` / `Brand` header row.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Vec<ExtractedRecord>, ScrapeError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ScrapeError::SpreadsheetRead(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ScrapeError::SpreadsheetRead("workbook has no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ScrapeError::SpreadsheetRead(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    if header.len() < 2 || header[0] != SERIAL_COLUMN || header[1] != BRAND_COLUMN {
        return Err(ScrapeError::SpreadsheetRead(format!(
            "sheet '{sheet}' does not start with '{SERIAL_COLUMN}' / '{BRAND_COLUMN}' headers"
        )));
    }

    Ok(rows
        .map(|r| {
            let cell = |i: usize| r.get(i).map(|c| c.to_string()).unwrap_or_default();
            ExtractedRecord::new(cell(0), cell(1))
        })
        .collect())
}

/// Render records as an aligned two-column text table.
pub fn render_table(records: &[ExtractedRecord]) -> String {
    let serial_width = records
        .iter()
        .map(|r| r.serial_number.chars().count())
        .chain(std::iter::once(SERIAL_COLUMN.len()))
        .max()
        .unwrap_or(0);
    let brand_width = records
        .iter()
        .map(|r| r.brand.chars().count())
        .chain(std::iter::once(BRAND_COLUMN.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<serial_width$}  {:<brand_width$}\n",
        SERIAL_COLUMN, BRAND_COLUMN
    ));
    out.push_str(&format!(
        "{}  {}\n",
        "─".repeat(serial_width),
        "─".repeat(brand_width)
    ));
    if records.is_empty() {
        out.push_str("(no records)\n");
    }
    for r in records {
        out.push_str(&format!(
            "{:<serial_width$}  {:<brand_width$}\n",
            r.serial_number, r.brand
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ExtractedRecord> {
        vec![
            ExtractedRecord::new("ULT1234567", "FRAZIL"),
            ExtractedRecord::new("ULTabcdefg", "CAFÉ TANGO"),
            ExtractedRecord::new("ULT0000009", "Unknown"),
        ]
    }

    #[test]
    fn test_spreadsheet_round_trip() {
        let bytes = write_spreadsheet(&records()).unwrap();
        assert_eq!(read_spreadsheet(&bytes).unwrap(), records());
    }

    #[test]
    fn test_empty_spreadsheet_is_header_only() {
        let bytes = write_spreadsheet(&[]).unwrap();
        assert!(!bytes.is_empty());
        assert!(read_spreadsheet(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_artifact_carries_download_metadata() {
        let artifact = spreadsheet_artifact(&records()).unwrap();
        assert_eq!(artifact.filename, "extracted_serials.xlsx");
        assert_eq!(
            artifact.mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        // xlsx is a zip container
        assert!(artifact.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_foreign_workbook_is_rejected() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Qty").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = read_spreadsheet(&bytes).unwrap_err();
        assert!(matches!(err, ScrapeError::SpreadsheetRead(_)), "got: {err}");
    }

    #[test]
    fn test_garbage_is_not_a_workbook() {
        assert!(read_spreadsheet(b"not a zip").is_err());
    }

    #[test]
    fn test_table_aligns_columns() {
        let table = render_table(&records());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Serial Number  Brand"));
        assert!(lines[2].starts_with("ULT1234567     FRAZIL"));
        assert!(lines[3].contains("CAFÉ TANGO"));
    }

    #[test]
    fn test_empty_table_says_so() {
        let table = render_table(&[]);
        assert!(table.contains("Serial Number"));
        assert!(table.contains("(no records)"));
    }
}
