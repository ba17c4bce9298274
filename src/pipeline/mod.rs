//! Pipeline stages for serial-number extraction.
//!
//! Each submodule implements one step of the batch.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ aggregate ──▶ segment ──▶ harvest ──▶ report
//! (path/URL)  (pdfium)    (markers)   (brand +     (table,
//!                                      serials)     xlsx)
//! ```
//!
//! 1. [`input`]     — resolve a path or URL to a named PDF buffer
//! 2. [`aggregate`] — concatenate every page's text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`segment`]   — locate start/end markers and pair them into blocks
//! 4. [`harvest`]   — resolve each block's brand and collect its serials
//! 5. [`report`]    — terminal table and `.xlsx` export

pub mod aggregate;
pub mod harvest;
pub mod input;
pub mod report;
pub mod segment;
