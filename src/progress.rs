//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch reads each document.
//!
//! The callback is how a host surfaces progress without the library knowing
//! about terminals or web pages: the CLI drives an `indicatif` bar from it,
//! a service could forward the events to a channel.
//!
//! # Example
//!
//! ```rust
//! use packlist_serials::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_document_complete(&self, _index: usize, _total: usize, _name: &str, page_count: usize) {
//!         self.pages.fetch_add(page_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it works through a batch.
///
/// Documents are read one at a time in input order, so calls never overlap
/// within one batch. The trait is still `Send + Sync` because the config that
/// carries it may be shared across threads. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first document is read.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document's text is extracted.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    /// * `total` — documents in the batch
    /// * `name`  — the document's name
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a document's text has been extracted.
    fn on_document_complete(&self, index: usize, total: usize, name: &str, page_count: usize) {
        let _ = (index, total, name, page_count);
    }

    /// Called when a document cannot be read.
    ///
    /// Fires under both read-error policies; under
    /// [`crate::config::ReadErrorPolicy::AbortBatch`] it is the last event.
    fn on_document_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after segmentation, with the number of records extracted.
    fn on_batch_complete(&self, total_documents: usize, record_count: usize) {
        let _ = (total_documents, record_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
