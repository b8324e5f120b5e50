//! Progress-callback trait for per-page pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgress>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`]. Pages are
//! processed one at a time, so events for a document always arrive in page
//! order and never overlap; the `Send + Sync` bound only exists so the
//! config can cross task boundaries.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdftrans::{PipelineConfig, PipelineProgress};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl PipelineProgress for Log {
//!     fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
//!         eprintln!("page {page_num}/{total}: {text_len} chars");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Log) as Arc<dyn PipelineProgress>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

/// Called by the PDF pipeline as it works through a document.
///
/// All methods default to no-ops.
pub trait PipelineProgress: Send + Sync {
    /// Called once the document is open.
    ///
    /// `document_pages` is the PDF's page count; `selected_pages` is how many
    /// will actually be processed after the page cap.
    fn on_document_start(&self, document_pages: usize, selected_pages: usize) {
        let _ = (document_pages, selected_pages);
    }

    /// Called before the first attempt at a page.
    fn on_page_start(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called after a failed attempt, before sleeping `delay`.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn on_page_retry(&self, page_num: usize, attempt: u32, delay: Duration, error: &str) {
        let _ = (page_num, attempt, delay, error);
    }

    /// Called when a page produced text and was kept.
    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let _ = (page_num, total, text_len);
    }

    /// Called when a page succeeded but produced no text and was dropped.
    fn on_page_skipped(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called when a page failed for good. The run aborts right after.
    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once after the last page when the run succeeded.
    fn on_document_complete(&self, selected_pages: usize, kept_pages: usize) {
        let _ = (selected_pages, kept_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgress>;
