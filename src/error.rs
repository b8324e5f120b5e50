//! Error types for the edgequake-pdftrans library.
//!
//! Three layers mirror the three scopes a failure can have:
//!
//! * [`CompletionError`]: one call to the chat-completions endpoint failed.
//! * [`PageError`]: one attempt at one PDF page failed (render, encode, or
//!   the completion call). Retried by the pipeline.
//! * [`TranslateError`]: **fatal** for the whole operation. Every public
//!   entry point returns this. A page whose retries are exhausted surfaces as
//!   [`TranslateError::PageProcessing`] and the document is discarded; there
//!   is no partial result.
//!
//! Every variant renders one human-readable sentence. Callers never need to
//! match on codes to show the user what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single chat-completions request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The endpoint answered with a non-2xx status.
    #[error("API request failed: {status_text}{}", remote_suffix(.remote_message))]
    Api {
        status: u16,
        status_text: String,
        /// `error.message` from the response body, when it was JSON and had one.
        remote_message: Option<String>,
    },

    /// 2xx, but no choice carried usable text.
    #[error("API returned an invalid response: {detail}")]
    MalformedResponse { detail: String },

    /// Connection, timeout or body-read failure before a status was seen.
    #[error("API request could not be completed: {detail}")]
    Transport { detail: String },
}

fn remote_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" - {m}"))
        .unwrap_or_default()
}

/// Failure of one attempt at one page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Rendering page {page} failed: {detail}")]
    Render { page: usize, detail: String },

    #[error("Encoding page {page} as JPEG failed: {detail}")]
    Encode { page: usize, detail: String },

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// All fatal errors returned by the edgequake-pdftrans library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    #[error("Unsupported file type for '{name}': expected a PDF or an image")]
    UnsupportedFileType { name: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// A page still failed after every retry. Already-processed pages are
    /// discarded.
    #[error("Failed to process page {page}: {source}")]
    PageProcessing {
        page: usize,
        #[source]
        source: PageError,
    },

    #[error("No text could be extracted from any page of the PDF")]
    EmptyDocument,

    // ── Image errors ──────────────────────────────────────────────────────
    #[error("Image is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Compressed image is still too large (~{estimated} bytes, limit {limit}); use a smaller image")]
    StillTooLarge { estimated: usize, limit: usize },

    #[error("Image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("Image recognition failed: {0}")]
    ImageRecognition(#[source] CompletionError),

    // ── Translation errors ────────────────────────────────────────────────
    #[error("Configure an API key first")]
    MissingApiKey,

    #[error("Unsupported language code '{0}'")]
    UnsupportedLanguage(String),

    #[error("No text was extracted from '{name}'; make sure it contains legible text")]
    NoTextExtracted { name: String },

    #[error("Translation request failed: {0}")]
    Translation(#[source] CompletionError),

    // ── Control flow ──────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    #[error("Translation store error at '{path}': {detail}")]
    Store { path: PathBuf, detail: String },

    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Failed to load the PDFium engine: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy, or\n\
PDFIUM_MIRROR_URL to download it from a reachable mirror."
    )]
    PdfiumBindingFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_includes_remote_message() {
        let e = CompletionError::Api {
            status: 401,
            status_text: "Unauthorized".into(),
            remote_message: Some("Incorrect API key provided".into()),
        };
        assert_eq!(
            e.to_string(),
            "API request failed: Unauthorized - Incorrect API key provided"
        );
    }

    #[test]
    fn api_error_without_remote_message() {
        let e = CompletionError::Api {
            status: 502,
            status_text: "Bad Gateway".into(),
            remote_message: None,
        };
        assert_eq!(e.to_string(), "API request failed: Bad Gateway");
    }

    #[test]
    fn page_processing_names_page_and_cause() {
        let e = TranslateError::PageProcessing {
            page: 7,
            source: PageError::Completion(CompletionError::MalformedResponse {
                detail: "no choices".into(),
            }),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 7"), "got: {msg}");
        assert!(msg.contains("no choices"), "got: {msg}");
    }

    #[test]
    fn still_too_large_display() {
        let e = TranslateError::StillTooLarge {
            estimated: 6_000_000,
            limit: 5_242_880,
        };
        assert!(e.to_string().contains("6000000"));
    }
}
