//! # edgequake-pdftrans
//!
//! Extract text from PDFs and images with a vision-capable chat model, then
//! translate it with the same endpoint.
//!
//! ## Rendered pages, not text layers
//!
//! Text layers in real-world PDFs are often missing (scans), scrambled
//! (multi-column layouts) or lossy (formulae). Rendering each page and
//! letting a multimodal model read it yields Markdown with headings, tables
//! and LaTeX formulae intact, and that Markdown is what gets translated.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input      local file or URL; sniff PDF vs image
//!  ├─ 2. Render     one page at a time on a pdfium thread (≤ 2048 px, ≤ 2×)
//!  ├─ 3. Encode     flatten on white → JPEG → data URI
//!  ├─ 4. Recognise  chat-completion call, retried with 1 s / 2 s backoff
//!  ├─ 5. Polish     strip fences, normalise whitespace, drop empty pages
//!  ├─ 6. Translate  one request with a formatting-preserving prompt
//!  └─ 7. Record     prepend to the translation store; export as Markdown
//! ```
//!
//! Pages are processed strictly in order, at most 50 per document. A page
//! that still fails after its retries aborts the whole document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdftrans::{process_pdf, Credentials, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new(std::env::var("OPENAI_API_KEY")?, "");
//!     let config = PipelineConfig::default();
//!     let bytes = std::fs::read("paper.pdf")?;
//!     let document = process_pdf(bytes, &credentials, &config).await?;
//!     for page in &document.pages {
//!         println!("page {}: {} chars", page.page_number, page.text.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftrans` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdftrans = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod store;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::{Credentials, ImageLimits, PipelineConfig, PipelineConfigBuilder, DEFAULT_BASE_URL, MAX_PAGES};
pub use convert::{
    extract_text, process_image, process_image_cancellable, process_pages, process_pdf,
    process_pdf_cancellable,
};
pub use error::{CompletionError, PageError, TranslateError};
pub use export::{export_filename, export_markdown, export_translation, ExportSide};
pub use language::{display_name, LanguagePair, AUTO, LANGUAGES};
pub use output::{Document, DocumentStats, PageRecord, Translation};
pub use pdfium_fetch::EngineSource;
pub use pipeline::input::{load_input, InputKind, LoadedInput};
pub use pipeline::llm::{CompletionBackend, HttpCompletionClient};
pub use pipeline::render::{PageSource, PdfiumSource};
pub use progress::{NoopProgress, PipelineProgress, ProgressCallback};
pub use store::TranslationStore;
pub use translate::Translator;
