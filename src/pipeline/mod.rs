//! Pipeline stages for extraction.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! PDF:    input ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//!                   (pdfium)   (JPEG)     (retry)
//! Image:  input ──▶ image ──▶ llm ──▶ postprocess
//!                   (downscale + JPEG)
//! ```
//!
//! 1. [`input`]: read a path or download a URL, sniff PDF vs image
//! 2. [`render`]: rasterise one page at a time on a dedicated pdfium thread
//! 3. [`encode`]: flatten on white, JPEG-encode, wrap as a data URI
//! 4. [`image`]: size-bounded compression for standalone images
//! 5. [`llm`]: chat-completion wire types and the HTTP backend
//! 6. [`retry`]: exponential backoff around render + request
//! 7. [`postprocess`]: deterministic cleanup of model output

pub mod encode;
pub mod image;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
pub mod retry;
