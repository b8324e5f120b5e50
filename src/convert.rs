//! Extraction entry points: PDF pipeline and single-image path.
//!
//! ## Ordering
//!
//! Pages are processed one after another: at most one render and one
//! request are in flight at any time, and progress events arrive in page
//! order.
//!
//! ## Failure
//!
//! Once a page has used up its retries the whole run fails with
//! [`TranslateError::PageProcessing`], naming the page. Pages already
//! recognised are dropped and no later page is requested.

use crate::cancel::CancelToken;
use crate::config::{Credentials, PipelineConfig, MAX_PAGES};
use crate::error::{PageError, TranslateError};
use crate::output::{Document, DocumentStats, PageRecord};
use crate::pipeline::image::compress_image;
use crate::pipeline::input::{is_pdf, InputKind, LoadedInput};
use crate::pipeline::llm::{self, Completion, CompletionBackend, HttpCompletionClient};
use crate::pipeline::render::{rasterize_page, PageSource, PdfiumSource};
use crate::pipeline::retry::{self, RetryError, RetryPolicy};
use crate::pipeline::postprocess;
use crate::prompts::{IMAGE_SYSTEM_PROMPT, IMAGE_USER_PROMPT};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Extract text from every page of a PDF, up to the page cap.
///
/// # Errors
/// - [`TranslateError::NotAPdf`] when `bytes` lack the `%PDF` magic
/// - [`TranslateError::PageProcessing`] when a page still fails after all retries
/// - [`TranslateError::EmptyDocument`] when no page produced text
pub async fn process_pdf(
    bytes: Vec<u8>,
    credentials: &Credentials,
    config: &PipelineConfig,
) -> Result<Document, TranslateError> {
    process_pdf_cancellable(bytes, credentials, config, &CancelToken::never()).await
}

/// [`process_pdf`] that stops with [`TranslateError::Cancelled`] when
/// `cancel` fires.
pub async fn process_pdf_cancellable(
    bytes: Vec<u8>,
    credentials: &Credentials,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<Document, TranslateError> {
    credentials.ensure_configured()?;
    if !is_pdf(&bytes) {
        return Err(TranslateError::NotAPdf {
            name: "input".to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }

    let backend = resolve_backend(config)?;
    let source = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TranslateError::Cancelled),
        r = PdfiumSource::open(bytes, config.engine.clone(), config.password.clone()) => r?,
    };

    process_pages(&source, backend.as_ref(), credentials, config, cancel).await
}

/// The page loop over any [`PageSource`] and [`CompletionBackend`].
///
/// For pages `1..=min(page_count, max_pages, MAX_PAGES)`, in order: render, encode and
/// request inside one retry loop, clean the text, and keep it when non-empty.
pub async fn process_pages(
    source: &dyn PageSource,
    backend: &dyn CompletionBackend,
    credentials: &Credentials,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<Document, TranslateError> {
    let start = Instant::now();
    let total_pages = source.page_count();
    let selected = total_pages.min(config.max_pages).min(MAX_PAGES);
    if total_pages > selected {
        warn!(
            "PDF has {} pages; only the first {} will be processed",
            total_pages, selected
        );
    }
    info!("Processing {} of {} pages", selected, total_pages);

    let progress = config.progress_callback.as_deref();
    if let Some(cb) = progress {
        cb.on_document_start(total_pages, selected);
    }

    let policy = RetryPolicy::new(
        config.max_retries,
        Duration::from_millis(config.retry_backoff_ms),
    );
    let mut stats = DocumentStats {
        total_pages,
        processed_pages: selected,
        ..DocumentStats::default()
    };
    let mut pages: Vec<PageRecord> = Vec::with_capacity(selected);

    for page_number in 1..=selected {
        if cancel.is_cancelled() {
            return Err(TranslateError::Cancelled);
        }
        if let Some(cb) = progress {
            cb.on_page_start(page_number, selected);
        }

        let outcome = retry::run(
            &policy,
            cancel,
            |_| recognize(source, backend, credentials, config, page_number),
            |attempt, delay, err: &PageError| {
                warn!(
                    "Page {}: attempt {} failed: {}; retrying in {:?}",
                    page_number, attempt, err, delay
                );
                if let Some(cb) = progress {
                    cb.on_page_retry(page_number, attempt, delay, &err.to_string());
                }
            },
        )
        .await;

        let completion = match outcome {
            Ok(c) => c,
            Err(RetryError::Cancelled) => return Err(TranslateError::Cancelled),
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!("Page {}: giving up after {} attempts: {}", page_number, attempts, last);
                if let Some(cb) = progress {
                    cb.on_page_error(page_number, selected, &last.to_string());
                }
                return Err(TranslateError::PageProcessing {
                    page: page_number,
                    source: last,
                });
            }
        };

        stats.input_tokens += completion.prompt_tokens;
        stats.output_tokens += completion.completion_tokens;

        let text = finish_text(&completion.content, config.clean_markdown);
        if text.is_empty() {
            warn!("Page {} produced no text; skipping", page_number);
            stats.skipped_pages += 1;
            if let Some(cb) = progress {
                cb.on_page_skipped(page_number, selected);
            }
            continue;
        }

        debug!("Page {}: {} chars", page_number, text.len());
        if let Some(cb) = progress {
            cb.on_page_complete(page_number, selected, text.len());
        }
        pages.push(PageRecord { page_number, text });
    }

    if pages.is_empty() {
        return Err(TranslateError::EmptyDocument);
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Extraction complete: {}/{} pages kept, {}ms",
        pages.len(),
        selected,
        stats.duration_ms
    );
    if let Some(cb) = progress {
        cb.on_document_complete(selected, pages.len());
    }

    Ok(Document { pages, stats })
}

/// One attempt at one page. Rendering happens inside the attempt, so a
/// render failure is retried like a request failure.
async fn recognize(
    source: &dyn PageSource,
    backend: &dyn CompletionBackend,
    credentials: &Credentials,
    config: &PipelineConfig,
    page_number: usize,
) -> Result<Completion, PageError> {
    let image = rasterize_page(source, page_number, config).await?;
    let completion = llm::recognize_page(
        backend,
        credentials,
        &config.model,
        &image,
        config.system_prompt.as_deref(),
        config.temperature,
    )
    .await?;
    Ok(completion)
}

/// Transcribe a standalone image. A single attempt; no retry.
pub async fn process_image(
    bytes: Vec<u8>,
    credentials: &Credentials,
    config: &PipelineConfig,
) -> Result<String, TranslateError> {
    process_image_cancellable(bytes, credentials, config, &CancelToken::never()).await
}

/// [`process_image`] that stops with [`TranslateError::Cancelled`] when
/// `cancel` fires.
pub async fn process_image_cancellable(
    bytes: Vec<u8>,
    credentials: &Credentials,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<String, TranslateError> {
    credentials.ensure_configured()?;

    let limits = config.image_limits;
    let compressed = tokio::task::spawn_blocking(move || compress_image(&bytes, &limits))
        .await
        .map_err(|e| TranslateError::Internal(format!("Image task panicked: {e}")))??;

    let backend = resolve_backend(config)?;
    let request = llm::build_vision_request(
        &config.model,
        IMAGE_SYSTEM_PROMPT,
        IMAGE_USER_PROMPT,
        &compressed.data_uri,
        config.temperature,
    );

    let completion = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TranslateError::Cancelled),
        r = backend.complete(credentials, &request) => r.map_err(TranslateError::ImageRecognition)?,
    };

    Ok(finish_text(&completion.content, config.clean_markdown))
}

/// Extract text from a loaded input of either kind.
///
/// PDFs come back as `## Page N` sections joined by `---` rules.
pub async fn extract_text(
    input: LoadedInput,
    credentials: &Credentials,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<String, TranslateError> {
    match input.kind {
        InputKind::Pdf => {
            let doc = process_pdf_cancellable(input.bytes, credentials, config, cancel)
                .await
                .map_err(|e| match e {
                    TranslateError::NotAPdf { magic, .. } => TranslateError::NotAPdf {
                        name: input.name.clone(),
                        magic,
                    },
                    other => other,
                })?;
            Ok(doc.to_markdown())
        }
        InputKind::Image(_) => {
            process_image_cancellable(input.bytes, credentials, config, cancel).await
        }
    }
}

/// The configured backend, or an HTTP client with the configured timeout.
pub fn resolve_backend(config: &PipelineConfig) -> Result<Arc<dyn CompletionBackend>, TranslateError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    let client = HttpCompletionClient::new(Duration::from_secs(config.request_timeout_secs))
        .map_err(|e| TranslateError::Internal(e.to_string()))?;
    Ok(Arc::new(client))
}

/// Final page text. Empty only when the raw reply is blank; cleanup never
/// turns a non-blank reply into a skipped page.
fn finish_text(raw: &str, clean: bool) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !clean {
        return trimmed.to_string();
    }
    let cleaned = postprocess::clean_markdown(raw);
    if cleaned.is_empty() {
        trimmed.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected_before_pdfium() {
        let creds = Credentials::new("sk-test", "");
        let err = process_pdf(b"GIF89a....".to_vec(), &creds, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::NotAPdf { ref magic, .. } if magic == b"GIF8"));
    }

    #[tokio::test]
    async fn missing_key_is_checked_first() {
        let creds = Credentials::new("", "");
        let err = process_pdf(b"%PDF-1.4".to_vec(), &creds, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::MissingApiKey));
    }

    #[test]
    fn finish_text_respects_clean_flag() {
        assert_eq!(finish_text("```markdown\nA\n```", true), "A");
        assert_eq!(finish_text("  ```markdown\nA\n```  ", false), "```markdown\nA\n```");
    }

    #[test]
    fn only_a_blank_reply_is_empty() {
        assert_eq!(finish_text(" \n\t ", true), "");
        assert_eq!(finish_text("```markdown\n```", true), "```markdown\n```");
        assert_eq!(finish_text("\u{200B}", true), "\u{200B}");
    }
}
