//! PDF rasterisation: one page at a time, on a dedicated render thread.
//!
//! ## Why a dedicated thread?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async tasks that hop between worker
//! threads. A `PdfDocument` also borrows the `Pdfium` binding, so the two
//! cannot be stored in a struct and handed to `spawn_blocking` per page.
//! [`PdfiumSource`] therefore spawns one OS thread that owns the binding and
//! the open document for the whole run, and serves render jobs sent over a
//! channel. The async side awaits each reply without blocking the runtime.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 2× would be 6,700 × 9,500 px.
//! The scale rule `min(max_dim / w, max_dim / h, max_scale)` keeps the
//! longest edge at or under `max_dim` whatever the physical size, while
//! letting small pages grow up to `max_scale` for legibility.
//!
//! ## Page sources
//!
//! The pipeline only needs "how many pages" and "give me page N as an
//! image". [`PageSource`] captures exactly that, so the page loop can be
//! exercised without a pdfium library present.

use crate::config::PipelineConfig;
use crate::error::{PageError, TranslateError};
use crate::pipeline::encode::{encode_data_uri, PageImage};
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_fetch::EngineSource;
use pdfium_render::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// A paginated document that can render any of its pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Total pages in the document.
    fn page_count(&self) -> usize;

    /// Render page `page_number` (1-indexed) within the size limits, on an
    /// opaque white background.
    async fn render(
        &self,
        page_number: usize,
        max_dimension: u32,
        max_scale: f32,
    ) -> Result<DynamicImage, PageError>;
}

/// Uniform scale for a page of `width` × `height` points.
///
/// `min(max_dimension / width, max_dimension / height, max_scale)`.
pub fn render_scale(width: f32, height: f32, max_dimension: u32, max_scale: f32) -> f32 {
    let max_dimension = max_dimension as f32;
    let mut scale = max_scale;
    if width > 0.0 {
        scale = scale.min(max_dimension / width);
    }
    if height > 0.0 {
        scale = scale.min(max_dimension / height);
    }
    scale
}

/// Pixel size of a page after [`render_scale`], never above `max_dimension`
/// and never below 1.
pub fn scaled_size(width: f32, height: f32, max_dimension: u32, max_scale: f32) -> (u32, u32) {
    let scale = render_scale(width, height, max_dimension, max_scale);
    let px = |v: f32| ((v * scale).round() as u32).clamp(1, max_dimension.max(1));
    (px(width), px(height))
}

// ── pdfium-backed source ─────────────────────────────────────────────────

struct RenderJob {
    page_number: usize,
    max_dimension: u32,
    max_scale: f32,
    reply: oneshot::Sender<Result<DynamicImage, PageError>>,
}

/// [`PageSource`] backed by pdfium on its own thread.
///
/// Dropping the source closes the job channel; the thread then closes the
/// document and exits.
pub struct PdfiumSource {
    jobs: mpsc::Sender<RenderJob>,
    page_count: usize,
}

impl PdfiumSource {
    /// Bind pdfium, open `bytes` and report the page count.
    ///
    /// Form data is never rendered and no document JavaScript is run.
    pub async fn open(
        bytes: Vec<u8>,
        engine: EngineSource,
        password: Option<String>,
    ) -> Result<Self, TranslateError> {
        let (jobs, job_rx) = mpsc::channel(1);
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("pdfium-render".to_string())
            .spawn(move || render_worker(bytes, engine, password, job_rx, ready_tx))
            .map_err(|e| TranslateError::Internal(format!("Failed to start render thread: {e}")))?;

        let page_count = ready_rx
            .await
            .map_err(|_| TranslateError::Internal("Render thread exited during startup".into()))??;
        info!("PDF loaded: {} pages", page_count);

        Ok(Self { jobs, page_count })
    }
}

#[async_trait]
impl PageSource for PdfiumSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn render(
        &self,
        page_number: usize,
        max_dimension: u32,
        max_scale: f32,
    ) -> Result<DynamicImage, PageError> {
        let stopped = || PageError::Render {
            page: page_number,
            detail: "render thread has stopped".to_string(),
        };
        let (reply, reply_rx) = oneshot::channel();
        self.jobs
            .send(RenderJob {
                page_number,
                max_dimension,
                max_scale,
                reply,
            })
            .await
            .map_err(|_| stopped())?;
        reply_rx.await.map_err(|_| stopped())?
    }
}

fn render_worker(
    bytes: Vec<u8>,
    engine: EngineSource,
    password: Option<String>,
    mut jobs: mpsc::Receiver<RenderJob>,
    ready: oneshot::Sender<Result<usize, TranslateError>>,
) {
    let pdfium = match pdfium_fetch::bind(&engine) {
        Ok(p) => p,
        Err(e) => {
            let _ = ready.send(Err(TranslateError::PdfiumBindingFailed(e.to_string())));
            return;
        }
    };

    let document = match pdfium.load_pdf_from_byte_vec(bytes, password.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            let _ = ready.send(Err(map_load_error(&e, password.is_some())));
            return;
        }
    };

    let page_count = document.pages().len() as usize;
    if ready.send(Ok(page_count)).is_err() {
        return;
    }

    while let Some(job) = jobs.blocking_recv() {
        let result = render_one(&document, job.page_number, job.max_dimension, job.max_scale);
        // The requester may have been cancelled; nothing to do then.
        let _ = job.reply.send(result);
    }
}

fn map_load_error(e: &PdfiumError, had_password: bool) -> TranslateError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            TranslateError::WrongPassword
        } else {
            TranslateError::PasswordRequired
        }
    } else {
        TranslateError::CorruptPdf { detail }
    }
}

fn render_one(
    document: &PdfDocument<'_>,
    page_number: usize,
    max_dimension: u32,
    max_scale: f32,
) -> Result<DynamicImage, PageError> {
    let fail = |detail: String| PageError::Render {
        page: page_number,
        detail,
    };

    let index = page_number
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| fail(format!("page number {page_number} is out of range")))?;

    let page = document
        .pages()
        .get(index)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let (width, height) = scaled_size(
        page.width().value,
        page.height().value,
        max_dimension,
        max_scale,
    );

    let render_config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_maximum_height(height as i32)
        .set_clear_color(PdfColor::new(255, 255, 255, 255))
        .render_form_data(false);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_number,
        image.width(),
        image.height()
    );
    Ok(image)
}

// ── Rasterizer ───────────────────────────────────────────────────────────

/// Render one page and encode it as a JPEG data URI.
///
/// Encoding is CPU-bound and runs on the blocking pool.
pub async fn rasterize_page(
    source: &dyn PageSource,
    page_number: usize,
    config: &PipelineConfig,
) -> Result<PageImage, PageError> {
    let image = source
        .render(page_number, config.max_render_dimension, config.max_render_scale)
        .await?;
    let (width, height) = (image.width(), image.height());
    let quality = config.jpeg_quality;

    let data_uri = tokio::task::spawn_blocking(move || encode_data_uri(&image, quality))
        .await
        .map_err(|e| PageError::Encode {
            page: page_number,
            detail: format!("encode task panicked: {e}"),
        })?
        .map_err(|e| PageError::Encode {
            page: page_number,
            detail: e.to_string(),
        })?;

    Ok(PageImage {
        page_number,
        width,
        height,
        data_uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_scales_up_to_two() {
        // 612 × 792 pt: 2048/792 ≈ 2.59, capped at 2.
        assert_eq!(render_scale(612.0, 792.0, 2048, 2.0), 2.0);
        assert_eq!(scaled_size(612.0, 792.0, 2048, 2.0), (1224, 1584));
    }

    #[test]
    fn large_page_is_capped_on_longest_edge() {
        let (w, h) = scaled_size(2384.0, 3370.0, 2048, 2.0);
        assert_eq!(h, 2048);
        assert!(w <= 2048);
        assert!((w as f32 / h as f32 - 2384.0 / 3370.0).abs() < 0.01);
    }

    #[test]
    fn wide_page_is_capped_on_width() {
        let (w, h) = scaled_size(4000.0, 1000.0, 2048, 2.0);
        assert_eq!(w, 2048);
        assert_eq!(h, 512);
    }

    #[test]
    fn degenerate_page_still_renders_one_pixel() {
        assert_eq!(scaled_size(0.0, 0.0, 2048, 2.0), (1, 1));
    }

    #[tokio::test]
    async fn rasterize_encodes_rendered_image() {
        struct Solid;

        #[async_trait]
        impl PageSource for Solid {
            fn page_count(&self) -> usize {
                1
            }

            async fn render(&self, _: usize, _: u32, _: f32) -> Result<DynamicImage, PageError> {
                Ok(DynamicImage::new_rgb8(30, 40))
            }
        }

        let config = PipelineConfig::default();
        let page = rasterize_page(&Solid, 1, &config).await.unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!((page.width, page.height), (30, 40));
        assert!(page.data_uri.starts_with("data:image/jpeg;base64,"));
    }
}
