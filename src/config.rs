//! Configuration types for extraction and translation.
//!
//! Two kinds of configuration flow through the pipeline:
//!
//! * [`Credentials`]: where to send requests and how to authenticate.
//!   Supplied by the caller (or the persisted store) and borrowed immutably
//!   for the whole run, so every page of a document sees the same values.
//! * [`PipelineConfig`]: every behavioural knob, built via
//!   [`PipelineConfigBuilder`] so callers set only what they care about.

use crate::error::TranslateError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use pdfium_fetch::EngineSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Hard upper bound on pages processed per PDF.
pub const MAX_PAGES: usize = 50;

/// Base URL used when the caller leaves it empty.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Endpoint credentials: API key plus base URL (never with a trailing slash).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
}

impl Credentials {
    /// Build credentials, normalising the base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    /// Re-apply normalisation, e.g. after deserialising an older record.
    pub fn normalized(self) -> Self {
        Self::new(self.api_key, self.base_url)
    }

    /// Fail with [`TranslateError::MissingApiKey`] when no key is set.
    pub fn ensure_configured(&self) -> Result<(), TranslateError> {
        if self.api_key.trim().is_empty() {
            return Err(TranslateError::MissingApiKey);
        }
        Ok(())
    }

    /// `{base_url}/v1/chat/completions`
    pub fn completions_url(&self) -> String {
        let base = if self.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            self.base_url.as_str()
        };
        format!("{base}/v1/chat/completions")
    }

    /// The key with everything but the last four characters masked.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.masked_key())
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Size and quality budget for the single-image path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageLimits {
    /// Inputs larger than this are rejected before decoding. Default: 5 MiB.
    pub max_input_bytes: usize,
    /// Estimated JPEG payload above this fails with `StillTooLarge`. Default: 5 MiB.
    pub max_encoded_bytes: usize,
    /// Longest edge after downscaling. Default: 800.
    pub max_dimension: u32,
    /// JPEG quality, 1–100. Default: 60.
    pub jpeg_quality: u8,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 5 * 1024 * 1024,
            max_encoded_bytes: 5 * 1024 * 1024,
            max_dimension: 800,
            jpeg_quality: 60,
        }
    }
}

/// Configuration for extraction and translation runs.
///
/// # Example
/// ```rust
/// use edgequake_pdftrans::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_pages(10)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 10);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Chat model sent with every request. Default: `gpt-4o-mini`.
    pub model: String,

    /// Upper bound on pages processed per PDF. Default: 50.
    ///
    /// Pages beyond the cap are never rendered or sent.
    pub max_pages: usize,

    /// Longest rendered edge of a page bitmap in pixels. Default: 2048.
    pub max_render_dimension: u32,

    /// Largest upscale applied to small pages. Default: 2.0.
    pub max_render_scale: f32,

    /// JPEG quality for page images, 1–100. Default: 80.
    pub jpeg_quality: u8,

    /// Retries after the first failed attempt of a page. Default: 2.
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry. Default: 1000.
    pub retry_backoff_ms: u64,

    /// Sampling temperature. `None` leaves it to the endpoint's default.
    pub temperature: Option<f32>,

    /// Per-request HTTP timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Replace the built-in page transcription system prompt.
    pub system_prompt: Option<String>,

    /// Run deterministic Markdown cleanup on every page. Default: true.
    pub clean_markdown: bool,

    /// Budget for the single-image path.
    pub image_limits: ImageLimits,

    /// Where the PDFium engine is loaded from.
    pub engine: EngineSource,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-built completion backend. `None` uses the HTTP client.
    pub backend: Option<Arc<dyn CompletionBackend>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_pages: MAX_PAGES,
            max_render_dimension: 2048,
            max_render_scale: 2.0,
            jpeg_quality: 80,
            max_retries: 2,
            retry_backoff_ms: 1000,
            temperature: None,
            request_timeout_secs: 120,
            download_timeout_secs: 120,
            system_prompt: None,
            clean_markdown: true,
            image_limits: ImageLimits::default(),
            engine: EngineSource::from_env(),
            password: None,
            progress_callback: None,
            backend: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("max_pages", &self.max_pages)
            .field("max_render_dimension", &self.max_render_dimension)
            .field("max_render_scale", &self.max_render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("temperature", &self.temperature)
            .field("clean_markdown", &self.clean_markdown)
            .field("image_limits", &self.image_limits)
            .field("engine", &self.engine)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn CompletionBackend>"))
            .finish()
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn max_render_dimension(mut self, px: u32) -> Self {
        self.config.max_render_dimension = px;
        self
    }

    pub fn max_render_scale(mut self, scale: f32) -> Self {
        self.config.max_render_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn clean_markdown(mut self, v: bool) -> Self {
        self.config.clean_markdown = v;
        self
    }

    pub fn image_limits(mut self, limits: ImageLimits) -> Self {
        self.config.image_limits = limits;
        self
    }

    pub fn engine(mut self, engine: EngineSource) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, TranslateError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(TranslateError::InvalidConfig("model must not be empty".into()));
        }
        if !(1..=MAX_PAGES).contains(&c.max_pages) {
            return Err(TranslateError::InvalidConfig(format!(
                "max_pages must be 1–{MAX_PAGES}, got {}",
                c.max_pages
            )));
        }
        if c.max_render_dimension < 64 {
            return Err(TranslateError::InvalidConfig(format!(
                "max_render_dimension must be ≥ 64, got {}",
                c.max_render_dimension
            )));
        }
        if !(c.max_render_scale > 0.0 && c.max_render_scale.is_finite()) {
            return Err(TranslateError::InvalidConfig(format!(
                "max_render_scale must be a positive number, got {}",
                c.max_render_scale
            )));
        }
        for (name, q) in [
            ("jpeg_quality", c.jpeg_quality),
            ("image_limits.jpeg_quality", c.image_limits.jpeg_quality),
        ] {
            if !(1..=100).contains(&q) {
                return Err(TranslateError::InvalidConfig(format!(
                    "{name} must be 1–100, got {q}"
                )));
            }
        }
        if c.image_limits.max_dimension == 0 {
            return Err(TranslateError::InvalidConfig(
                "image_limits.max_dimension must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let c = Credentials::new("sk-test", "https://proxy.example.com/");
        assert_eq!(c.base_url, "https://proxy.example.com");
        assert_eq!(
            c.completions_url(),
            "https://proxy.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn empty_base_url_falls_back_to_default() {
        let c = Credentials::new("sk-test", "  ");
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_key_is_reported() {
        let c = Credentials::new("", "https://api.example.com");
        assert!(matches!(
            c.ensure_configured(),
            Err(TranslateError::MissingApiKey)
        ));
    }

    #[test]
    fn debug_never_prints_the_key() {
        let c = Credentials::new("sk-supersecret-1234", "https://api.example.com");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("supersecret"), "got: {dbg}");
        assert!(dbg.contains("1234"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_pages, 50);
        assert_eq!(c.max_render_dimension, 2048);
        assert_eq!(c.jpeg_quality, 80);
        assert_eq!(c.max_retries, 2);
        assert_eq!(c.retry_backoff_ms, 1000);
        assert_eq!(c.image_limits.max_input_bytes, 5 * 1024 * 1024);
        assert_eq!(c.image_limits.max_dimension, 800);
        assert_eq!(c.image_limits.jpeg_quality, 60);
    }

    #[test]
    fn builder_rejects_page_cap_above_fifty() {
        assert_eq!(PipelineConfig::builder().max_pages(50).build().unwrap().max_pages, 50);
        let err = PipelineConfig::builder().max_pages(51).build().unwrap_err();
        assert!(matches!(err, TranslateError::InvalidConfig(_)));
        assert!(err.to_string().contains("max_pages"), "got: {err}");
    }

    #[test]
    fn builder_rejects_zero_page_cap() {
        let err = PipelineConfig::builder().max_pages(0).build().unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn builder_rejects_bad_quality() {
        let err = PipelineConfig::builder().jpeg_quality(0).build().unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));
    }
}
