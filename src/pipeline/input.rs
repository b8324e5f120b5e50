//! Input resolution: turn a user-supplied path or URL into bytes plus a kind.
//!
//! ## Why load into memory?
//!
//! Every consumer wants bytes: pdfium opens PDFs from a byte vector and the
//! image path decodes from memory. Inputs are bounded by practical size
//! (the image path rejects anything over its limit outright), so reading the
//! whole file up front keeps the rest of the pipeline free of file handles
//! and temp directories.
//!
//! The kind is sniffed from content, never from the extension: `%PDF` magic
//! means PDF, otherwise `image::guess_format` decides.

use crate::error::TranslateError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// What the bytes turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image(ImageFormat),
}

/// A resolved input.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// File name used for records and export names.
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: InputKind,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// `true` when `bytes` start with the PDF magic.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Sniff the content type of `bytes`.
pub fn detect_kind(name: &str, bytes: &[u8]) -> Result<InputKind, TranslateError> {
    if is_pdf(bytes) {
        return Ok(InputKind::Pdf);
    }
    match image::guess_format(bytes) {
        Ok(fmt @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP)) => {
            Ok(InputKind::Image(fmt))
        }
        _ if name.to_ascii_lowercase().ends_with(".pdf") => Err(TranslateError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        }),
        _ => Err(TranslateError::UnsupportedFileType {
            name: name.to_string(),
        }),
    }
}

/// Read a local file or download a URL, then sniff its kind.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<LoadedInput, TranslateError> {
    let (name, bytes) = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(Path::new(input)).await?
    };
    let kind = detect_kind(&name, &bytes)?;
    debug!("Loaded '{}': {} bytes, {:?}", name, bytes.len(), kind);
    Ok(LoadedInput { name, bytes, kind })
}

async fn read_local(path: &Path) -> Result<(String, Vec<u8>), TranslateError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TranslateError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<(String, Vec<u8>), TranslateError> {
    info!("Downloading from: {}", url);

    let failed = |reason: String| TranslateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    info!("Downloaded {} bytes", bytes.len());
    Ok((filename_from_url(url), bytes.to_vec()))
}

/// Last path segment of a URL when it looks like a file name.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "download".to_string()
}

/// Convenience for callers holding a `PathBuf`.
pub async fn load_path(path: &PathBuf) -> Result<LoadedInput, TranslateError> {
    let (name, bytes) = read_local(path).await?;
    let kind = detect_kind(&name, &bytes)?;
    Ok(LoadedInput { name, bytes, kind })
}
