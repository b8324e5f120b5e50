//! Standalone-image compression for the image OCR path.
//!
//! Inputs are checked in two places: the raw file against
//! `max_input_bytes` before decoding, and the encoded JPEG (estimated from its
//! base64 length) against `max_encoded_bytes`. There is no second, harder
//! compression pass; an image that is still too large is rejected.
//!
//! CPU-bound: callers on the async runtime should wrap it in
//! `spawn_blocking`.

use crate::config::ImageLimits;
use crate::error::TranslateError;
use crate::pipeline::encode::{encode_data_uri, estimated_payload_bytes};
use image::imageops::FilterType;
use image::GenericImageView;
use tracing::debug;

/// A size-bounded JPEG ready to send.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
    /// Estimated decoded payload size in bytes.
    pub estimated_bytes: usize,
}

/// `min(1, max_dimension / longest_edge)`; images are never upscaled.
pub fn downscale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longest = width.max(height).max(1) as f64;
    (max_dimension as f64 / longest).min(1.0)
}

/// Decode, downscale, re-encode and size-check an image.
pub fn compress_image(bytes: &[u8], limits: &ImageLimits) -> Result<CompressedImage, TranslateError> {
    if bytes.len() > limits.max_input_bytes {
        return Err(TranslateError::FileTooLarge {
            size: bytes.len(),
            limit: limits.max_input_bytes,
        });
    }

    let img = image::load_from_memory(bytes).map_err(|e| TranslateError::ImageDecode(e.to_string()))?;
    let (w, h) = img.dimensions();
    let scale = downscale_factor(w, h, limits.max_dimension);

    let img = if scale < 1.0 {
        let nw = ((w as f64 * scale).round() as u32).max(1);
        let nh = ((h as f64 * scale).round() as u32).max(1);
        img.resize_exact(nw, nh, FilterType::Lanczos3)
    } else {
        img
    };

    let data_uri = encode_data_uri(&img, limits.jpeg_quality)
        .map_err(|e| TranslateError::ImageDecode(format!("JPEG encoding failed: {e}")))?;
    let estimated_bytes = estimated_payload_bytes(&data_uri);
    debug!(
        "Compressed image {}x{} → {}x{}, ~{} bytes",
        w,
        h,
        img.width(),
        img.height(),
        estimated_bytes
    );

    if estimated_bytes > limits.max_encoded_bytes {
        return Err(TranslateError::StillTooLarge {
            estimated: estimated_bytes,
            limit: limits.max_encoded_bytes,
        });
    }

    Ok(CompressedImage {
        width: img.width(),
        height: img.height(),
        data_uri,
        estimated_bytes,
    })
}
