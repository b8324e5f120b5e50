//! Image encoding: `DynamicImage` → opaque JPEG → base64 data URI.
//!
//! Chat-completion endpoints take images as data URIs inside the JSON body.
//! JPEG keeps request bodies small for full-page renders; the page path uses
//! quality 80, the standalone-image path 60.
//!
//! ## Why flatten on white?
//!
//! JPEG has no alpha channel. Pixels that pdfium or a PNG leave transparent
//! would otherwise turn black on a naive RGBA → RGB conversion, and black
//! text on a black background is unreadable to the model.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

/// Prefix of every data URI this module produces.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// One rendered page ready for the endpoint. Dropped once the request that
/// carried it has been sent.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed.
    pub page_number: usize,
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
}

/// Composite any alpha onto an opaque white background.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Encode an RGB image as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(img)?;
    Ok(buf)
}

/// Wrap JPEG bytes as a `data:image/jpeg;base64,` URI.
pub fn to_data_uri(jpeg: &[u8]) -> String {
    let b64 = STANDARD.encode(jpeg);
    debug!("Encoded image → {} bytes base64", b64.len());
    format!("{JPEG_DATA_URI_PREFIX}{b64}")
}

/// Decoded size implied by a data URI's base64 payload:
/// `ceil((len - prefix) * 0.75)`.
pub fn estimated_payload_bytes(data_uri: &str) -> usize {
    let payload = data_uri
        .len()
        .saturating_sub(JPEG_DATA_URI_PREFIX.len());
    (payload * 3).div_ceil(4)
}

/// Flatten, encode and wrap in one step.
pub fn encode_data_uri(img: &DynamicImage, quality: u8) -> Result<String, image::ImageError> {
    let rgb = flatten_on_white(img);
    let jpeg = encode_jpeg(&rgb, quality)?;
    Ok(to_data_uri(&jpeg))
}
