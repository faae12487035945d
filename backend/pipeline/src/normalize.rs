//! Image normalization: fetch, bound to a max dimension, re-encode as a
//! compact base64 JPEG for transport.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use imagetrace_config::ImageTraceConfig;
use imagetrace_core::{ImageRef, NormalizedImage, TraceError};
use tracing::debug;

/// Downloads an image and produces its transport representation.
/// Never mutates anything in place; each call yields a fresh artifact.
pub struct ImageNormalizer {
    client: reqwest::Client,
    download_timeout: Duration,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageNormalizer {
    pub fn new(config: &ImageTraceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            download_timeout: config.download_timeout(),
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Fetch `image` and normalize it for the recognition call.
    pub async fn normalize(&self, image: &ImageRef) -> Result<NormalizedImage, TraceError> {
        let response = self
            .client
            .get(image.as_str())
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TraceError::Timeout("image download")
                } else {
                    TraceError::Download(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TraceError::Download(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TraceError::Download(e.to_string()))?;

        debug!("[Normalizer] downloaded {} bytes from {image}", bytes.len());
        transform(&bytes, self.max_dimension, self.jpeg_quality)
    }
}

/// Decode raw bytes, downscale so the longer side is at most `max_dim`
/// (aspect-preserving, Lanczos3, never upscaling), and re-encode as a
/// base64 JPEG at `quality`. Deterministic for identical inputs.
pub fn transform(bytes: &[u8], max_dim: u32, quality: u8) -> Result<NormalizedImage, TraceError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| TraceError::Decode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let longer = width.max(height);
    let decoded = if longer > max_dim {
        let ratio = max_dim as f64 / longer as f64;
        let new_w = ((width as f64 * ratio).round() as u32).max(1);
        let new_h = ((height as f64 * ratio).round() as u32).max(1);
        decoded.resize_exact(new_w, new_h, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG carries no alpha channel.
    let rgb = decoded.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| TraceError::Decode(e.to_string()))?;

    Ok(NormalizedImage::new(STANDARD.encode(&out)))
}
