//! # Image Compressor
//!
//! Downsamples and re-encodes oversized images before upload.
//!
//! - Assets at or under `max_size_bytes` are returned as-is (same bytes, no
//!   re-encode).
//! - Larger assets are decoded, fitted inside `max_width`×`max_height` with the
//!   width-then-height clamp from `facelab_scale::presets`, resampled with
//!   Lanczos3, and re-encoded as JPEG at `quality`. The result keeps the
//!   logical name and carries MIME type `image/jpeg`.
//! - A re-encode never grows the asset. If the JPEG at `quality` is larger
//!   than the input, quality steps down by [`QUALITY_STEP`] to
//!   [`MIN_QUALITY`]; output still larger at the floor is an encode error.
//! - Decode failures are [`ClientError::Decode`], encoder failures or empty
//!   output are [`ClientError::Encode`]. Neither falls back to the original.
//!
//! Compression is a pure function of its inputs; batch compression runs each
//! asset on its own blocking worker with no shared mutable state.

use facelab_scale::cpu::resize_rgba_owned;
use facelab_scale::presets::{build_plan, Bounds, Size};
use futures_util::future::try_join_all;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tracing::{debug, info};

use crate::config::CompressOptions;
use crate::core::{Dimensions, ImageAsset};
use crate::error::{ClientError, ClientResult};

pub const JPEG_MIME: &str = "image/jpeg";
pub const MIN_QUALITY: u8 = 10;
pub const QUALITY_STEP: u8 = 15;

/// Compress one asset. See the module docs for the contract.
pub fn compress(asset: &ImageAsset, options: &CompressOptions) -> ClientResult<ImageAsset> {
    if asset.size() <= options.max_size_bytes {
        debug!(name = asset.name(), size = asset.size(), "under size limit, passing through");
        return Ok(asset.clone());
    }

    let decoded = image::load_from_memory(asset.bytes())
        .map_err(|e| ClientError::decode(asset.name(), e).with_operation("compress"))?;
    let rgba = decoded.to_rgba8();

    let plan = build_plan(
        Size { w: rgba.width(), h: rgba.height() },
        Bounds { max_w: options.max_width, max_h: options.max_height },
    );
    let resized = resize_rgba_owned(rgba.as_raw(), &plan)
        .map_err(|e| ClientError::encode(asset.name(), e).with_operation("resample"))?;

    let rgb = flatten_over_black(&resized);
    let mut quality = options.jpeg_quality();
    let encoded = loop {
        let encoded = encode_jpeg(asset.name(), &rgb, plan.out.w, plan.out.h, quality)?;
        if encoded.len() as u64 <= asset.size() {
            break encoded;
        }
        if quality <= MIN_QUALITY {
            return Err(ClientError::encode(
                asset.name(),
                format!("output of {} bytes still exceeds the {} byte input", encoded.len(), asset.size()),
            )
            .with_operation("compress"));
        }
        debug!(name = asset.name(), quality, size = encoded.len(), "re-encode grew the asset, lowering quality");
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    };

    info!(
        name = asset.name(),
        from = asset.size(),
        to = encoded.len(),
        quality,
        width = plan.out.w,
        height = plan.out.h,
        "compressed image"
    );
    Ok(ImageAsset::new(asset.name(), JPEG_MIME, encoded).with_known_dimensions(Dimensions {
        width: plan.out.w,
        height: plan.out.h,
    }))
}

fn encode_jpeg(name: &str, rgb: &[u8], width: u32, height: u32, quality: u8) -> ClientResult<Vec<u8>> {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ClientError::encode(name, e).with_operation("compress"))?;
    if encoded.is_empty() {
        return Err(ClientError::encode(name, "encoder produced no output"));
    }
    Ok(encoded)
}

/// Drops alpha the way a JPEG canvas export does: transparent pixels land on black.
fn flatten_over_black(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        if a == 255 {
            out.extend_from_slice(&px[..3]);
        } else {
            out.extend(px[..3].iter().map(|&c| ((c as u32 * a + 127) / 255) as u8));
        }
    }
    out
}

/// Compressor bound to one set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor {
    options: CompressOptions,
}

impl ImageCompressor {
    pub fn new(options: CompressOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    pub fn compress(&self, asset: &ImageAsset) -> ClientResult<ImageAsset> {
        compress(asset, &self.options)
    }

    /// Compress on a blocking worker so the caller's executor keeps running.
    pub async fn compress_async(&self, asset: ImageAsset) -> ClientResult<ImageAsset> {
        let options = self.options;
        tokio::task::spawn_blocking(move || compress(&asset, &options))
            .await
            .map_err(|e| ClientError::external("tokio", e))?
    }

    /// Compress independent assets concurrently, preserving order.
    /// The first failure fails the whole batch.
    pub async fn compress_all(&self, assets: Vec<ImageAsset>) -> ClientResult<Vec<ImageAsset>> {
        try_join_all(assets.into_iter().map(|a| self.compress_async(a))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_asset(name: &str, w: u32, h: u32) -> ImageAsset {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8, 255])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageAsset::sniffed(name, bytes)
    }

    fn tight(max: u32, max_size_bytes: u64) -> CompressOptions {
        CompressOptions { max_width: max, max_height: max, quality: 0.85, max_size_bytes }
    }

    #[test]
    fn small_assets_pass_through_untouched() {
        let asset = png_asset("small.png", 8, 8);
        let out = compress(&asset, &CompressOptions::default()).unwrap();
        assert!(out.shares_bytes(&asset));
        assert_eq!(out, asset);
    }

    #[test]
    fn oversized_assets_are_resized_and_reencoded() {
        let asset = png_asset("big.png", 300, 200);
        let out = compress(&asset, &tight(100, 1)).unwrap();
        assert_eq!(out.name(), "big.png");
        assert_eq!(out.mime(), JPEG_MIME);
        assert_eq!(out.dimensions().unwrap(), Dimensions { width: 100, height: 67 });
        assert!(out.size() <= asset.size());
        // the cached dimensions agree with the encoded header
        let header = ImageAsset::sniffed("x", out.bytes().to_vec());
        assert_eq!(header.dimensions().unwrap(), Dimensions { width: 100, height: 67 });
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let asset = ImageAsset::new("broken.jpg", "image/jpeg", vec![0xFFu8; 64]);
        let err = compress(&asset, &tight(100, 1)).unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref name, .. } if name == "broken.jpg"));
    }

    #[test]
    fn transparency_flattens_to_black() {
        assert_eq!(flatten_over_black(&[200, 100, 50, 0, 10, 20, 30, 255]), vec![0, 0, 0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn batch_preserves_order_and_fails_fast() {
        let compressor = ImageCompressor::new(tight(32, 1));
        let out = compressor
            .compress_all(vec![png_asset("a.png", 64, 64), png_asset("b.png", 40, 80)])
            .await
            .unwrap();
        assert_eq!(out.iter().map(|a| a.name()).collect::<Vec<_>>(), ["a.png", "b.png"]);
        assert_eq!(out[1].dimensions().unwrap(), Dimensions { width: 16, height: 32 });

        let err = compressor
            .compress_all(vec![png_asset("ok.png", 64, 64), ImageAsset::new("bad", "image/png", vec![1u8; 8])])
            .await
            .unwrap_err();
        assert_eq!(err.category(), "decode");
    }
}
