// SPDX-License-Identifier: MIT
// CPU resampler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in -> RGBA8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::ScalePlan;

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall { needed: usize, got: usize },
    SourceSizeMismatch { expected: usize, got: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall { needed, got } => {
                write!(f, "Output buffer too small: need {} bytes, got {}", needed, got)
            }
            ScaleError::SourceSizeMismatch { expected, got } => {
                write!(f, "Source buffer has {} bytes, plan expects {}", got, expected)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resampling options used for every downscale: Lanczos3 convolution with
/// alpha-aware filtering.
pub fn resize_options() -> ResizeOptions {
    ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .use_alpha(true)
}

/// Resample a tightly packed RGBA8 buffer according to `plan`.
/// `dst` must hold at least `plan.out_len()` bytes.
pub fn resize_rgba(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    plan: &ScalePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let expected = plan.input_len();
    if src_rgba.len() != expected {
        return Err(ScaleError::SourceSizeMismatch { expected, got: src_rgba.len() });
    }
    let needed = plan.out_len();
    if dst.len() < needed {
        return Err(ScaleError::BufferTooSmall { needed, got: dst.len() });
    }

    if plan.is_identity() {
        dst[..needed].copy_from_slice(src_rgba);
        return Ok(());
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(plan.input.w, plan.input.h, src_rgba)?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..needed])?;
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &resize_options())?;
    Ok(())
}

/// Convenience wrapper that allocates the output buffer.
pub fn resize_rgba_owned(src_rgba: &[u8], plan: &ScalePlan) -> Result<Vec<u8>, ScaleError> {
    let mut resizer = Resizer::new();
    let mut out = vec![0u8; plan.out_len()];
    resize_rgba(&mut resizer, src_rgba, plan, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{build_plan, Bounds, Size};

    #[test]
    fn downscale_solid_color_stays_solid() {
        let plan = build_plan(Size { w: 64, h: 32 }, Bounds { max_w: 16, max_h: 16 });
        let src: Vec<u8> = std::iter::repeat([10u8, 200, 30, 255]).take(64 * 32).flatten().collect();
        let out = resize_rgba_owned(&src, &plan).unwrap();
        assert_eq!(out.len(), 16 * 8 * 4);
        for px in out.chunks_exact(4) {
            for (got, want) in px.iter().zip([10u8, 200, 30, 255]) {
                assert!(got.abs_diff(want) <= 1, "{:?}", px);
            }
        }
    }

    #[test]
    fn identity_plan_copies() {
        let plan = build_plan(Size { w: 2, h: 2 }, Bounds { max_w: 8, max_h: 8 });
        let src: Vec<u8> = (0..16).collect();
        assert_eq!(resize_rgba_owned(&src, &plan).unwrap(), src);
    }

    #[test]
    fn rejects_short_destination() {
        let plan = build_plan(Size { w: 8, h: 8 }, Bounds { max_w: 4, max_h: 4 });
        let src = vec![0u8; plan.input_len()];
        let mut dst = vec![0u8; 3];
        let err = resize_rgba(&mut Resizer::new(), &src, &plan, &mut dst).unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall { needed: 64, got: 3 }));
    }

    #[test]
    fn rejects_mismatched_source() {
        let plan = build_plan(Size { w: 8, h: 8 }, Bounds { max_w: 4, max_h: 4 });
        let err = resize_rgba_owned(&[0u8; 5], &plan).unwrap_err();
        assert!(matches!(err, ScaleError::SourceSizeMismatch { expected: 256, got: 5 }));
    }
}
