//! # Filter Stack
//!
//! Per-pixel filters behind the color preview.
//!
//! The primitives follow the Filter Effects definitions of `brightness()`,
//! `contrast()`, `saturate()`, `sepia()` and `hue-rotate()` on linear 0..1
//! channel values. Each primitive clamps its output to 0..1 before the next
//! one runs, and the stack always executes in the fixed order brightness,
//! contrast, saturation, temperature.

use image::RgbaImage;

use super::color::ColorAdjustment;

type Matrix = [[f32; 3]; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Sepia(f32),
    HueRotate(f32),
}

impl FilterOp {
    fn apply(self, rgb: [f32; 3]) -> [f32; 3] {
        let out = match self {
            FilterOp::Brightness(k) => rgb.map(|c| c * k),
            FilterOp::Contrast(k) => rgb.map(|c| (c - 0.5) * k + 0.5),
            FilterOp::Saturate(s) => mul(&saturate_matrix(s), rgb),
            FilterOp::Sepia(a) => mul(&sepia_matrix(a), rgb),
            FilterOp::HueRotate(deg) => mul(&hue_rotate_matrix(deg), rgb),
        };
        out.map(|c| c.clamp(0.0, 1.0))
    }
}

/// Ordered list of primitives derived from one adjustment set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStack {
    ops: Vec<FilterOp>,
}

impl FilterStack {
    /// Identity primitives are left out, so neutral settings yield an empty stack.
    pub fn from_adjustment(adj: &ColorAdjustment) -> Self {
        let mut ops = Vec::with_capacity(4);
        if adj.brightness != 100.0 {
            ops.push(FilterOp::Brightness(adj.brightness / 100.0));
        }
        if adj.contrast != 100.0 {
            ops.push(FilterOp::Contrast(adj.contrast / 100.0));
        }
        if adj.saturation != 100.0 {
            ops.push(FilterOp::Saturate(adj.saturation / 100.0));
        }
        if adj.temperature > 0.0 {
            ops.push(FilterOp::Sepia((adj.temperature / 100.0).min(1.0)));
        } else if adj.temperature < 0.0 {
            ops.push(FilterOp::HueRotate(adj.temperature * 2.0));
        }
        Self { ops }
    }

    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply to one RGBA8 pixel. Alpha is untouched.
    pub fn apply_pixel(&self, px: [u8; 4]) -> [u8; 4] {
        let mut rgb = [px[0], px[1], px[2]].map(|c| c as f32 / 255.0);
        for op in &self.ops {
            rgb = op.apply(rgb);
        }
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        [r, g, b, px[3]]
    }

    /// Render `original` into a new surface. The input is never modified.
    pub fn render(&self, original: &RgbaImage) -> RgbaImage {
        let mut out = original.clone();
        if self.is_identity() {
            return out;
        }
        for px in out.pixels_mut() {
            px.0 = self.apply_pixel(px.0);
        }
        out
    }
}

fn mul(m: &Matrix, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn saturate_matrix(s: f32) -> Matrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn hue_rotate_matrix(deg: f32) -> Matrix {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}
