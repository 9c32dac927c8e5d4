// SPDX-License-Identifier: MIT
//! # Resize Planning
//!
//! Computes the output size for an image that must fit inside a bounding box.
//!
//! The clamp is applied in two steps, in a fixed order:
//! 1. if the width exceeds `max_w`, scale both sides so the width equals `max_w`
//! 2. if the (already updated) height still exceeds `max_h`, scale both sides so
//!    the height equals `max_h`
//!
//! Intermediate values stay in floating point and are rounded once at the end,
//! clamped to a minimum of 1px. Images already inside the box are never upscaled.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        self.w as f64 / self.h.max(1) as f64
    }
}

/// Maximum output dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub max_w: u32,
    pub max_h: u32,
}

/// Computed resize plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Bounds used for planning
    pub bounds: Bounds,
    /// Final output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when no resampling is needed.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }

    /// Byte length of an RGBA8 output buffer for this plan.
    pub fn out_len(&self) -> usize {
        self.out.w as usize * self.out.h as usize * 4
    }

    /// Byte length of the RGBA8 input buffer this plan expects.
    pub fn input_len(&self) -> usize {
        self.input.w as usize * self.input.h as usize * 4
    }
}

/// Compute a resize plan that fits `input` inside `bounds`.
pub fn build_plan(input: Size, bounds: Bounds) -> ScalePlan {
    let (w, h) = clamp_two_step(input, bounds);
    ScalePlan {
        input,
        bounds,
        out: Size { w, h },
    }
}

/// Width first, then height against the updated width.
fn clamp_two_step(input: Size, bounds: Bounds) -> (u32, u32) {
    let mut w = input.w as f64;
    let mut h = input.h as f64;
    let (max_w, max_h) = (bounds.max_w as f64, bounds.max_h as f64);

    if w > max_w {
        h = h * max_w / w;
        w = max_w;
    }
    if h > max_h {
        w = w * max_h / h;
        h = max_h;
    }

    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}
