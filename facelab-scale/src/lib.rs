// SPDX-License-Identifier: MIT
//! # facelab-scale: bounded-box resize planning and RGBA resampling
//!
//! Small CPU-side helpers used by the FaceLab client when an upload is too
//! large and has to be downsampled before it leaves the machine.
//!
//! ## Key Components
//!
//! - [`presets`]: output-size planning (the width-then-height clamp)
//! - [`cpu`]: Lanczos3 resampling of tightly packed RGBA8 buffers via `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust
//! use facelab_scale::{cpu::resize_rgba, presets::{build_plan, Bounds, Size}};
//!
//! let input = Size { w: 4, h: 2 };
//! let plan = build_plan(input, Bounds { max_w: 2, max_h: 2 });
//! assert_eq!((plan.out.w, plan.out.h), (2, 1));
//!
//! let src = vec![255u8; 4 * 2 * 4];
//! let mut resizer = fast_image_resize::Resizer::new();
//! let mut out = vec![0u8; plan.out_len()];
//! resize_rgba(&mut resizer, &src, &plan, &mut out).unwrap();
//! ```

pub mod cpu;
pub mod presets;
