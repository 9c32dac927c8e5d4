//! # Image Processing Module
//!
//! Local, CPU-side image work: upload compression, the color-adjustment model,
//! the filter stack, and the preview engine built on it.

pub mod color;
pub mod compress;
pub mod filters;
pub mod preview;

pub use color::{region_preset, Adjustment, ColorAdjustment, PartialAdjustment, TonePreset};
pub use compress::{compress, ImageCompressor};
pub use filters::{FilterOp, FilterStack};
pub use preview::{export_flattened, ColorEditor, ColorPreviewEngine, PixelSurface};
