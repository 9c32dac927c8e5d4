//! # Core Infrastructure Module
//!
//! Session-scoped building blocks shared by the wizard and the tool pages:
//! image assets, the preview-handle registry, and the latest-pending request
//! slot used for debounced renders.

pub mod asset;
pub mod latest;
pub mod preview;

pub use asset::{Dimensions, ImageAsset};
pub use latest::{LatestRequest, Published};
pub use preview::{PreviewHandle, PreviewRegistry, Resolved, Slot, SlotStats};
