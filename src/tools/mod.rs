//! Standalone tools that sit next to the face-swap wizard.

pub mod background;
pub mod headnerf;

pub use background::{preset_color, BackgroundRemovalTool, ColorPreset, RemovedBackground, PRESET_COLORS};
pub use headnerf::{BlendSlider, HeadNerfTool};
