//! # Color-Adjustment Preview Engine
//!
//! [`ColorPreviewEngine`] keeps one decoded copy of the original image per
//! editing session. Every render re-applies the full filter stack to that
//! original, so rendering is a pure function of (original, adjustments):
//! the same adjustments always reproduce the same pixels, and neutral
//! adjustments reproduce the original exactly.
//!
//! [`ColorEditor`] is the stateful session on top: current sliders, the
//! region preset they were seeded from, and the surface currently on screen.
//! Slider moves only mark the surface stale; the next read re-renders once,
//! so a burst of moves costs one render.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;

use super::color::{Adjustment, ColorAdjustment, PartialAdjustment, TonePreset};
use super::filters::FilterStack;
use crate::core::ImageAsset;
use crate::error::{ClientError, ClientResult};

pub const PNG_MIME: &str = "image/png";

/// Rendered pixels ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSurface {
    pixels: RgbaImage,
    adjustment: ColorAdjustment,
}

impl PixelSurface {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Adjustments this surface was rendered with.
    pub fn adjustment(&self) -> &ColorAdjustment {
        &self.adjustment
    }
}

#[derive(Debug, Clone)]
pub struct ColorPreviewEngine {
    name: String,
    original: Arc<RgbaImage>,
}

impl ColorPreviewEngine {
    /// Decode `asset` once; the decoded copy is the session's original.
    pub fn load(asset: &ImageAsset) -> ClientResult<Self> {
        let decoded = image::load_from_memory(asset.bytes())
            .map_err(|e| ClientError::decode(asset.name(), e).with_operation("load editor image"))?;
        Ok(Self::from_rgba(asset.name(), decoded.to_rgba8()))
    }

    pub fn from_rgba(name: impl Into<String>, original: RgbaImage) -> Self {
        Self {
            name: name.into(),
            original: Arc::new(original),
        }
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub fn render(&self, adjustment: &ColorAdjustment) -> PixelSurface {
        let stack = FilterStack::from_adjustment(adjustment);
        debug!(name = %self.name, ops = stack.ops().len(), "rendering preview");
        PixelSurface {
            pixels: stack.render(&self.original),
            adjustment: *adjustment,
        }
    }
}

/// Encode exactly what `surface` shows as a lossless PNG.
pub fn export_flattened(surface: &PixelSurface) -> ClientResult<Vec<u8>> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(surface.pixels.clone())
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| ClientError::encode("preview", e).with_operation("export"))?;
    if out.is_empty() {
        return Err(ClientError::encode("preview", "encoder produced no output"));
    }
    Ok(out)
}

/// `facelab_edited_<unix millis>.png`
pub fn export_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("facelab_edited_{millis}.png")
}

/// One editing session over a single image.
#[derive(Debug)]
pub struct ColorEditor {
    engine: ColorPreviewEngine,
    adjustment: ColorAdjustment,
    region: Option<PartialAdjustment>,
    surface: Option<PixelSurface>,
}

impl ColorEditor {
    pub fn new(engine: ColorPreviewEngine) -> Self {
        Self {
            engine,
            adjustment: ColorAdjustment::neutral(),
            region: None,
            surface: None,
        }
    }

    /// Seed the session from a region preset; `reset` returns here.
    pub fn with_region_preset(mut self, preset: PartialAdjustment) -> Self {
        self.adjustment.apply(&preset);
        self.region = Some(preset);
        self
    }

    pub fn engine(&self) -> &ColorPreviewEngine {
        &self.engine
    }

    pub fn adjustment(&self) -> &ColorAdjustment {
        &self.adjustment
    }

    pub fn set(&mut self, which: Adjustment, value: f32) {
        self.adjustment.set(which, value);
        self.surface = None;
    }

    pub fn apply_tone_preset(&mut self, preset: TonePreset) {
        self.adjustment.apply(&preset.adjustment());
        self.surface = None;
    }

    pub fn apply_preset(&mut self, preset: &PartialAdjustment) {
        self.adjustment.apply(preset);
        self.surface = None;
    }

    /// Back to the region preset if one seeded the session, else neutral.
    pub fn reset(&mut self) {
        let base = ColorAdjustment::neutral();
        self.adjustment = match &self.region {
            Some(preset) => base.applied(preset),
            None => base,
        };
        self.surface = None;
    }

    /// Surface for the current sliders, rendered at most once per change.
    pub fn surface(&mut self) -> &PixelSurface {
        let adjustment = self.adjustment;
        let engine = &self.engine;
        self.surface.get_or_insert_with(|| engine.render(&adjustment))
    }

    /// PNG of the surface currently on screen.
    pub fn export(&mut self) -> ClientResult<ImageAsset> {
        let bytes = export_flattened(self.surface())?;
        Ok(ImageAsset::new(export_file_name(), PNG_MIME, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| image::Rgba([(x * 40) as u8, (y * 40) as u8, 90, 200]))
    }

    #[test]
    fn neutral_render_equals_original() {
        let engine = ColorPreviewEngine::from_rgba("g", gradient(6, 6));
        assert_eq!(engine.render(&ColorAdjustment::neutral()).pixels(), engine.original());
    }

    #[test]
    fn renders_are_repeatable_and_non_cumulative() {
        let engine = ColorPreviewEngine::from_rgba("g", gradient(6, 6));
        let mut adj = ColorAdjustment::neutral();
        adj.set(Adjustment::Contrast, 160.0);
        adj.set(Adjustment::Temperature, 30.0);
        let first = engine.render(&adj);
        let second = engine.render(&adj);
        assert_eq!(first, second);
        assert_eq!(engine.render(&ColorAdjustment::neutral()).pixels(), engine.original());
    }

    #[test]
    fn export_round_trips_displayed_pixels() {
        let mut editor = ColorEditor::new(ColorPreviewEngine::from_rgba("g", gradient(4, 3)));
        editor.set(Adjustment::Brightness, 130.0);
        let shown = editor.surface().pixels().clone();
        let exported = editor.export().unwrap();
        assert_eq!(exported.mime(), PNG_MIME);
        assert!(exported.name().starts_with("facelab_edited_"));
        let decoded = image::load_from_memory(exported.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded, shown);
    }

    #[test]
    fn reset_returns_to_region_preset() {
        let preset = PartialAdjustment::default().with(Adjustment::Saturation, 115.0);
        let mut editor =
            ColorEditor::new(ColorPreviewEngine::from_rgba("g", gradient(2, 2))).with_region_preset(preset);
        editor.apply_tone_preset(TonePreset::Vivid);
        assert_eq!(editor.adjustment().saturation, 130.0);
        editor.reset();
        assert_eq!(editor.adjustment().saturation, 115.0);
        assert_eq!(editor.adjustment().contrast, 100.0);

        let mut plain = ColorEditor::new(ColorPreviewEngine::from_rgba("g", gradient(2, 2)));
        plain.set(Adjustment::Brightness, 10.0);
        plain.reset();
        assert_eq!(*plain.adjustment(), ColorAdjustment::neutral());
    }

    #[test]
    fn broken_bytes_fail_to_load() {
        let err = ColorPreviewEngine::load(&ImageAsset::new("x.png", PNG_MIME, vec![0u8; 4])).unwrap_err();
        assert_eq!(err.category(), "decode");
    }
}
