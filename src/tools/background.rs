//! # Background Removal
//!
//! Holds the image and optional background image in their own upload slots,
//! the selected replacement mode and the toggled colors. Outputs come back as
//! server paths and are resolved against the API base.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{BackgroundMode, BackgroundRemovalRequest, FaceLabApi, RgbColor};
use crate::core::{ImageAsset, PreviewHandle, PreviewRegistry, Slot};
use crate::error::{classify, ClientError, ClientResult};
use crate::wizard::{SingleSlot, UploadTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPreset {
    pub name: &'static str,
    pub color: RgbColor,
}

pub const PRESET_COLORS: [ColorPreset; 8] = [
    ColorPreset { name: "White", color: RgbColor::new(255, 255, 255) },
    ColorPreset { name: "Black", color: RgbColor::new(0, 0, 0) },
    ColorPreset { name: "Dark Gray", color: RgbColor::new(30, 30, 30) },
    ColorPreset { name: "Blue", color: RgbColor::new(59, 130, 246) },
    ColorPreset { name: "Purple", color: RgbColor::new(139, 92, 246) },
    ColorPreset { name: "Pink", color: RgbColor::new(236, 72, 153) },
    ColorPreset { name: "Green", color: RgbColor::new(34, 197, 94) },
    ColorPreset { name: "Yellow", color: RgbColor::new(234, 179, 8) },
];

/// Looks a preset up by name, ignoring case.
pub fn preset_color(name: &str) -> Option<RgbColor> {
    PRESET_COLORS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .map(|p| p.color)
}

/// One processed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedBackground {
    /// Resolved URL of the output image.
    pub url: String,
    /// Suggested download name, `background-removed-{n}.png`.
    pub file_name: String,
}

pub struct BackgroundRemovalTool {
    api: Arc<dyn FaceLabApi>,
    previews: PreviewRegistry,
    image: SingleSlot,
    background: SingleSlot,
    mode: BackgroundMode,
    colors: Vec<RgbColor>,
    results: Vec<RemovedBackground>,
    error: Option<String>,
}

impl BackgroundRemovalTool {
    pub fn new(api: Arc<dyn FaceLabApi>) -> Self {
        Self {
            api,
            previews: PreviewRegistry::new(),
            image: SingleSlot::new(Slot::Image),
            background: SingleSlot::new(Slot::Background),
            mode: BackgroundMode::Transparent,
            colors: Vec::new(),
            results: Vec::new(),
            error: None,
        }
    }

    pub fn set_image(&mut self, files: Vec<ImageAsset>) -> usize {
        self.image.accept(files, &mut self.previews)
    }

    pub fn image_preview(&self) -> Option<&PreviewHandle> {
        self.image.handle()
    }

    pub fn set_background(&mut self, files: Vec<ImageAsset>) -> usize {
        self.background.accept(files, &mut self.previews)
    }

    pub fn background_preview(&self) -> Option<&PreviewHandle> {
        self.background.handle()
    }

    pub fn mode(&self) -> BackgroundMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BackgroundMode) {
        self.mode = mode;
    }

    /// Add `color` if absent, remove it otherwise. Returns whether it is now selected.
    pub fn toggle_color(&mut self, color: RgbColor) -> bool {
        if let Some(at) = self.colors.iter().position(|c| *c == color) {
            self.colors.remove(at);
            false
        } else {
            self.colors.push(color);
            true
        }
    }

    pub fn colors(&self) -> &[RgbColor] {
        &self.colors
    }

    pub fn results(&self) -> &[RemovedBackground] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub async fn process(&mut self) -> ClientResult<&[RemovedBackground]> {
        let Some(image) = self.image.asset().cloned() else {
            return Err(ClientError::validation("image", "an image is required", "none"));
        };
        let request = BackgroundRemovalRequest {
            image,
            mode: self.mode,
            colors: self.colors.clone(),
            background: self.background.asset().cloned(),
        };
        debug!(mode = %request.mode, colors = request.colors.len(), "removing background");

        self.error = None;
        self.results.clear();
        let outputs = match self.api.remove_background(&request).await {
            Ok(outputs) => outputs,
            Err(e) => {
                self.error = Some(classify::user_message(&e));
                return Err(e);
            }
        };
        self.results = outputs
            .iter()
            .enumerate()
            .map(|(i, path)| RemovedBackground {
                url: self.api.resolve(path),
                file_name: format!("background-removed-{}.png", i + 1),
            })
            .collect();
        info!(count = self.results.len(), "background removed");
        Ok(&self.results)
    }

    pub fn reset(&mut self) {
        self.previews.clear_all();
        self.image.clear(&mut self.previews);
        self.background.clear(&mut self.previews);
        self.colors.clear();
        self.results.clear();
        self.error = None;
    }
}
