//! Wire models for the FaceLab HTTP API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ImageAsset;
use crate::error::ClientError;

/// Multipliers (1.0 = unchanged) plus a signed temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSettings {
    #[serde(default)]
    pub brightness: Option<f32>,
    #[serde(default)]
    pub contrast: Option<f32>,
    #[serde(default)]
    pub saturation: Option<f32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub name_local: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub color_tone: Option<String>,
    #[serde(default)]
    pub color_settings: ColorSettings,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegionList {
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    pub result_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub index: u32,
    /// Crop of the detected face, relative to the API base.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub faces: Vec<DetectedFace>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackgroundRemovalResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    Transparent,
    Color,
    Image,
    Blur,
}

impl BackgroundMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundMode::Transparent => "transparent",
            BackgroundMode::Color => "color",
            BackgroundMode::Image => "image",
            BackgroundMode::Blur => "blur",
        }
    }
}

impl FromStr for BackgroundMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" => Ok(BackgroundMode::Transparent),
            "color" => Ok(BackgroundMode::Color),
            "image" => Ok(BackgroundMode::Image),
            "blur" => Ok(BackgroundMode::Blur),
            _ => Err(ClientError::validation("mode", "one of transparent, color, image, blur", s)),
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background fill color, `r,g,b` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(ClientError::validation("color", "expected r,g,b", s));
        };
        Ok(Self::new(r.parse()?, g.parse()?, b.parse()?))
    }
}

/// Everything the background-removal endpoint accepts.
#[derive(Debug, Clone)]
pub struct BackgroundRemovalRequest {
    pub image: ImageAsset,
    pub mode: BackgroundMode,
    pub colors: Vec<RgbColor>,
    pub background: Option<ImageAsset>,
}

impl BackgroundRemovalRequest {
    /// `colors` field, present only in color mode with at least one color.
    pub fn colors_field(&self) -> Option<String> {
        (self.mode == BackgroundMode::Color && !self.colors.is_empty()).then(|| {
            self.colors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("|")
        })
    }

    /// `bg_image` part, present only in image mode.
    pub fn background_part(&self) -> Option<&ImageAsset> {
        match self.mode {
            BackgroundMode::Image => self.background.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSample {
    pub name: String,
    pub path: String,
}

impl HeadSample {
    /// Sample name without the latent-code extension.
    pub fn label(&self) -> &str {
        self.name.strip_suffix(".pth").unwrap_or(&self.name)
    }
}

/// Source and target currently loaded by the head model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSelection {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SampleSelectionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub sample: Option<String>,
    #[serde(default)]
    pub preview_base64: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of selecting a source or target sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSelection {
    pub sample: String,
    /// Decoded PNG preview of the selected sample.
    pub preview_png: Option<Vec<u8>>,
}

/// Blend and view sliders for the head model, sent as query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendParams {
    pub identity: f32,
    pub expression: f32,
    pub albedo: f32,
    pub illumination: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl BlendParams {
    pub fn query(&self) -> [(&'static str, String); 7] {
        [
            ("identity", self.identity.to_string()),
            ("expression", self.expression.to_string()),
            ("albedo", self.albedo.to_string()),
            ("illumination", self.illumination.to_string()),
            ("pitch", self.pitch.to_string()),
            ("yaw", self.yaw.to_string()),
            ("roll", self.roll.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenderResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FitResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub fitted_name: Option<String>,
    #[serde(default)]
    pub result_image: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of fitting an uploaded face to a new latent sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub fitted_name: String,
    pub result_png: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
