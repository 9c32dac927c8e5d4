//! Color adjustment sliders and presets.
//!
//! Slider values use the editor's percent scale: brightness, contrast and
//! saturation are multipliers where 100 means unchanged; temperature is a
//! signed strength where 0 means unchanged.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::ColorSettings;
use crate::error::ClientError;

/// One named slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
    Temperature,
    Exposure,
    Shadows,
    Highlights,
}

impl Adjustment {
    pub const ALL: [Adjustment; 7] = [
        Adjustment::Brightness,
        Adjustment::Contrast,
        Adjustment::Saturation,
        Adjustment::Temperature,
        Adjustment::Exposure,
        Adjustment::Shadows,
        Adjustment::Highlights,
    ];

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Adjustment::Brightness | Adjustment::Contrast | Adjustment::Saturation => 0.0..=200.0,
            Adjustment::Temperature => -50.0..=50.0,
            Adjustment::Exposure | Adjustment::Shadows | Adjustment::Highlights => -100.0..=100.0,
        }
    }

    pub fn neutral(self) -> f32 {
        match self {
            Adjustment::Brightness | Adjustment::Contrast | Adjustment::Saturation => 100.0,
            _ => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Adjustment::Brightness => "brightness",
            Adjustment::Contrast => "contrast",
            Adjustment::Saturation => "saturation",
            Adjustment::Temperature => "temperature",
            Adjustment::Exposure => "exposure",
            Adjustment::Shadows => "shadows",
            Adjustment::Highlights => "highlights",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Adjustment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Adjustment::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::validation("adjustment", "unknown slider", s))
    }
}

/// Full slider state for one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorAdjustment {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub temperature: f32,
    /// Stored and clamped, no visual effect.
    pub exposure: f32,
    /// Stored and clamped, no visual effect.
    pub shadows: f32,
    /// Stored and clamped, no visual effect.
    pub highlights: f32,
}

impl Default for ColorAdjustment {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ColorAdjustment {
    pub const fn neutral() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            temperature: 0.0,
            exposure: 0.0,
            shadows: 0.0,
            highlights: 0.0,
        }
    }

    pub fn get(&self, which: Adjustment) -> f32 {
        match which {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
            Adjustment::Temperature => self.temperature,
            Adjustment::Exposure => self.exposure,
            Adjustment::Shadows => self.shadows,
            Adjustment::Highlights => self.highlights,
        }
    }

    /// Set one slider, clamped to its range. NaN resets to neutral.
    pub fn set(&mut self, which: Adjustment, value: f32) {
        let range = which.range();
        let value = if value.is_nan() {
            which.neutral()
        } else {
            value.clamp(*range.start(), *range.end())
        };
        match which {
            Adjustment::Brightness => self.brightness = value,
            Adjustment::Contrast => self.contrast = value,
            Adjustment::Saturation => self.saturation = value,
            Adjustment::Temperature => self.temperature = value,
            Adjustment::Exposure => self.exposure = value,
            Adjustment::Shadows => self.shadows = value,
            Adjustment::Highlights => self.highlights = value,
        }
    }

    /// True when rendering would leave the image untouched.
    pub fn is_visually_neutral(&self) -> bool {
        self.brightness == 100.0
            && self.contrast == 100.0
            && self.saturation == 100.0
            && self.temperature == 0.0
    }

    /// Overwrite only the keys `partial` defines.
    pub fn apply(&mut self, partial: &PartialAdjustment) {
        for (which, value) in partial.entries() {
            self.set(which, value);
        }
    }

    pub fn applied(mut self, partial: &PartialAdjustment) -> Self {
        self.apply(partial);
        self
    }
}

/// A preset: only the keys it names are replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialAdjustment {
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub temperature: Option<f32>,
    pub exposure: Option<f32>,
    pub shadows: Option<f32>,
    pub highlights: Option<f32>,
}

impl PartialAdjustment {
    pub fn with(mut self, which: Adjustment, value: f32) -> Self {
        let slot = match which {
            Adjustment::Brightness => &mut self.brightness,
            Adjustment::Contrast => &mut self.contrast,
            Adjustment::Saturation => &mut self.saturation,
            Adjustment::Temperature => &mut self.temperature,
            Adjustment::Exposure => &mut self.exposure,
            Adjustment::Shadows => &mut self.shadows,
            Adjustment::Highlights => &mut self.highlights,
        };
        *slot = Some(value);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (Adjustment, f32)> + '_ {
        [
            (Adjustment::Brightness, self.brightness),
            (Adjustment::Contrast, self.contrast),
            (Adjustment::Saturation, self.saturation),
            (Adjustment::Temperature, self.temperature),
            (Adjustment::Exposure, self.exposure),
            (Adjustment::Shadows, self.shadows),
            (Adjustment::Highlights, self.highlights),
        ]
        .into_iter()
        .filter_map(|(a, v)| v.map(|v| (a, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Named one-click looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonePreset {
    Warm,
    Cool,
    Neutral,
    Vivid,
}

impl TonePreset {
    pub const ALL: [TonePreset; 4] = [TonePreset::Warm, TonePreset::Cool, TonePreset::Neutral, TonePreset::Vivid];

    pub fn adjustment(self) -> PartialAdjustment {
        let p = PartialAdjustment::default();
        match self {
            TonePreset::Warm => p.with(Adjustment::Temperature, 20.0).with(Adjustment::Saturation, 110.0),
            TonePreset::Cool => p.with(Adjustment::Temperature, -20.0).with(Adjustment::Saturation, 90.0),
            TonePreset::Neutral => p.with(Adjustment::Temperature, 0.0).with(Adjustment::Saturation, 100.0),
            TonePreset::Vivid => p.with(Adjustment::Saturation, 130.0).with(Adjustment::Contrast, 110.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TonePreset::Warm => "warm",
            TonePreset::Cool => "cool",
            TonePreset::Neutral => "neutral",
            TonePreset::Vivid => "vivid",
        }
    }
}

impl FromStr for TonePreset {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TonePreset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::validation("tone", "one of warm, cool, neutral, vivid", s))
    }
}

/// Region color settings as a preset. Multipliers scale to percent; a missing
/// or zero multiplier reads as 1 and a missing temperature as 0.
pub fn region_preset(settings: &ColorSettings) -> PartialAdjustment {
    let percent = |m: Option<f32>| match m {
        Some(m) if m != 0.0 => m * 100.0,
        _ => 100.0,
    };
    PartialAdjustment::default()
        .with(Adjustment::Brightness, percent(settings.brightness))
        .with(Adjustment::Contrast, percent(settings.contrast))
        .with(Adjustment::Saturation, percent(settings.saturation))
        .with(Adjustment::Temperature, settings.temperature.unwrap_or(0.0))
}
