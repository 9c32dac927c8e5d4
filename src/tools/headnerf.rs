//! HeadNeRF blending.
//!
//! Blends a source and a target head sample under seven sliders. Slider drags
//! go through a debounced [`LatestRequest`] so only the newest render is ever
//! published; sample selection and reset render immediately.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{BlendParams, FaceLabApi, FitResult, HeadSample};
use crate::config::ClientConfig;
use crate::core::{ImageAsset, LatestRequest, Published};
use crate::error::{classify, ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendSlider {
    Identity,
    Expression,
    Albedo,
    Illumination,
    Pitch,
    Yaw,
    Roll,
}

impl BlendSlider {
    pub const ALL: [BlendSlider; 7] = [
        BlendSlider::Identity,
        BlendSlider::Expression,
        BlendSlider::Albedo,
        BlendSlider::Illumination,
        BlendSlider::Pitch,
        BlendSlider::Yaw,
        BlendSlider::Roll,
    ];

    /// Blend weights run 0..=1, view angles -1..=1.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            BlendSlider::Identity | BlendSlider::Expression | BlendSlider::Albedo | BlendSlider::Illumination => {
                0.0..=1.0
            }
            BlendSlider::Pitch | BlendSlider::Yaw | BlendSlider::Roll => -1.0..=1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlendSlider::Identity => "identity",
            BlendSlider::Expression => "expression",
            BlendSlider::Albedo => "albedo",
            BlendSlider::Illumination => "illumination",
            BlendSlider::Pitch => "pitch",
            BlendSlider::Yaw => "yaw",
            BlendSlider::Roll => "roll",
        }
    }
}

impl fmt::Display for BlendSlider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendSlider {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BlendSlider::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClientError::validation("slider", "unknown blend slider", s))
    }
}

impl BlendParams {
    pub fn get(&self, slider: BlendSlider) -> f32 {
        match slider {
            BlendSlider::Identity => self.identity,
            BlendSlider::Expression => self.expression,
            BlendSlider::Albedo => self.albedo,
            BlendSlider::Illumination => self.illumination,
            BlendSlider::Pitch => self.pitch,
            BlendSlider::Yaw => self.yaw,
            BlendSlider::Roll => self.roll,
        }
    }

    /// Set one slider, clamped to its range. NaN reads as zero.
    pub fn set(&mut self, slider: BlendSlider, value: f32) {
        let range = slider.range();
        let value = if value.is_nan() { 0.0 } else { value.clamp(*range.start(), *range.end()) };
        let field = match slider {
            BlendSlider::Identity => &mut self.identity,
            BlendSlider::Expression => &mut self.expression,
            BlendSlider::Albedo => &mut self.albedo,
            BlendSlider::Illumination => &mut self.illumination,
            BlendSlider::Pitch => &mut self.pitch,
            BlendSlider::Yaw => &mut self.yaw,
            BlendSlider::Roll => &mut self.roll,
        };
        *field = value;
    }
}

pub struct HeadNerfTool {
    api: Arc<dyn FaceLabApi>,
    params: BlendParams,
    samples: Vec<HeadSample>,
    source: Option<String>,
    target: Option<String>,
    source_preview: Option<Vec<u8>>,
    target_preview: Option<Vec<u8>>,
    render: LatestRequest<Vec<u8>>,
    error: Option<String>,
}

impl HeadNerfTool {
    pub fn new(api: Arc<dyn FaceLabApi>, debounce: Duration) -> Self {
        Self {
            api,
            params: BlendParams::default(),
            samples: Vec::new(),
            source: None,
            target: None,
            source_preview: None,
            target_preview: None,
            render: LatestRequest::new("headnerf render", debounce),
            error: None,
        }
    }

    pub fn from_config(api: Arc<dyn FaceLabApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.render_debounce)
    }

    /// Load samples, pick the first two when there are at least two, prefer the server's current
    /// selection when it has one, then render once.
    pub async fn init(&mut self) -> ClientResult<u64> {
        let samples = self.api.headnerf_samples().await;
        let samples = samples.map_err(|e| self.record(e))?;
        self.samples = samples;
        if let [first, second, ..] = self.samples.as_slice() {
            self.source = Some(first.name.clone());
            self.target = Some(second.name.clone());
        }

        match self.api.headnerf_current().await {
            Ok(current) => {
                self.source = current.source.or(self.source.take());
                self.target = current.target.or(self.target.take());
            }
            Err(e) => debug!(error = %e, "no current head selection, keeping defaults"),
        }
        info!(samples = self.samples.len(), source = ?self.source, target = ?self.target, "head model ready");
        Ok(self.request_render(true))
    }

    pub fn params(&self) -> &BlendParams {
        &self.params
    }

    pub fn samples(&self) -> &[HeadSample] {
        &self.samples
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn source_preview(&self) -> Option<&[u8]> {
        self.source_preview.as_deref()
    }

    pub fn target_preview(&self) -> Option<&[u8]> {
        self.target_preview.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Update one slider and schedule a debounced render. Returns its ticket.
    pub fn set_param(&mut self, slider: BlendSlider, value: f32) -> u64 {
        self.params.set(slider, value);
        self.request_render(false)
    }

    pub async fn select_source(&mut self, name: &str) -> ClientResult<u64> {
        let selection = self.api.headnerf_set_source(name).await;
        let selection = selection.map_err(|e| self.record(e))?;
        self.source = Some(selection.sample);
        self.source_preview = selection.preview_png;
        Ok(self.request_render(true))
    }

    pub async fn select_target(&mut self, name: &str) -> ClientResult<u64> {
        let selection = self.api.headnerf_set_target(name).await;
        let selection = selection.map_err(|e| self.record(e))?;
        self.target = Some(selection.sample);
        self.target_preview = selection.preview_png;
        Ok(self.request_render(true))
    }

    /// All sliders back to zero, rendered immediately.
    pub fn reset(&mut self) -> u64 {
        self.params = BlendParams::default();
        self.request_render(true)
    }

    /// Fit `image` to a new sample, then reload the sample list.
    pub async fn fit(&mut self, image: &ImageAsset) -> ClientResult<FitResult> {
        let fitted = self.api.headnerf_fit(image).await;
        let fitted = fitted.map_err(|e| self.record(e))?;
        info!(fitted = %fitted.fitted_name, "head fitted");
        match self.api.headnerf_samples().await {
            Ok(samples) => self.samples = samples,
            Err(e) => warn!(error = %e, "sample reload after fit failed"),
        }
        Ok(fitted)
    }

    /// PNG bytes of the newest published render.
    pub fn latest_render(&self) -> Option<Published<Vec<u8>>> {
        self.render.latest()
    }

    pub fn watch_renders(&self) -> watch::Receiver<Option<Published<Vec<u8>>>> {
        self.render.subscribe()
    }

    pub fn render_pending(&self) -> bool {
        self.render.is_pending()
    }

    pub fn render_error(&self) -> Option<String> {
        self.render.last_error()
    }

    fn request_render(&self, immediate: bool) -> u64 {
        let api = self.api.clone();
        let params = self.params;
        let make = move || async move { api.headnerf_render(&params).await };
        if immediate {
            self.render.submit_now(make)
        } else {
            self.render.submit(make)
        }
    }

    fn record(&mut self, e: ClientError) -> ClientError {
        self.error = Some(classify::user_message(&e));
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliders_clamp_to_their_ranges() {
        let mut params = BlendParams::default();
        params.set(BlendSlider::Identity, 1.7);
        params.set(BlendSlider::Yaw, -3.0);
        params.set(BlendSlider::Albedo, f32::NAN);
        params.set(BlendSlider::Pitch, 0.25);
        assert_eq!(params.identity, 1.0);
        assert_eq!(params.yaw, -1.0);
        assert_eq!(params.albedo, 0.0);
        assert_eq!(params.get(BlendSlider::Pitch), 0.25);
    }

    #[test]
    fn slider_names_parse() {
        assert_eq!("Illumination".parse::<BlendSlider>().unwrap(), BlendSlider::Illumination);
        assert!("zoom".parse::<BlendSlider>().is_err());
    }
}
