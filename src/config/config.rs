//! # Client Configuration
//!
//! Configuration structures and validation shared by the CLI and any embedding
//! UI. Values start from [`Default`], are overlaid from the environment with
//! [`ClientConfig::from_env`], then from explicit flags, and are checked once
//! with [`ClientConfig::validate`] before the session is built.
//!
//! ## Parameters
//!
//! | Parameter | Env var | Default | Description |
//! |-----------|---------|---------|-------------|
//! | `api_base` | `FACELAB_API_BASE` | `http://localhost:8000` | Base URL of the FaceLab HTTP API |
//! | `render_debounce` | `FACELAB_DEBOUNCE_MS` | 100 ms | Quiet period before a slider render is issued |
//! | `auth.url` | `FACELAB_AUTH_URL` | unset | Identity provider project URL |
//! | `auth.anon_key` | `FACELAB_AUTH_ANON_KEY` | unset | Identity provider public key |
//!
//! ## Examples
//!
//! ```rust
//! use facelab_client::config::ClientConfig;
//!
//! let config = ClientConfig::default();
//! assert_eq!(config.api_base, "http://localhost:8000");
//! assert!(config.validate().is_ok());
//! assert!(!config.auth.is_configured());
//! ```

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

pub const ENV_API_BASE: &str = "FACELAB_API_BASE";
pub const ENV_DEBOUNCE_MS: &str = "FACELAB_DEBOUNCE_MS";
pub const ENV_AUTH_URL: &str = "FACELAB_AUTH_URL";
pub const ENV_AUTH_ANON_KEY: &str = "FACELAB_AUTH_ANON_KEY";

/// Limits applied by the image compressor before upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// Lossy encoder quality in (0, 1].
    pub quality: f32,
    /// Assets at or under this size are passed through untouched.
    pub max_size_bytes: u64,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1920,
            quality: 0.85,
            max_size_bytes: 2 * 1024 * 1024,
        }
    }
}

impl CompressOptions {
    pub fn validate(&self) -> ClientResult<()> {
        if self.max_width == 0 {
            return Err(ClientError::config("max_width", "0", "must be greater than 0"));
        }
        if self.max_height == 0 {
            return Err(ClientError::config("max_height", "0", "must be greater than 0"));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ClientError::config(
                "quality",
                self.quality.to_string(),
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Encoder quality on the 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Identity provider settings. Either value missing means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl AuthConfig {
    pub fn new(url: Option<String>, anon_key: Option<String>) -> Self {
        Self {
            url: non_empty(url),
            anon_key: non_empty(anon_key),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the HTTP API, without a trailing slash.
    pub api_base: String,
    /// Upload compression limits.
    pub compression: CompressOptions,
    /// Quiet period before a debounced render is issued.
    pub render_debounce: Duration,
    /// Identity provider settings.
    pub auth: AuthConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            compression: CompressOptions::default(),
            render_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            auth: AuthConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(&api_base.into()),
            ..Self::default()
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let mut config = Self::default();
        if let Some(base) = non_empty(lookup(ENV_API_BASE)) {
            config.api_base = normalize_base(&base);
        }
        if let Some(ms) = non_empty(lookup(ENV_DEBOUNCE_MS)) {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| ClientError::config(ENV_DEBOUNCE_MS, ms.clone(), "must be an integer"))?;
            config.render_debounce = Duration::from_millis(ms);
        }
        config.auth = AuthConfig::new(lookup(ENV_AUTH_URL), lookup(ENV_AUTH_ANON_KEY));
        Ok(config)
    }

    pub fn with_api_base(mut self, base: impl AsRef<str>) -> Self {
        self.api_base = normalize_base(base.as_ref());
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ClientError::config(
                "api_base",
                self.api_base.clone(),
                "must start with http:// or https://",
            ));
        }
        if self.render_debounce.is_zero() {
            return Err(ClientError::config("render_debounce", "0", "must be greater than 0ms"));
        }
        self.compression.validate()
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
