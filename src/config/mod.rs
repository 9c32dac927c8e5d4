//! # Configuration Module
//!
//! Client configuration: API base URL, compression limits, render debounce
//! window and identity-provider settings.

pub mod config;

pub use config::{AuthConfig, ClientConfig, CompressOptions};
