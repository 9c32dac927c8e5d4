//! # FaceLab Client Core
//!
//! The client-side engine of the FaceLab face-swap application: everything
//! between the user's files and the remote AI services, without a UI.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `core`: image assets, the preview-handle registry and the latest-pending request slot
//! - `processing`: upload compression, the color-adjustment model and the preview engine
//! - `api`: the `FaceLabApi` seam and its reqwest implementation
//! - `wizard`: the staged face-swap flow with degraded fallback
//! - `tools`: background removal and HeadNeRF blending
//! - `auth`: an explicit sign-in session context
//! - `config` and `error`: configuration and the crate-wide error type
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use facelab_client::{ClientConfig, FaceSwapWizard, HttpApi, ImageAsset, SwapMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(HttpApi::from_config(&config)?);
//! let mut wizard = FaceSwapWizard::new(api, &config, SwapMode::Single);
//!
//! wizard.set_sources(vec![ImageAsset::from_path("me.jpg").await?])?;
//! wizard.set_target(vec![ImageAsset::from_path("poster.jpg").await?])?;
//! wizard.proceed().await?;
//!
//! if let Some(result) = wizard.result() {
//!     println!("{}", result.display_url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod processing;
pub mod tools;
pub mod wizard;

pub use api::{FaceLabApi, HttpApi};
pub use auth::SessionContext;
pub use config::{ClientConfig, CompressOptions};
pub use core::{ImageAsset, PreviewHandle, PreviewRegistry, Slot};
pub use error::{ClientError, ClientResult, HasRecoverySuggestion, HasSeverity, Recoverable};
pub use processing::{Adjustment, ColorAdjustment, ColorEditor, ImageCompressor, TonePreset};
pub use tools::{BackgroundRemovalTool, HeadNerfTool};
pub use wizard::{FaceSwapWizard, Step, SwapMode, WizardStage};
