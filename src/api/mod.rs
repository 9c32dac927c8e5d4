//! # FaceLab HTTP API
//!
//! [`FaceLabApi`] is the seam between the client core and the remote AI
//! services. [`HttpApi`] speaks the JSON/multipart contract over reqwest; tests
//! and embedders can substitute their own implementation.
//!
//! | Operation | Method/Path |
//! |---|---|
//! | List regions | GET `/api/regions` |
//! | One region | GET `/api/regions/{id}` |
//! | Single face swap | POST `/api/simswap` (`src`, `dst`) |
//! | Multi face swap | POST `/api/simswap_multi_upload` (`src`…, `dst`, `mapping`?) |
//! | Detect target faces | POST `/api/simswap_multi_detect` (`dst`) |
//! | Background removal | POST `/api/background_removal` (`image`, `mode`, `colors`?, `bg_image`?) |
//! | Head samples | GET `/api/headnerf/samples` |
//! | Head selection | GET `/api/headnerf/current`, POST `/api/headnerf/set_{source,target}?sample_name=` |
//! | Head render | GET `/api/headnerf/render?identity&expression&albedo&illumination&pitch&yaw&roll` |
//! | Head fit | POST `/api/headnerf/fit` (`image`) |
//! | Health | GET `/health` |
//!
//! Any non-2xx status becomes a `Network` error carrying the body's `detail`.

mod http;
pub mod models;

use async_trait::async_trait;

pub use http::HttpApi;
pub use models::{
    BackgroundMode, BackgroundRemovalRequest, BlendParams, ColorSettings, DetectedFace, FitResult, HeadSample,
    HeadSelection, Region, RgbColor, SampleSelection, SwapResponse,
};

use crate::core::ImageAsset;
use crate::error::ClientResult;

/// Resolve a result reference against the API base. Absolute `http…`
/// references pass through unchanged.
pub fn resolve_url(base: &str, path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

#[async_trait]
pub trait FaceLabApi: Send + Sync {
    /// Base URL every relative reference resolves against.
    fn base_url(&self) -> &str;

    fn resolve(&self, path: &str) -> String {
        resolve_url(self.base_url(), path)
    }

    /// True only when the service answers `{status: "ok"}`.
    async fn health(&self) -> bool;

    async fn regions(&self) -> ClientResult<Vec<Region>>;

    async fn region(&self, id: &str) -> ClientResult<Region>;

    async fn swap_single(&self, source: &ImageAsset, target: &ImageAsset) -> ClientResult<SwapResponse>;

    /// `mapping` is the comma-joined `target:source` wire string; `None` or
    /// empty omits the field.
    async fn swap_multi(
        &self,
        sources: &[ImageAsset],
        target: &ImageAsset,
        mapping: Option<&str>,
    ) -> ClientResult<SwapResponse>;

    async fn detect_faces(&self, target: &ImageAsset) -> ClientResult<Vec<DetectedFace>>;

    /// Result references as returned by the server (unresolved).
    async fn remove_background(&self, request: &BackgroundRemovalRequest) -> ClientResult<Vec<String>>;

    async fn headnerf_samples(&self) -> ClientResult<Vec<HeadSample>>;

    async fn headnerf_current(&self) -> ClientResult<HeadSelection>;

    async fn headnerf_set_source(&self, name: &str) -> ClientResult<SampleSelection>;

    async fn headnerf_set_target(&self, name: &str) -> ClientResult<SampleSelection>;

    /// Decoded PNG bytes of the rendered head.
    async fn headnerf_render(&self, params: &BlendParams) -> ClientResult<Vec<u8>>;

    async fn headnerf_fit(&self, image: &ImageAsset) -> ClientResult<FitResult>;

    /// Download an image by reference (relative references are resolved first).
    async fn fetch_image(&self, url: &str) -> ClientResult<ImageAsset>;
}
