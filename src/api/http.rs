//! reqwest-backed implementation of [`FaceLabApi`].

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::*;
use super::{FaceLabApi, resolve_url};
use crate::config::ClientConfig;
use crate::core::ImageAsset;
use crate::error::{ClientError, ClientResult, UNKNOWN_ERROR_DETAIL};

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    pub fn new(base: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::network("build http client", e))?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.api_base.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> ClientResult<T> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::network(operation, e).with_context("decoding response body"))
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> ClientResult<reqwest::Response> {
        debug!(operation, "sending request");
        let response = request.send().await.map_err(|e| {
            warn!(operation, error = %e, "request failed");
            ClientError::network(operation, e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!(operation, status = status.as_u16(), %detail, "request rejected");
        Err(ClientError::api_status(operation, status.as_u16(), detail))
    }

    async fn select_sample(&self, operation: &str, path: &str, name: &str) -> ClientResult<SampleSelection> {
        let request = self.client.post(self.url(path)).query(&[("sample_name", name)]);
        let response: SampleSelectionResponse = self.send_json(operation, request).await?;
        if !response.ok {
            return Err(ClientError::api_rejected(
                operation,
                response.error.unwrap_or_else(|| format!("failed to select sample '{name}'")),
            ));
        }
        Ok(SampleSelection {
            sample: response.sample.unwrap_or_else(|| name.to_string()),
            preview_png: response.preview_base64.as_deref().map(|b| STANDARD.decode(b)).transpose()?,
        })
    }
}

/// Multipart file part named after the asset, typed with its MIME.
fn file_part(operation: &str, asset: &ImageAsset) -> ClientResult<Part> {
    Part::bytes(asset.bytes().to_vec())
        .file_name(asset.name().to_string())
        .mime_str(asset.mime())
        .map_err(|e| ClientError::network(operation, e).with_context(format!("mime '{}'", asset.mime())))
}

/// Server `detail`, or the generic message when the body has none.
pub(crate) fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body).ok().and_then(|b| b.detail) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::String(_) | serde_json::Value::Null) | None => UNKNOWN_ERROR_DETAIL.to_string(),
        Some(other) => other.to_string(),
    }
}

fn file_name_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|p| p.rsplit('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("result.png")
        .to_string()
}

#[async_trait]
impl FaceLabApi for HttpApi {
    fn base_url(&self) -> &str {
        &self.base
    }

    async fn health(&self) -> bool {
        let request = self.client.get(self.url("/health"));
        match self.send_json::<HealthResponse>("health", request).await {
            Ok(h) => h.status == "ok",
            Err(_) => false,
        }
    }

    async fn regions(&self) -> ClientResult<Vec<Region>> {
        let request = self.client.get(self.url("/api/regions"));
        let list: RegionList = self.send_json("list regions", request).await?;
        Ok(list.regions)
    }

    async fn region(&self, id: &str) -> ClientResult<Region> {
        let request = self.client.get(self.url(&format!("/api/regions/{id}")));
        self.send_json("get region", request).await
    }

    async fn swap_single(&self, source: &ImageAsset, target: &ImageAsset) -> ClientResult<SwapResponse> {
        const OP: &str = "face swap";
        let form = Form::new()
            .part("src", file_part(OP, source)?)
            .part("dst", file_part(OP, target)?);
        let request = self.client.post(self.url("/api/simswap")).multipart(form);
        self.send_json(OP, request).await
    }

    async fn swap_multi(
        &self,
        sources: &[ImageAsset],
        target: &ImageAsset,
        mapping: Option<&str>,
    ) -> ClientResult<SwapResponse> {
        const OP: &str = "multi face swap";
        let mut form = Form::new();
        for source in sources {
            form = form.part("src", file_part(OP, source)?);
        }
        form = form.part("dst", file_part(OP, target)?);
        if let Some(mapping) = mapping.filter(|m| !m.is_empty()) {
            form = form.text("mapping", mapping.to_string());
        }
        let request = self.client.post(self.url("/api/simswap_multi_upload")).multipart(form);
        self.send_json(OP, request).await
    }

    async fn detect_faces(&self, target: &ImageAsset) -> ClientResult<Vec<DetectedFace>> {
        const OP: &str = "face detection";
        let form = Form::new().part("dst", file_part(OP, target)?);
        let request = self.client.post(self.url("/api/simswap_multi_detect")).multipart(form);
        let response: DetectResponse = self.send_json(OP, request).await?;
        if !response.ok {
            return Err(ClientError::api_rejected(
                OP,
                response.error.unwrap_or_else(|| "Face detection failed".to_string()),
            ));
        }
        Ok(response.faces)
    }

    async fn remove_background(&self, request: &BackgroundRemovalRequest) -> ClientResult<Vec<String>> {
        const OP: &str = "background removal";
        let mut form = Form::new()
            .part("image", file_part(OP, &request.image)?)
            .text("mode", request.mode.as_str());
        if let Some(colors) = request.colors_field() {
            form = form.text("colors", colors);
        }
        if let Some(bg) = request.background_part() {
            form = form.part("bg_image", file_part(OP, bg)?);
        }
        let http = self.client.post(self.url("/api/background_removal")).multipart(form);
        let response: BackgroundRemovalResponse = self.send_json(OP, http).await?;
        if !response.ok {
            return Err(ClientError::api_rejected(
                OP,
                response.error.unwrap_or_else(|| "Background removal failed".to_string()),
            ));
        }
        Ok(response.results)
    }

    async fn headnerf_samples(&self) -> ClientResult<Vec<HeadSample>> {
        let request = self.client.get(self.url("/api/headnerf/samples"));
        self.send_json("list head samples", request).await
    }

    async fn headnerf_current(&self) -> ClientResult<HeadSelection> {
        let request = self.client.get(self.url("/api/headnerf/current"));
        self.send_json("current head samples", request).await
    }

    async fn headnerf_set_source(&self, name: &str) -> ClientResult<SampleSelection> {
        self.select_sample("set head source", "/api/headnerf/set_source", name).await
    }

    async fn headnerf_set_target(&self, name: &str) -> ClientResult<SampleSelection> {
        self.select_sample("set head target", "/api/headnerf/set_target", name).await
    }

    async fn headnerf_render(&self, params: &BlendParams) -> ClientResult<Vec<u8>> {
        const OP: &str = "head render";
        let request = self.client.get(self.url("/api/headnerf/render")).query(&params.query());
        let response: RenderResponse = self.send_json(OP, request).await?;
        match (response.ok, response.image) {
            (true, Some(image)) => Ok(STANDARD.decode(image)?),
            (_, _) => Err(ClientError::api_rejected(
                OP,
                response.error.unwrap_or_else(|| "HeadNeRF render failed".to_string()),
            )),
        }
    }

    async fn headnerf_fit(&self, image: &ImageAsset) -> ClientResult<FitResult> {
        const OP: &str = "head fit";
        let form = Form::new().part("image", file_part(OP, image)?);
        let request = self.client.post(self.url("/api/headnerf/fit")).multipart(form);
        let response: FitResponse = self.send_json(OP, request).await?;
        if !response.ok {
            return Err(ClientError::api_rejected(
                OP,
                response.error.unwrap_or_else(|| "HeadNeRF fitting failed".to_string()),
            ));
        }
        Ok(FitResult {
            fitted_name: response.fitted_name.unwrap_or_default(),
            result_png: response.result_image.as_deref().map(|b| STANDARD.decode(b)).transpose()?,
        })
    }

    async fn fetch_image(&self, url: &str) -> ClientResult<ImageAsset> {
        const OP: &str = "fetch image";
        let url = resolve_url(&self.base, url);
        let response = self.send(OP, self.client.get(&url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::network(OP, e))?;
        Ok(ImageAsset::sniffed(file_name_from_url(&url), bytes.to_vec()))
    }
}
