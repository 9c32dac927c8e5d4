//! Common test utilities shared by the integration tests
//!
//! Synthetic image fixtures and a scripted `FaceLabApi` that records every call.

#![allow(dead_code)]

/// Synthetic images
pub mod fixtures {
    use facelab_client::ImageAsset;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128, 255])
        })
    }

    pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode fixture");
        bytes
    }

    pub fn png_asset(name: &str, width: u32, height: u32) -> ImageAsset {
        let bytes = encode(DynamicImage::ImageRgba8(gradient_rgba(width, height)), ImageFormat::Png);
        ImageAsset::new(name, "image/png", bytes)
    }

    /// Uncompressed, so large dimensions give large files.
    pub fn bmp_asset(name: &str, width: u32, height: u32) -> ImageAsset {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]));
        ImageAsset::new(name, "image/bmp", encode(DynamicImage::ImageRgb8(img), ImageFormat::Bmp))
    }

    pub fn text_asset(name: &str) -> ImageAsset {
        ImageAsset::new(name, "text/plain", b"not an image".to_vec())
    }
}

/// Scripted API double
pub mod mock_api {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use facelab_client::api::{
        BackgroundRemovalRequest, BlendParams, DetectedFace, FitResult, HeadSample, HeadSelection, Region,
        SampleSelection, SwapResponse,
    };
    use facelab_client::{ClientError, ClientResult, FaceLabApi, ImageAsset};

    pub const BASE: &str = "http://api.test";

    /// A canned answer: a value, or a non-2xx status with a `detail`.
    #[derive(Debug, Clone)]
    pub enum Reply<T> {
        Ok(T),
        Status(u16, &'static str),
    }

    impl<T: Clone> Reply<T> {
        fn get(&self, operation: &str) -> ClientResult<T> {
            match self {
                Reply::Ok(v) => Ok(v.clone()),
                Reply::Status(status, detail) => Err(ClientError::api_status(operation, *status, *detail)),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Health,
        Regions,
        Region(String),
        SwapSingle { source: String, target: String, target_mime: String },
        SwapMulti { sources: Vec<String>, target: String, mapping: Option<String> },
        Detect { target: String },
        RemoveBackground { mode: String, colors: Option<String>, background: bool },
        Samples,
        Current,
        SetSource(String),
        SetTarget(String),
        Render(BlendParams),
        Fit(String),
        Fetch(String),
    }

    pub struct MockApi {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub swap: Reply<SwapResponse>,
        pub faces: Reply<Vec<DetectedFace>>,
        pub regions: Vec<Region>,
        pub fetched: Reply<ImageAsset>,
        pub background: Reply<Vec<String>>,
        pub samples: Reply<Vec<HeadSample>>,
        pub current: Reply<HeadSelection>,
        pub render: Reply<()>,
        pub render_delay: Duration,
        pub fit: Reply<FitResult>,
    }

    impl Default for MockApi {
        fn default() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                swap: Reply::Ok(SwapResponse { ok: Some(true), result_url: "/results/x.png".into() }),
                faces: Reply::Ok(Vec::new()),
                regions: Vec::new(),
                fetched: Reply::Ok(super::fixtures::png_asset("x.png", 8, 6)),
                background: Reply::Ok(Vec::new()),
                samples: Reply::Ok(Vec::new()),
                current: Reply::Status(404, "Not Found"),
                render: Reply::Ok(()),
                render_delay: Duration::ZERO,
                fit: Reply::Status(500, "fit not scripted"),
            }
        }
    }

    impl MockApi {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    /// Renders encode the identity slider so tests can tell them apart.
    pub fn render_marker(params: &BlendParams) -> Vec<u8> {
        format!("identity={}", params.identity).into_bytes()
    }

    pub fn sample(name: &str) -> HeadSample {
        HeadSample { name: name.to_string(), path: format!("/samples/{name}") }
    }

    #[async_trait]
    impl FaceLabApi for MockApi {
        fn base_url(&self) -> &str {
            BASE
        }

        async fn health(&self) -> bool {
            self.record(Call::Health);
            true
        }

        async fn regions(&self) -> ClientResult<Vec<Region>> {
            self.record(Call::Regions);
            Ok(self.regions.clone())
        }

        async fn region(&self, id: &str) -> ClientResult<Region> {
            self.record(Call::Region(id.to_string()));
            self.regions
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| ClientError::api_status("get region", 404, "Region not found"))
        }

        async fn swap_single(&self, source: &ImageAsset, target: &ImageAsset) -> ClientResult<SwapResponse> {
            self.record(Call::SwapSingle {
                source: source.name().to_string(),
                target: target.name().to_string(),
                target_mime: target.mime().to_string(),
            });
            self.swap.get("face swap")
        }

        async fn swap_multi(
            &self,
            sources: &[ImageAsset],
            target: &ImageAsset,
            mapping: Option<&str>,
        ) -> ClientResult<SwapResponse> {
            self.record(Call::SwapMulti {
                sources: sources.iter().map(|s| s.name().to_string()).collect(),
                target: target.name().to_string(),
                mapping: mapping.map(str::to_string),
            });
            self.swap.get("multi face swap")
        }

        async fn detect_faces(&self, target: &ImageAsset) -> ClientResult<Vec<DetectedFace>> {
            self.record(Call::Detect { target: target.name().to_string() });
            self.faces.get("face detection")
        }

        async fn remove_background(&self, request: &BackgroundRemovalRequest) -> ClientResult<Vec<String>> {
            self.record(Call::RemoveBackground {
                mode: request.mode.to_string(),
                colors: request.colors_field(),
                background: request.background_part().is_some(),
            });
            self.background.get("background removal")
        }

        async fn headnerf_samples(&self) -> ClientResult<Vec<HeadSample>> {
            self.record(Call::Samples);
            self.samples.get("list head samples")
        }

        async fn headnerf_current(&self) -> ClientResult<HeadSelection> {
            self.record(Call::Current);
            self.current.get("current head samples")
        }

        async fn headnerf_set_source(&self, name: &str) -> ClientResult<SampleSelection> {
            self.record(Call::SetSource(name.to_string()));
            Ok(SampleSelection { sample: name.to_string(), preview_png: Some(vec![1, 2, 3]) })
        }

        async fn headnerf_set_target(&self, name: &str) -> ClientResult<SampleSelection> {
            self.record(Call::SetTarget(name.to_string()));
            Ok(SampleSelection { sample: name.to_string(), preview_png: None })
        }

        async fn headnerf_render(&self, params: &BlendParams) -> ClientResult<Vec<u8>> {
            self.record(Call::Render(*params));
            if !self.render_delay.is_zero() {
                tokio::time::sleep(self.render_delay).await;
            }
            self.render.get("head render").map(|()| render_marker(params))
        }

        async fn headnerf_fit(&self, image: &ImageAsset) -> ClientResult<FitResult> {
            self.record(Call::Fit(image.name().to_string()));
            self.fit.get("head fit")
        }

        async fn fetch_image(&self, url: &str) -> ClientResult<ImageAsset> {
            self.record(Call::Fetch(url.to_string()));
            self.fetched.get("fetch image")
        }
    }
}
