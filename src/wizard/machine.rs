//! The face-swap wizard.
//!
//! `Upload → [Mapping] → Generating → Result → [Editing]`. `Mapping` is only
//! visited in [`SwapMode::Multi`]. Every failure leaves the wizard in a stage
//! the user can act from; backend failures during generation degrade to a
//! stand-in result instead of an error.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::mapping::FaceMapping;
use super::progress::{
    Progress, ProgressTracker, STATUS_BUILDING, STATUS_DONE, STATUS_PREPARING, STATUS_PREVIEW_ONLY,
    STATUS_SWAPPING, STATUS_UPLOADING,
};
use super::stage::{Step, SwapMode, WizardStage};
use super::upload::{MultiSlot, SingleSlot, UploadTarget};
use crate::api::{DetectedFace, FaceLabApi, Region, SwapResponse};
use crate::config::ClientConfig;
use crate::core::{ImageAsset, PreviewHandle, PreviewRegistry, Slot};
use crate::error::{classify, ClientError, ClientResult};
use crate::processing::{region_preset, Adjustment, ColorEditor, ColorPreviewEngine, ImageCompressor, TonePreset};

/// What the `Result` stage shows.
#[derive(Debug, Clone)]
pub struct SwapResult {
    url: Option<String>,
    asset: Option<ImageAsset>,
    handle: Option<PreviewHandle>,
    degraded: bool,
}

impl SwapResult {
    fn remote(url: String) -> Self {
        Self { url: Some(url), asset: None, handle: None, degraded: false }
    }

    fn stand_in(asset: ImageAsset, handle: PreviewHandle) -> Self {
        Self { url: None, asset: Some(asset), handle: Some(handle), degraded: true }
    }

    /// Resolved remote URL, or the preview URL of the stand-in.
    pub fn display_url(&self) -> &str {
        self.url
            .as_deref()
            .or(self.handle.as_ref().map(PreviewHandle::url))
            .unwrap_or_default()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Local bytes, once known (stand-in, or fetched for editing).
    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

pub struct FaceSwapWizard {
    api: Arc<dyn FaceLabApi>,
    compressor: ImageCompressor,
    mode: SwapMode,
    stage: WizardStage,
    history: Vec<WizardStage>,
    previews: PreviewRegistry,
    sources: Box<dyn UploadTarget>,
    target: SingleSlot,
    region: Option<Region>,
    faces: Vec<DetectedFace>,
    mapping: FaceMapping,
    prepared_target: Option<ImageAsset>,
    progress: ProgressTracker,
    result: Option<SwapResult>,
    editor: Option<ColorEditor>,
    error: Option<String>,
    warning: Option<String>,
}

impl FaceSwapWizard {
    pub fn new(api: Arc<dyn FaceLabApi>, config: &ClientConfig, mode: SwapMode) -> Self {
        let sources: Box<dyn UploadTarget> = match mode {
            SwapMode::Single => Box::new(SingleSlot::new(Slot::Source)),
            SwapMode::Multi => Box::new(MultiSlot::new()),
        };
        Self {
            api,
            compressor: ImageCompressor::new(config.compression),
            mode,
            stage: WizardStage::Upload,
            history: vec![WizardStage::Upload],
            previews: PreviewRegistry::new(),
            sources,
            target: SingleSlot::new(Slot::Target),
            region: None,
            faces: Vec::new(),
            mapping: FaceMapping::default(),
            prepared_target: None,
            progress: ProgressTracker::new(),
            result: None,
            editor: None,
            error: None,
            warning: None,
        }
    }

    pub fn mode(&self) -> SwapMode {
        self.mode
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    /// Every stage entered since construction or the last reset.
    pub fn history(&self) -> &[WizardStage] {
        &self.history
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn sources(&self) -> &[ImageAsset] {
        self.sources.assets()
    }

    pub fn source_previews(&self) -> &[PreviewHandle] {
        self.sources.preview()
    }

    pub fn target(&self) -> Option<&ImageAsset> {
        self.target.asset()
    }

    pub fn target_preview(&self) -> Option<&PreviewHandle> {
        self.target.handle()
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Detected faces with their crop URLs already resolved.
    pub fn faces(&self) -> &[DetectedFace] {
        &self.faces
    }

    pub fn mapping(&self) -> &FaceMapping {
        &self.mapping
    }

    pub fn progress(&self) -> Progress {
        self.progress.current()
    }

    pub fn watch_progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    pub fn result(&self) -> Option<&SwapResult> {
        self.result.as_ref()
    }

    pub fn editor(&self) -> Option<&ColorEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut ColorEditor> {
        self.editor.as_mut()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Region whose color preset seeds the editor.
    pub fn select_region(&mut self, region: Option<Region>) {
        self.region = region;
    }

    pub fn set_target(&mut self, files: Vec<ImageAsset>) -> ClientResult<usize> {
        self.require(&[WizardStage::Upload], "set target")?;
        let accepted = self.target.accept(files, &mut self.previews);
        if accepted > 0 {
            self.prepared_target = None;
            self.error = None;
        }
        Ok(accepted)
    }

    pub fn set_sources(&mut self, files: Vec<ImageAsset>) -> ClientResult<usize> {
        self.require(&[WizardStage::Upload], "set sources")?;
        let accepted = self.sources.accept(files, &mut self.previews);
        if accepted > 0 {
            self.error = None;
        }
        Ok(accepted)
    }

    /// Both a target and at least one source are present.
    pub fn can_proceed(&self) -> bool {
        self.stage == WizardStage::Upload && !self.target.is_empty() && !self.sources.is_empty()
    }

    /// Leave `Upload`: single mode generates straight away, multi mode
    /// detects faces and moves to `Mapping`.
    pub async fn proceed(&mut self) -> ClientResult<Step> {
        self.require(&[WizardStage::Upload], "proceed")?;
        if !self.can_proceed() {
            debug!(mode = %self.mode, "proceed ignored, uploads incomplete");
            return Ok(Step::Disabled);
        }
        match self.mode {
            SwapMode::Single => self.run_generation().await,
            SwapMode::Multi => self.enter_mapping().await,
        }
    }

    pub async fn generate(&mut self) -> ClientResult<Step> {
        match (self.stage, self.mode) {
            (WizardStage::Mapping, SwapMode::Multi) => self.run_generation().await,
            (WizardStage::Upload, SwapMode::Single) => self.proceed().await,
            (stage, mode) => Err(ClientError::state(
                stage,
                "generate",
                format!("{mode} swaps generate from {}", match mode {
                    SwapMode::Single => WizardStage::Upload,
                    SwapMode::Multi => WizardStage::Mapping,
                }),
            )),
        }
    }

    pub fn assign_face(&mut self, target: u32, source: i32) -> ClientResult<()> {
        self.require(&[WizardStage::Mapping], "assign face")?;
        self.mapping.assign(target, source, self.sources.assets().len())
    }

    pub fn back_to_upload(&mut self) -> ClientResult<()> {
        self.require(&[WizardStage::Mapping], "back to upload")?;
        self.faces.clear();
        self.mapping = FaceMapping::default();
        self.error = None;
        self.enter(WizardStage::Upload);
        Ok(())
    }

    /// Load the result into a color editor. A remote result is fetched once
    /// and kept; the selected region's preset seeds the sliders.
    pub async fn enter_editing(&mut self) -> ClientResult<Step> {
        self.require(&[WizardStage::Result], "edit colors")?;
        let (cached, url) = match &self.result {
            Some(r) => (r.asset.clone(), r.url.clone()),
            None => (None, None),
        };
        let asset = match (cached, url) {
            (Some(asset), _) => asset,
            (None, Some(url)) => match self.api.fetch_image(&url).await {
                Ok(asset) => asset,
                Err(e) => return Err(self.surface(e)),
            },
            (None, None) => {
                return Err(ClientError::state(self.stage, "edit colors", "no result to edit"));
            }
        };
        let engine = match ColorPreviewEngine::load(&asset) {
            Ok(engine) => engine,
            Err(e) => return Err(self.surface(e)),
        };
        if let Some(result) = self.result.as_mut() {
            result.asset = Some(asset);
        }

        let mut editor = ColorEditor::new(engine);
        if let Some(region) = &self.region {
            debug!(region = %region.id, "seeding editor from region preset");
            editor = editor.with_region_preset(region_preset(&region.color_settings));
        }
        self.editor = Some(editor);
        self.error = None;
        self.enter(WizardStage::Editing);
        Ok(Step::Advanced(WizardStage::Editing))
    }

    pub fn adjust(&mut self, which: Adjustment, value: f32) -> ClientResult<()> {
        self.editing("adjust")?.set(which, value);
        Ok(())
    }

    pub fn apply_tone(&mut self, preset: TonePreset) -> ClientResult<()> {
        self.editing("apply tone preset")?.apply_tone_preset(preset);
        Ok(())
    }

    pub fn reset_adjustments(&mut self) -> ClientResult<()> {
        self.editing("reset adjustments")?.reset();
        Ok(())
    }

    /// PNG of what the editor currently shows.
    pub fn export(&mut self) -> ClientResult<ImageAsset> {
        self.editing("export")?.export()
    }

    pub fn back_to_result(&mut self) -> ClientResult<()> {
        self.require(&[WizardStage::Editing], "back to result")?;
        self.editor = None;
        self.enter(WizardStage::Result);
        Ok(())
    }

    /// Back to an empty `Upload` from anywhere, releasing every preview.
    pub fn reset(&mut self) {
        let released = self.previews.clear_all();
        self.sources.clear(&mut self.previews);
        self.target.clear(&mut self.previews);
        self.region = None;
        self.faces.clear();
        self.mapping = FaceMapping::default();
        self.prepared_target = None;
        self.progress.clear();
        self.result = None;
        self.editor = None;
        self.error = None;
        self.warning = None;
        self.stage = WizardStage::Upload;
        self.history = vec![WizardStage::Upload];
        info!(released, "wizard reset");
    }

    fn require(&self, allowed: &[WizardStage], operation: &str) -> ClientResult<()> {
        if allowed.contains(&self.stage) {
            return Ok(());
        }
        let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        Err(ClientError::state(
            self.stage,
            operation,
            format!("only allowed in {}", allowed.join(" or ")),
        ))
    }

    fn editing(&mut self, operation: &str) -> ClientResult<&mut ColorEditor> {
        self.require(&[WizardStage::Editing], operation)?;
        self.editor
            .as_mut()
            .ok_or_else(|| ClientError::state(WizardStage::Editing, operation, "editor not loaded"))
    }

    fn enter(&mut self, next: WizardStage) {
        if self.stage != next {
            debug!(from = %self.stage, to = %next, "wizard transition");
            self.stage = next;
            self.history.push(next);
        }
    }

    /// Record `e` for display and hand it back to the caller.
    fn surface(&mut self, e: ClientError) -> ClientError {
        warn!(stage = %self.stage, error = %e, "wizard action failed");
        self.error = Some(classify::user_message(&e));
        e
    }

    async fn enter_mapping(&mut self) -> ClientResult<Step> {
        self.enter(WizardStage::Mapping);
        self.error = None;
        self.warning = None;

        let target = match self.prepare_target().await {
            Ok(target) => target,
            Err(e) => {
                let e = self.surface(e);
                self.enter(WizardStage::Upload);
                return Err(e);
            }
        };

        match self.api.detect_faces(&target).await {
            Ok(faces) => {
                info!(count = faces.len(), "faces detected");
                self.mapping = FaceMapping::for_faces(faces.iter().map(|f| f.index));
                let api = &self.api;
                self.faces = faces
                    .into_iter()
                    .map(|f| DetectedFace { index: f.index, url: api.resolve(&f.url) })
                    .collect();
            }
            Err(e) => {
                self.faces.clear();
                self.mapping = FaceMapping::default();
                self.surface(e);
            }
        }
        Ok(Step::Advanced(WizardStage::Mapping))
    }

    /// Compressed target, computed once per selected target.
    async fn prepare_target(&mut self) -> ClientResult<ImageAsset> {
        if let Some(prepared) = &self.prepared_target {
            return Ok(prepared.clone());
        }
        let original = self
            .target
            .asset()
            .cloned()
            .ok_or_else(|| ClientError::validation("target", "an image is required", "none"))?;
        let prepared = self.compressor.compress_async(original).await?;
        self.prepared_target = Some(prepared.clone());
        Ok(prepared)
    }

    async fn run_generation(&mut self) -> ClientResult<Step> {
        let origin = self.stage;
        self.enter(WizardStage::Generating);
        self.error = None;
        self.warning = None;
        self.progress.clear();
        self.progress.advance(0, STATUS_PREPARING);

        let target = match self.prepare_target().await {
            Ok(target) => target,
            Err(e) => return Err(self.abort_generation(origin, e)),
        };
        let sources = match self.compressor.compress_all(self.sources.assets().to_vec()).await {
            Ok(sources) => sources,
            Err(e) => return Err(self.abort_generation(origin, e)),
        };

        self.progress.advance(10, STATUS_UPLOADING);
        let mapping = std::mem::take(&mut self.mapping).to_wire();
        self.progress.advance(30, STATUS_SWAPPING);
        let response = match (self.mode, sources.first()) {
            (SwapMode::Single, Some(source)) => self.api.swap_single(source, &target).await,
            (SwapMode::Multi, Some(_)) => self.api.swap_multi(&sources, &target, mapping.as_deref()).await,
            (_, None) => {
                let e = ClientError::validation("sources", "at least one image is required", "0");
                return Err(self.abort_generation(origin, e));
            }
        };
        let response = response.and_then(|r| match r {
            SwapResponse { ok: Some(false), .. } => {
                Err(ClientError::api_rejected("face swap", "the service reported a failed swap"))
            }
            ok => Ok(ok),
        });

        let step = match response {
            Ok(swap) => {
                self.progress.advance(90, STATUS_BUILDING);
                let url = self.api.resolve(&swap.result_url);
                info!(%url, mode = %self.mode, "swap finished");
                self.previews.revoke(Slot::Result);
                self.result = Some(SwapResult::remote(url));
                Step::Advanced(WizardStage::Result)
            }
            Err(e) if classify::is_degradable(&e) => {
                warn!(error = %e, "swap service unavailable, showing target as stand-in");
                self.progress.advance(90, STATUS_PREVIEW_ONLY);
                self.warning = Some(format!(
                    "Face swap unavailable ({}); showing the original target",
                    classify::user_message(&e)
                ));
                let original = self.target.asset().cloned().unwrap_or(target);
                let handle = self.previews.set_preview(Slot::Result, original.clone());
                self.result = Some(SwapResult::stand_in(original, handle));
                Step::Degraded
            }
            Err(e) => return Err(self.abort_generation(origin, e)),
        };
        self.progress.advance(100, STATUS_DONE);
        self.enter(WizardStage::Result);
        Ok(step)
    }

    fn abort_generation(&mut self, origin: WizardStage, e: ClientError) -> ClientError {
        self.progress.clear();
        let e = self.surface(e);
        self.enter(origin);
        e
    }
}
