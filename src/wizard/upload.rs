//! Upload targets.
//!
//! Two explicit variants behind one interface: [`SingleSlot`] holds at most one
//! image, [`MultiSlot`] holds an ordered list. The variant is chosen once when
//! the owning view is built. Non-image files are ignored by both.

use tracing::debug;

use crate::core::{ImageAsset, PreviewHandle, PreviewRegistry, Slot};

pub trait UploadTarget: Send {
    /// Take the image files from `files`. Returns how many were accepted;
    /// zero leaves the current contents untouched.
    fn accept(&mut self, files: Vec<ImageAsset>, previews: &mut PreviewRegistry) -> usize;

    /// Live preview handles, in display order.
    fn preview(&self) -> &[PreviewHandle];

    fn assets(&self) -> &[ImageAsset];

    /// Drop everything and release the previews.
    fn clear(&mut self, previews: &mut PreviewRegistry);

    fn is_empty(&self) -> bool {
        self.assets().is_empty()
    }
}

#[derive(Debug)]
pub struct SingleSlot {
    slot: Slot,
    asset: Option<ImageAsset>,
    handle: Option<PreviewHandle>,
}

impl SingleSlot {
    pub fn new(slot: Slot) -> Self {
        Self { slot, asset: None, handle: None }
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn handle(&self) -> Option<&PreviewHandle> {
        self.handle.as_ref()
    }
}

impl UploadTarget for SingleSlot {
    fn accept(&mut self, files: Vec<ImageAsset>, previews: &mut PreviewRegistry) -> usize {
        let Some(asset) = files.into_iter().find(ImageAsset::is_image) else {
            return 0;
        };
        self.handle = Some(previews.set_preview(self.slot, asset.clone()));
        self.asset = Some(asset);
        1
    }

    fn preview(&self) -> &[PreviewHandle] {
        self.handle.as_slice()
    }

    fn assets(&self) -> &[ImageAsset] {
        self.asset.as_slice()
    }

    fn clear(&mut self, previews: &mut PreviewRegistry) {
        previews.revoke(self.slot);
        self.asset = None;
        self.handle = None;
    }
}

/// Ordered source list. A new selection replaces the previous one as a whole.
#[derive(Debug, Default)]
pub struct MultiSlot {
    assets: Vec<ImageAsset>,
    handles: Vec<PreviewHandle>,
}

impl MultiSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UploadTarget for MultiSlot {
    fn accept(&mut self, files: Vec<ImageAsset>, previews: &mut PreviewRegistry) -> usize {
        let images: Vec<ImageAsset> = files.into_iter().filter(ImageAsset::is_image).collect();
        if images.is_empty() {
            return 0;
        }
        let keep = images.len();
        let dropped = previews.revoke_where(|s| matches!(s, Slot::SourceAt(i) if i >= keep));
        debug!(accepted = keep, dropped, "replacing multi-source selection");

        self.handles = images
            .iter()
            .enumerate()
            .map(|(i, a)| previews.set_preview(Slot::SourceAt(i), a.clone()))
            .collect();
        self.assets = images;
        keep
    }

    fn preview(&self) -> &[PreviewHandle] {
        &self.handles
    }

    fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    fn clear(&mut self, previews: &mut PreviewRegistry) {
        previews.revoke_where(|s| matches!(s, Slot::SourceAt(_)));
        self.assets.clear();
        self.handles.clear();
    }
}
