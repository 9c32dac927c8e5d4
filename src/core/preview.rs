//! # Preview Handle Registry
//!
//! Tracks the short-lived handles the UI uses to display a local
//! [`ImageAsset`] without re-reading its bytes, and guarantees each handle is
//! released exactly once.
//!
//! ## Rules
//!
//! - At most one live handle per [`Slot`]. [`PreviewRegistry::set_preview`]
//!   releases the previous handle for the slot before issuing a new one.
//! - [`PreviewRegistry::clear_all`] releases every live handle. Dropping the
//!   registry does the same, so a session going out of scope cleans up.
//! - Release is irreversible. Resolving a released handle yields
//!   [`Resolved::Revoked`] (the "broken image" state) instead of panicking.
//! - Every release runs the callbacks registered for that handle, in
//!   registration order.
//!
//! ```rust
//! use facelab_client::core::{ImageAsset, PreviewRegistry, Slot};
//!
//! let mut previews = PreviewRegistry::new();
//! let first = previews.set_preview(Slot::Target, ImageAsset::new("a.png", "image/png", vec![1u8]));
//! let second = previews.set_preview(Slot::Target, ImageAsset::new("b.png", "image/png", vec![2u8]));
//!
//! assert!(previews.resolve(&first).is_revoked());
//! assert!(previews.resolve(&second).asset().is_some());
//! assert_eq!(previews.live_count(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::asset::ImageAsset;

/// Logical display position a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Single-mode source face
    Source,
    /// Target image
    Target,
    /// Multi-mode source face at the given index
    SourceAt(usize),
    /// Result shown after generation
    Result,
    /// Main image of the background-removal tool
    Image,
    /// Custom background for the background-removal tool
    Background,
    /// Image uploaded for HeadNeRF fitting
    FitImage,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Source => write!(f, "source"),
            Slot::Target => write!(f, "target"),
            Slot::SourceAt(i) => write!(f, "source[{i}]"),
            Slot::Result => write!(f, "result"),
            Slot::Image => write!(f, "image"),
            Slot::Background => write!(f, "background"),
            Slot::FitImage => write!(f, "fit_image"),
        }
    }
}

/// Opaque reference to a previewable asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: u64,
    slot: Slot,
    url: String,
}

impl PreviewHandle {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Display URL, `blob:facelab/<id>`.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Outcome of resolving a handle.
#[derive(Debug)]
pub enum Resolved<'a> {
    Live(&'a ImageAsset),
    Revoked,
}

impl<'a> Resolved<'a> {
    pub fn asset(&self) -> Option<&'a ImageAsset> {
        match self {
            Resolved::Live(asset) => Some(asset),
            Resolved::Revoked => None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, Resolved::Revoked)
    }
}

type ReleaseFn = Box<dyn FnOnce(&PreviewHandle) + Send>;

struct LiveEntry {
    handle: PreviewHandle,
    asset: ImageAsset,
    on_release: Vec<ReleaseFn>,
}

/// Per-slot counters, kept for the lifetime of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub created: u64,
    pub revoked: u64,
}

impl SlotStats {
    pub fn live(&self) -> u64 {
        self.created - self.revoked
    }
}

/// Single owner of every live preview handle in a session.
#[derive(Default)]
pub struct PreviewRegistry {
    next_id: u64,
    live: HashMap<Slot, LiveEntry>,
    stats: HashMap<Slot, SlotStats>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle for `asset` in `slot`, releasing the slot's previous handle first.
    pub fn set_preview(&mut self, slot: Slot, asset: ImageAsset) -> PreviewHandle {
        self.revoke(slot);

        self.next_id += 1;
        let handle = PreviewHandle {
            id: self.next_id,
            slot,
            url: format!("blob:facelab/{:016x}", self.next_id),
        };
        debug!(%slot, url = %handle.url, asset = asset.name(), "preview created");

        self.stats.entry(slot).or_default().created += 1;
        self.live.insert(
            slot,
            LiveEntry {
                handle: handle.clone(),
                asset,
                on_release: Vec::new(),
            },
        );
        handle
    }

    /// Register a callback that runs when `handle` is released.
    /// Returns `false` if the handle is no longer live.
    pub fn on_release(
        &mut self,
        handle: &PreviewHandle,
        callback: impl FnOnce(&PreviewHandle) + Send + 'static,
    ) -> bool {
        match self.live.get_mut(&handle.slot) {
            Some(entry) if entry.handle.id == handle.id => {
                entry.on_release.push(Box::new(callback));
                true
            }
            _ => false,
        }
    }

    /// Release the live handle of `slot`, if any.
    pub fn revoke(&mut self, slot: Slot) -> bool {
        let Some(entry) = self.live.remove(&slot) else {
            return false;
        };
        self.stats.entry(slot).or_default().revoked += 1;
        debug!(%slot, url = %entry.handle.url, "preview revoked");
        for callback in entry.on_release {
            callback(&entry.handle);
        }
        true
    }

    /// Release every slot matching `pred`. Returns how many were released.
    pub fn revoke_where(&mut self, pred: impl Fn(Slot) -> bool) -> usize {
        let mut slots: Vec<Slot> = self.live.keys().copied().filter(|s| pred(*s)).collect();
        slots.sort();
        slots.into_iter().filter(|s| self.revoke(*s)).count()
    }

    /// Release every live handle. Returns how many were released.
    pub fn clear_all(&mut self) -> usize {
        self.revoke_where(|_| true)
    }

    pub fn resolve(&self, handle: &PreviewHandle) -> Resolved<'_> {
        match self.live.get(&handle.slot) {
            Some(entry) if entry.handle.id == handle.id => Resolved::Live(&entry.asset),
            _ => Resolved::Revoked,
        }
    }

    /// Current live handle for `slot`.
    pub fn handle(&self, slot: Slot) -> Option<&PreviewHandle> {
        self.live.get(&slot).map(|e| &e.handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self, slot: Slot) -> SlotStats {
        self.stats.get(&slot).copied().unwrap_or_default()
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.clear_all();
    }
}

impl fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<_> = self.live.keys().collect();
        slots.sort();
        f.debug_struct("PreviewRegistry").field("live", &slots).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn asset(tag: u8) -> ImageAsset {
        ImageAsset::new(format!("{tag}.png"), "image/png", vec![tag])
    }

    #[test]
    fn n_replacements_leave_one_live() {
        let mut previews = PreviewRegistry::new();
        let handles: Vec<_> = (0..5).map(|i| previews.set_preview(Slot::Source, asset(i))).collect();

        let stats = previews.stats(Slot::Source);
        assert_eq!(stats, SlotStats { created: 5, revoked: 4 });
        assert_eq!(stats.live(), 1);
        for h in &handles[..4] {
            assert!(previews.resolve(h).is_revoked());
        }
        assert_eq!(previews.resolve(&handles[4]).asset().map(|a| a.name()), Some("4.png"));
    }

    #[test]
    fn slots_are_independent() {
        let mut previews = PreviewRegistry::new();
        previews.set_preview(Slot::Source, asset(1));
        previews.set_preview(Slot::Target, asset(2));
        previews.set_preview(Slot::SourceAt(0), asset(3));
        previews.set_preview(Slot::SourceAt(1), asset(4));
        assert_eq!(previews.live_count(), 4);

        assert_eq!(previews.revoke_where(|s| matches!(s, Slot::SourceAt(_))), 2);
        assert_eq!(previews.live_count(), 2);
        assert!(previews.handle(Slot::Target).is_some());
    }

    #[test]
    fn release_callbacks_fire_once() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut previews = PreviewRegistry::new();
        let first = previews.set_preview(Slot::Result, asset(1));
        let sink = released.clone();
        assert!(previews.on_release(&first, move |h| sink.lock().unwrap().push(h.url().to_string())));

        previews.set_preview(Slot::Result, asset(2));
        assert!(!previews.on_release(&first, |_| panic!("stale handle must not register")));
        previews.clear_all();
        previews.clear_all();

        assert_eq!(released.lock().unwrap().as_slice(), [first.url().to_string()]);
        assert_eq!(previews.stats(Slot::Result), SlotStats { created: 2, revoked: 2 });
    }

    #[test]
    fn drop_releases_everything() {
        let count = Arc::new(Mutex::new(0));
        {
            let mut previews = PreviewRegistry::new();
            for slot in [Slot::Source, Slot::Target] {
                let h = previews.set_preview(slot, asset(0));
                let c = count.clone();
                previews.on_release(&h, move |_| *c.lock().unwrap() += 1);
            }
        }
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
