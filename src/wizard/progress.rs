//! Advisory generation progress.
//!
//! The value never decreases while a generation runs and is always within
//! 0..=100. Observers follow it through a `watch` channel.

use tokio::sync::watch;

pub const STATUS_PREPARING: &str = "Preparing images...";
pub const STATUS_UPLOADING: &str = "Uploading images...";
pub const STATUS_SWAPPING: &str = "Swapping faces...";
pub const STATUS_BUILDING: &str = "Building result...";
pub const STATUS_PREVIEW_ONLY: &str = "Preview mode (backend unavailable)...";
pub const STATUS_DONE: &str = "Done";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub value: u8,
    pub status: String,
}

#[derive(Debug)]
pub struct ProgressTracker {
    tx: watch::Sender<Progress>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Progress::default());
        Self { tx }
    }

    /// Move forward to `value` (capped at 100). Lower values keep the current
    /// number but still update the status text.
    pub fn advance(&self, value: u8, status: &str) {
        self.tx.send_modify(|p| {
            p.value = p.value.max(value.min(100));
            p.status = status.to_string();
        });
    }

    pub fn clear(&self) {
        self.tx.send_replace(Progress::default());
    }

    pub fn current(&self) -> Progress {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let tracker = ProgressTracker::new();
        tracker.advance(30, STATUS_SWAPPING);
        tracker.advance(10, STATUS_UPLOADING);
        assert_eq!(tracker.current(), Progress { value: 30, status: STATUS_UPLOADING.to_string() });
        tracker.advance(250, STATUS_DONE);
        assert_eq!(tracker.current().value, 100);
        tracker.clear();
        assert_eq!(tracker.current(), Progress::default());
    }

    #[test]
    fn subscribers_see_updates() {
        let tracker = ProgressTracker::new();
        let rx = tracker.subscribe();
        tracker.advance(90, STATUS_BUILDING);
        assert_eq!(rx.borrow().value, 90);
    }
}
