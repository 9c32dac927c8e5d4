//! # Face-swap wizard
//!
//! The staged flow behind the single and multi face-swap views: uploads,
//! optional face mapping, generation with advisory progress, the result, and
//! color editing of that result.

pub mod machine;
pub mod mapping;
pub mod progress;
pub mod stage;
pub mod upload;

pub use machine::{FaceSwapWizard, SwapResult};
pub use mapping::{FaceMapping, UNASSIGNED};
pub use progress::{Progress, ProgressTracker};
pub use stage::{Step, SwapMode, WizardStage};
pub use upload::{MultiSlot, SingleSlot, UploadTarget};
