use std::fmt;

/// Where the face-swap wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStage {
    Upload,
    Mapping,
    Generating,
    Result,
    Editing,
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardStage::Upload => "upload",
            WizardStage::Mapping => "mapping",
            WizardStage::Generating => "generating",
            WizardStage::Result => "result",
            WizardStage::Editing => "editing",
        })
    }
}

/// Fixed for the lifetime of a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapMode {
    Single,
    Multi,
}

impl fmt::Display for SwapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwapMode::Single => "single",
            SwapMode::Multi => "multi",
        })
    }
}

/// What a guarded action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to (or stayed in) the given stage.
    Advanced(WizardStage),
    /// Guard not satisfied; nothing happened and nothing was sent.
    Disabled,
    /// Reached `Result`, but with the target standing in for the swap.
    Degraded,
}
