//! Helpers shared by the engine cycles.

use stovepanel_domain::error::PanelError;
use stovepanel_domain::outcome::{CycleFailure, ErrorStage};

/// Tag a fallible step with the stage it belongs to.
pub(crate) trait AtStage<T> {
    fn at(self, stage: ErrorStage) -> Result<T, CycleFailure>;

    /// Storage failures are the store's fault; anything else (missing or
    /// dangling configuration) is reported by the engine itself.
    fn at_store(self) -> Result<T, CycleFailure>;
}

impl<T> AtStage<T> for Result<T, PanelError> {
    fn at(self, stage: ErrorStage) -> Result<T, CycleFailure> {
        self.map_err(|err| CycleFailure::new(stage, &err))
    }

    fn at_store(self) -> Result<T, CycleFailure> {
        self.map_err(|err| {
            let stage = if matches!(err, PanelError::Storage(_)) {
                ErrorStage::Store
            } else {
                ErrorStage::Orchestrator
            };
            CycleFailure::new(stage, &err)
        })
    }
}
