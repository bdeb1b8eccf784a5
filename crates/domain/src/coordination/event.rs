use serde::{Deserialize, Serialize};

use super::CoordinationOutcome;
use crate::appliance::ApplianceStatus;
use crate::id::EventId;
use crate::scheduler_mode::EffectiveMode;
use crate::time::Timestamp;

/// Immutable record of one coordination decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationEvent {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub outcome: CoordinationOutcome,
    pub appliance_status: Option<ApplianceStatus>,
    pub scheduler_mode: Option<EffectiveMode>,
}

impl CoordinationEvent {
    #[must_use]
    pub fn new(timestamp: Timestamp, outcome: CoordinationOutcome) -> Self {
        Self {
            id: EventId::new(),
            timestamp,
            outcome,
            appliance_status: None,
            scheduler_mode: None,
        }
    }

    #[must_use]
    pub fn with_appliance_status(mut self, status: Option<ApplianceStatus>) -> Self {
        self.appliance_status = status;
        self
    }

    #[must_use]
    pub fn with_scheduler_mode(mut self, mode: Option<EffectiveMode>) -> Self {
        self.scheduler_mode = mode;
        self
    }
}
