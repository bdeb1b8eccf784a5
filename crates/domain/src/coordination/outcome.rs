use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::id::RoomId;
use crate::outcome::CycleFailure;

/// Why coordination is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Someone changed a boosted room's thermostat by hand.
    ManualOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    SyncDisabled,
    Idle,
}

/// Result of one coordination cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CoordinationOutcome {
    Applied {
        rooms: Vec<RoomId>,
    },
    Restored {
        rooms: Vec<RoomId>,
    },
    Paused {
        reason: PauseReason,
        remaining_seconds: i64,
    },
    Debouncing {
        remaining_seconds: i64,
    },
    Noop {
        reason: NoopReason,
    },
    Error(CycleFailure),
}

impl CoordinationOutcome {
    #[must_use]
    pub fn paused(reason: PauseReason, remaining: Duration) -> Self {
        Self::Paused {
            reason,
            remaining_seconds: remaining.num_seconds(),
        }
    }

    #[must_use]
    pub fn debouncing(remaining: Duration) -> Self {
        Self::Debouncing {
            remaining_seconds: remaining.num_seconds(),
        }
    }

    /// Short tag used in logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Restored { .. } => "restored",
            Self::Paused { .. } => "paused",
            Self::Debouncing { .. } => "debouncing",
            Self::Noop { .. } => "noop",
            Self::Error(_) => "error",
        }
    }
}
